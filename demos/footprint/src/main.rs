use argh::FromArgs;
use std::path::{Path, PathBuf};

use ortho::camera::{bundle, BundleReader};
use ortho::io::raster_size;
use ortho::rectify::{select_photos, FootprintGenerator, RectifyConfig};

fn parse_point(value: &str) -> Result<[f64; 2], String> {
    let coords = value
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    match coords.as_slice() {
        [x, y] => Ok([*x, *y]),
        _ => Err(format!("expected X,Y, got '{value}'")),
    }
}

#[derive(FromArgs)]
/// Compute the terrain footprints of the photos of a Bundler reconstruction
struct Args {
    /// path to the Bundler v0.3 file
    #[argh(option)]
    bundle_file: PathBuf,

    /// path to the list of images, one per camera
    #[argh(option)]
    image_list: PathBuf,

    /// directory searched for images not found as listed
    #[argh(option)]
    image_path: Option<PathBuf>,

    /// path to the terrain model
    #[argh(option)]
    dtm: PathBuf,

    /// path to the footprint layer to write
    #[argh(option)]
    footprint_file: PathBuf,

    /// path to a file holding the `x y z` offset of the reconstruction
    #[argh(option)]
    offset_file: Option<PathBuf>,

    /// CRS of the outputs, e.g. EPSG:25830
    #[argh(option)]
    crs: Option<String>,

    /// principal point X in pixels, the image centre by default
    #[argh(option)]
    cx: Option<f64>,

    /// principal point Y in pixels, the image centre by default
    #[argh(option)]
    cy: Option<f64>,

    /// path to a JSON configuration file
    #[argh(option)]
    config: Option<PathBuf>,

    /// list the photos seeing this terrain point, given as X,Y
    #[argh(option, from_str_fn(parse_point))]
    point: Option<[f64; 2]>,

    /// maximum number of photos listed for --point
    #[argh(option)]
    best: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut config = match &args.config {
        Some(path) => RectifyConfig::from_json_file(path)?,
        None => RectifyConfig::default(),
    };
    if let Some(crs) = args.crs {
        config.crs = crs;
    }
    let name_field = config.name_field.clone();

    let images = bundle::read_image_list(&args.image_list, args.image_path.as_deref())?;
    let mut reader = BundleReader::new();
    if let Some(path) = &args.offset_file {
        reader = reader.with_offset(bundle::read_offset(path)?);
    }
    match (args.cx, args.cy) {
        (Some(cx), Some(cy)) => reader = reader.with_principal_point([cx, cy]),
        (None, None) => {}
        _ => return Err("--cx and --cy must be given together".into()),
    }
    let photos = reader.read(&args.bundle_file, &images, |path: &Path| raster_size(path))?;
    log::info!("{} photos read from {}", photos.len(), args.bundle_file.display());

    let report = FootprintGenerator::new(&args.dtm, config).run(&photos, &args.footprint_file)?;
    println!(
        "{} footprints written to {}",
        report.written.len(),
        args.footprint_file.display()
    );
    for failure in &report.failed {
        println!("{}: {}", failure.name, failure.error);
    }

    if let Some(point) = args.point {
        let candidates = select_photos(&args.footprint_file, &name_field, point, args.best)?;
        println!("{} photos see ({}, {})", candidates.len(), point[0], point[1]);
        for candidate in candidates {
            println!("{}\t{:.3}", candidate.name, candidate.distance);
        }
    }

    Ok(())
}
