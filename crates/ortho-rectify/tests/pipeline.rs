use std::path::Path;

use approx::assert_relative_eq;
use ortho_camera::{Calibration, Camera, CameraPose, Photo};
use ortho_geometry::Affine;
use ortho_image::{DynImage, Image};
use ortho_io::{create_raster_reader, create_raster_writer, geojson, Crs, FieldValue};
use ortho_rectify::{
    select_photos, FootprintGenerator, Orthorectification, PhotoState, RectifyConfig, RectifyError,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const IDENTITY: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

// 200 x 200 m of terrain at 5 m, 10 m samples, south-west corner at (400, 400)
fn write_dtm(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let dtm: DynImage = Image::<f32>::from_size_val([20, 20].into(), 1, 5.0)?.into();
    let mut writer = create_raster_writer(path)?;
    writer.open()?;
    writer.create(dtm.layout())?;
    writer.set_crs(&Crs::from_epsg(25830));
    writer.set_georeference(&Affine::new(400.0, 600.0, 10.0, -10.0, 0.0)?);
    writer.set_nodata(Some(-9999.0));
    writer.write(&dtm)?;
    writer.close()?;
    Ok(())
}

fn write_photo(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let image = image::RgbImage::from_fn(100, 100, |x, y| image::Rgb([2 * x as u8, 2 * y as u8, 7]));
    image.save(path)?;
    Ok(())
}

// 100 x 100 pixels, f = 100 px, looking straight down from 100 m above the terrain
fn photo(path: &Path, x: f64, y: f64) -> Result<Photo, RectifyError> {
    let calibration = Calibration::SimplePinhole {
        f: 100.0,
        cx: 50.0,
        cy: 50.0,
    };
    let camera = Camera::new([100, 100].into(), calibration);
    let pose = CameraPose::new([x, y, 105.0], IDENTITY)?;
    Ok(Photo::new(path, camera, pose))
}

#[test]
fn orthorectify_batch() -> TestResult {
    let dir = tempfile::tempdir()?;
    let dtm = dir.path().join("dtm.tif");
    write_dtm(&dtm)?;
    let image = dir.path().join("IMG_0001.png");
    write_photo(&image)?;

    let photos = [
        photo(&image, 500.0, 500.0)?,
        photo(&dir.path().join("IMG_0002.png"), 500.0, 500.0)?,
        photo(&image, 5000.0, 500.0)?,
    ];

    let ortho_dir = dir.path().join("ortho");
    let footprints = dir.path().join("footprints.geojson");
    let pipeline = Orthorectification::new(&dtm, RectifyConfig::default());
    let report = pipeline.run(&photos, &ortho_dir, &footprints)?;

    assert_eq!(report.written, ["IMG_0001"]);
    assert_eq!(report.failed.len(), 2);
    assert_eq!(report.failed[0].name, "IMG_0002");
    assert_eq!(report.failed[0].state, PhotoState::Init);
    assert!(matches!(report.failed[0].error, RectifyError::Resource { .. }));
    assert_eq!(report.failed[1].state, PhotoState::Init);
    assert!(matches!(report.failed[1].error, RectifyError::Data(_)));

    let mut ortho = create_raster_reader(ortho_dir.join("IMG_0001.tif"))?;
    ortho.open()?;
    assert!(matches!(ortho.cols(), 100 | 101));
    assert_eq!(ortho.channels(), 3);
    assert_eq!(ortho.crs().and_then(|c| c.epsg_code()), Some(25830));
    let georef = ortho.georeference();
    assert_relative_eq!(georef.tx(), 450.0, epsilon = 1e-6);
    assert_relative_eq!(georef.ty(), 550.0, epsilon = 1e-6);
    assert_relative_eq!(georef.scale_x(), 1.0, epsilon = 1e-6);
    let pixels = ortho.read()?;
    assert_eq!(pixels.sample(50, 50, 0)?, 100.0);
    assert_eq!(pixels.sample(50, 50, 1)?, 100.0);
    assert_eq!(pixels.sample(50, 50, 2)?, 7.0);
    ortho.close();

    let (layer, crs) = geojson::read_layer(&footprints)?;
    assert_eq!(crs.and_then(|c| c.epsg_code()), Some(25830));
    assert_eq!(layer.features().len(), 1);
    let feature = &layer.features()[0];
    assert_eq!(feature.attributes, [FieldValue::String("IMG_0001".into())]);
    let expected = [[450.0, 550.0], [550.0, 550.0], [550.0, 450.0], [450.0, 450.0]];
    for (p, e) in feature.polygon.iter().zip(expected) {
        assert_relative_eq!(p[0], e[0], epsilon = 1e-6);
        assert_relative_eq!(p[1], e[1], epsilon = 1e-6);
    }

    let selected = select_photos(&footprints, "name", [520.0, 480.0], Some(3))?;
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].name, "IMG_0001");
    Ok(())
}

#[test]
fn oversized_ortho_fails_the_photo() -> TestResult {
    let dir = tempfile::tempdir()?;
    let dtm = dir.path().join("dtm.tif");
    write_dtm(&dtm)?;
    let image = dir.path().join("IMG_0001.png");
    write_photo(&image)?;
    let photos = [photo(&image, 500.0, 500.0)?, photo(&image, 480.0, 500.0)?];

    let config = RectifyConfig {
        ground_sample_distance: Some(1e-9),
        ..Default::default()
    };
    let ortho_dir = dir.path().join("ortho");
    let report = Orthorectification::new(&dtm, config).run(
        &photos,
        &ortho_dir,
        dir.path().join("footprints.geojson"),
    )?;

    assert!(report.written.is_empty());
    assert_eq!(report.failed.len(), 2);
    for failure in &report.failed {
        assert_eq!(failure.state, PhotoState::FootprintComputed);
        assert!(matches!(failure.error, RectifyError::Data(_)));
    }
    assert!(!ortho_dir.join("IMG_0001.tif").exists());
    Ok(())
}

#[test]
fn rerun_is_byte_identical() -> TestResult {
    let dir = tempfile::tempdir()?;
    let dtm = dir.path().join("dtm.tif");
    write_dtm(&dtm)?;
    let image = dir.path().join("IMG_0001.png");
    write_photo(&image)?;
    let photos = [photo(&image, 495.0, 503.0)?];

    let pipeline = Orthorectification::new(&dtm, RectifyConfig::default());
    for run in ["a", "b"] {
        let out = dir.path().join(run);
        pipeline.run(&photos, &out, out.join("footprints.geojson"))?;
    }

    for file in ["IMG_0001.tif", "footprints.geojson"] {
        let a = std::fs::read(dir.path().join("a").join(file))?;
        let b = std::fs::read(dir.path().join("b").join(file))?;
        assert_eq!(a, b, "{file} differs between runs");
    }
    Ok(())
}

#[test]
fn footprints_only() -> TestResult {
    let dir = tempfile::tempdir()?;
    let dtm = dir.path().join("dtm.tif");
    write_dtm(&dtm)?;

    // the photos are never opened
    let photos = [
        photo(&dir.path().join("IMG_0001.png"), 480.0, 500.0)?,
        photo(&dir.path().join("IMG_0002.png"), 5000.0, 500.0)?,
        photo(&dir.path().join("IMG_0003.png"), 520.0, 500.0)?,
    ];
    let footprints = dir.path().join("footprints.geojson");
    let config = RectifyConfig {
        name_field: "photo".to_string(),
        ..Default::default()
    };
    let report = FootprintGenerator::new(&dtm, config).run(&photos, &footprints)?;
    assert_eq!(report.written, ["IMG_0001", "IMG_0003"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "IMG_0002");

    let (layer, _) = geojson::read_layer(&footprints)?;
    assert_eq!(layer.name(), "footprint");
    assert_eq!(layer.features().len(), 2);

    // both footprints see the point, the second one closer to its centre
    let selected = select_photos(&footprints, "photo", [515.0, 500.0], None)?;
    let names = selected.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["IMG_0003", "IMG_0001"]);
    Ok(())
}

#[test]
fn unwritable_footprints_are_fatal() -> TestResult {
    let dir = tempfile::tempdir()?;
    let dtm = dir.path().join("dtm.tif");
    write_dtm(&dtm)?;

    let result = FootprintGenerator::new(&dtm, RectifyConfig::default())
        .run(&[], dir.path().join("footprints.shp"));
    assert!(matches!(result, Err(RectifyError::Resource { .. })));
    Ok(())
}
