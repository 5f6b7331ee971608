use std::path::{Path, PathBuf};

use ortho_camera::Photo;
use ortho_geometry::{frames, Affine};
use ortho_image::{DynImage, ImageLayout};
use ortho_io::{
    create_raster_reader, create_raster_writer, create_vector_writer, Crs, Field, FieldType,
    FieldValue, IoError, Layer, RasterReader, RasterWriter, VectorWriter,
};

use crate::config::RectifyConfig;
use crate::diffrect::DifferentialRectification;
use crate::dtm::DtmSampler;
use crate::error::RectifyError;
use crate::footprint::{Footprint, FootprintEstimator};
use crate::grid::GridRectifier;

/// Progress of a photo through a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoState {
    /// Nothing done yet.
    Init,
    /// The terrain footprint is known.
    FootprintComputed,
    /// The ortho raster is allocated.
    OrthoAllocated,
    /// Every terrain cell was processed.
    GridProcessed,
    /// The outputs of the photo are stored.
    Written,
    /// The photo was abandoned.
    Failed,
}

impl std::fmt::Display for PhotoState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            PhotoState::Init => "init",
            PhotoState::FootprintComputed => "footprint computed",
            PhotoState::OrthoAllocated => "ortho allocated",
            PhotoState::GridProcessed => "grid processed",
            PhotoState::Written => "written",
            PhotoState::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// A photo that could not be processed.
#[derive(Debug)]
pub struct PhotoFailure {
    /// The name of the photo.
    pub name: String,
    /// The last state reached before the error.
    pub state: PhotoState,
    /// What went wrong.
    pub error: RectifyError,
}

/// Result of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Names of the photos written, in input order.
    pub written: Vec<String>,
    /// The photos that failed, in input order.
    pub failed: Vec<PhotoFailure>,
}

struct Tracker<'a> {
    name: &'a str,
    state: PhotoState,
}

impl<'a> Tracker<'a> {
    fn new(name: &'a str) -> Self {
        Self {
            name,
            state: PhotoState::Init,
        }
    }

    fn advance(&mut self, state: PhotoState) {
        log::debug!("{}: {} -> {}", self.name, self.state, state);
        self.state = state;
    }
}

/// Largest side of an ortho raster, in pixels.
pub const MAX_ORTHO_DIMENSION: usize = 1 << 16;

// pixels needed to cover `extent` at `gsd`, at least one
fn ortho_dimension(extent: f64, gsd: f64) -> Result<usize, RectifyError> {
    let n = (extent / gsd).ceil();
    if !n.is_finite() || n > MAX_ORTHO_DIMENSION as f64 {
        return Err(RectifyError::Data(format!(
            "an extent of {extent:.3} at {gsd} per pixel does not fit in \
             {MAX_ORTHO_DIMENSION} pixels"
        )));
    }
    Ok(n.max(1.0) as usize)
}

fn open_dtm(path: &Path) -> Result<Box<dyn RasterReader>, RectifyError> {
    let mut dtm =
        create_raster_reader(path).map_err(|e| RectifyError::resource(path.display(), e))?;
    dtm.open()
        .map_err(|e| RectifyError::resource(path.display(), e))?;
    log::info!(
        "terrain model {}: {} x {} samples",
        path.display(),
        dtm.cols(),
        dtm.rows()
    );
    Ok(dtm)
}

fn open_footprints(path: &Path, crs: &Crs) -> Result<Box<dyn VectorWriter>, RectifyError> {
    let mut writer =
        create_vector_writer(path).map_err(|e| RectifyError::resource(path.display(), e))?;
    writer
        .open()
        .map_err(|e| RectifyError::resource(path.display(), e))?;
    if let Err(e) = writer.create() {
        // nothing written yet, the create error is the one to report
        let _ = writer.close();
        return Err(RectifyError::resource(path.display(), e));
    }
    writer.set_crs(crs);
    Ok(writer)
}

fn footprint_layer(config: &RectifyConfig) -> Layer {
    let mut layer = Layer::new(config.layer_name.as_str());
    layer.add_field(Field::new(config.name_field.as_str(), FieldType::String));
    layer
}

/// Write the layer and release both shared datasets.
fn finish(
    mut dtm: Box<dyn RasterReader>,
    mut footprints: Box<dyn VectorWriter>,
    layer: &Layer,
) -> Result<(), RectifyError> {
    let written = footprints.write(layer);
    let closed = footprints.close();
    dtm.close();
    written?;
    closed?;
    Ok(())
}

fn write_raster(
    writer: &mut dyn RasterWriter,
    image: &DynImage,
    georeference: &Affine,
    crs: &Crs,
) -> Result<(), IoError> {
    writer.create(image.layout())?;
    writer.set_crs(crs);
    writer.set_georeference(georeference);
    writer.write(image)
}

/// Orthorectifies a batch of photos over a terrain model.
///
/// Every photo is written as `<name>.tif` in the output directory and its
/// footprint is added to a shared polygon layer. A photo that fails is
/// logged and reported while the batch goes on.
///
/// # Examples
///
/// ```no_run
/// use ortho_rectify::{Orthorectification, RectifyConfig};
///
/// let photos = Vec::new();
/// let report = Orthorectification::new("dtm.tif", RectifyConfig::default())
///     .run(&photos, "ortho", "footprints.geojson")
///     .unwrap();
/// assert!(report.failed.is_empty());
/// ```
pub struct Orthorectification {
    dtm: PathBuf,
    config: RectifyConfig,
    estimator: FootprintEstimator,
}

impl Orthorectification {
    /// Create a pipeline over the terrain model at `dtm`.
    pub fn new(dtm: impl AsRef<Path>, config: RectifyConfig) -> Self {
        let estimator = FootprintEstimator::from_config(&config);
        Self {
            dtm: dtm.as_ref().to_path_buf(),
            config,
            estimator,
        }
    }

    /// Rectify the photos.
    ///
    /// # Arguments
    ///
    /// * `photos` - The oriented photos.
    /// * `output_dir` - The directory receiving one GeoTIFF per photo.
    /// * `footprint_path` - The polygon layer receiving the footprints.
    ///
    /// # Errors
    ///
    /// Only an invalid configuration or a shared dataset (the terrain model,
    /// the output directory or the footprint layer) that cannot be used
    /// stops the batch. Photo errors are collected in the [`BatchReport`].
    pub fn run(
        &self,
        photos: &[Photo],
        output_dir: impl AsRef<Path>,
        footprint_path: impl AsRef<Path>,
    ) -> Result<BatchReport, RectifyError> {
        self.config.validate()?;
        let output_dir = output_dir.as_ref();
        let crs = self.config.crs();

        let mut dtm = open_dtm(&self.dtm)?;
        if let Err(e) = std::fs::create_dir_all(output_dir) {
            dtm.close();
            return Err(RectifyError::resource(output_dir.display(), e.into()));
        }
        let footprints = match open_footprints(footprint_path.as_ref(), &crs) {
            Ok(footprints) => footprints,
            Err(e) => {
                dtm.close();
                return Err(e);
            }
        };

        let nodata = self.config.resolve_nodata(dtm.nodata());
        log::debug!("terrain nodata marker: {nodata:?}");
        let mut layer = footprint_layer(&self.config);
        let mut report = BatchReport::default();
        {
            let mut sampler = DtmSampler::new(dtm.as_mut(), nodata);
            for photo in photos {
                let name = photo.name();
                log::info!("rectifying {name}");
                let mut tracker = Tracker::new(&name);
                let result = self
                    .rectify_photo(photo, &mut sampler, output_dir, &crs, &mut tracker)
                    .and_then(|footprint| {
                        layer.push_feature(
                            footprint.polygon(),
                            vec![FieldValue::String(name.clone())],
                        )?;
                        Ok(())
                    });
                match result {
                    Ok(()) => report.written.push(name),
                    Err(error) => {
                        let state = tracker.state;
                        log::error!("{name}: failed after state '{state}': {error}");
                        tracker.advance(PhotoState::Failed);
                        report.failed.push(PhotoFailure { name, state, error });
                    }
                }
            }
        }

        finish(dtm, footprints, &layer)?;
        log::info!(
            "{} photos rectified, {} failed",
            report.written.len(),
            report.failed.len()
        );
        Ok(report)
    }

    fn rectify_photo(
        &self,
        photo: &Photo,
        dtm: &mut DtmSampler,
        output_dir: &Path,
        crs: &Crs,
        tracker: &mut Tracker,
    ) -> Result<Footprint, RectifyError> {
        let path = photo.path();
        let mut reader =
            create_raster_reader(path).map_err(|e| RectifyError::resource(path.display(), e))?;
        reader
            .open()
            .map_err(|e| RectifyError::resource(path.display(), e))?;
        let result = self.rectify_opened(photo, reader.as_mut(), dtm, output_dir, crs, tracker);
        reader.close();
        result
    }

    fn rectify_opened(
        &self,
        photo: &Photo,
        reader: &mut dyn RasterReader,
        dtm: &mut DtmSampler,
        output_dir: &Path,
        crs: &Crs,
        tracker: &mut Tracker,
    ) -> Result<Footprint, RectifyError> {
        let layout = reader
            .layout()
            .ok_or_else(|| IoError::NotOpen(photo.path().to_path_buf()))?;

        let projector = DifferentialRectification::from_photo(photo);
        let pixel_to_photo =
            frames::pixel_to_photo(photo.camera().calibration.principal_point())?;
        let footprint = self
            .estimator
            .estimate(&projector, &pixel_to_photo, layout.size, dtm)?;
        tracker.advance(PhotoState::FootprintComputed);

        let bbox = footprint.bbox().ok_or_else(|| {
            RectifyError::Data("the footprint has non finite corners".to_string())
        })?;
        let gsd = match self.config.ground_sample_distance {
            Some(gsd) => gsd,
            None => footprint.ground_sample_distance(layout.size)?,
        };
        let cols = ortho_dimension(bbox.width(), gsd)?;
        let rows = ortho_dimension(bbox.height(), gsd)?;
        let ortho_to_terrain = frames::ortho_to_terrain(&bbox, gsd)?;
        let mut ortho = DynImage::zeros(ImageLayout {
            size: [cols, rows].into(),
            ..layout
        })?;
        log::debug!("{}: ortho {cols} x {rows} at {gsd:.4} per pixel", tracker.name);
        tracker.advance(PhotoState::OrthoAllocated);

        let source = reader.read()?;
        let window = dtm.load_window(&bbox)?.ok_or_else(|| {
            RectifyError::Data("the footprint does not overlap the terrain model".to_string())
        })?;
        let stats = GridRectifier::new(&projector, pixel_to_photo, ortho_to_terrain, &source)
            .with_nodata(dtm.nodata())
            .rectify(&window, &mut ortho)?;
        let skipped = stats.cells() - stats.rectified;
        if skipped > 0 {
            log::warn!(
                "{}: {skipped} of {} cells skipped ({} nodata, {} out of bounds, {} degenerate)",
                tracker.name,
                stats.cells(),
                stats.nodata,
                stats.out_of_bounds,
                stats.degenerate
            );
        }
        tracker.advance(PhotoState::GridProcessed);

        let path = output_dir.join(format!("{}.tif", photo.name()));
        let mut writer =
            create_raster_writer(&path).map_err(|e| RectifyError::resource(path.display(), e))?;
        writer
            .open()
            .map_err(|e| RectifyError::resource(path.display(), e))?;
        let written = write_raster(writer.as_mut(), &ortho, &ortho_to_terrain, crs);
        let closed = writer.close();
        written?;
        closed?;
        tracker.advance(PhotoState::Written);

        Ok(footprint)
    }
}

/// Computes only the footprints of a batch of photos.
///
/// The image size is taken from the camera of each photo, so the photos
/// themselves are never opened.
pub struct FootprintGenerator {
    dtm: PathBuf,
    config: RectifyConfig,
    estimator: FootprintEstimator,
}

impl FootprintGenerator {
    /// Create a generator over the terrain model at `dtm`.
    pub fn new(dtm: impl AsRef<Path>, config: RectifyConfig) -> Self {
        let estimator = FootprintEstimator::from_config(&config);
        Self {
            dtm: dtm.as_ref().to_path_buf(),
            config,
            estimator,
        }
    }

    /// Write the footprints of the photos to `footprint_path`.
    pub fn run(
        &self,
        photos: &[Photo],
        footprint_path: impl AsRef<Path>,
    ) -> Result<BatchReport, RectifyError> {
        self.config.validate()?;
        let mut dtm = open_dtm(&self.dtm)?;
        let footprints = match open_footprints(footprint_path.as_ref(), &self.config.crs()) {
            Ok(footprints) => footprints,
            Err(e) => {
                dtm.close();
                return Err(e);
            }
        };

        let nodata = self.config.resolve_nodata(dtm.nodata());
        let mut layer = footprint_layer(&self.config);
        let mut report = BatchReport::default();
        {
            let mut sampler = DtmSampler::new(dtm.as_mut(), nodata);
            for photo in photos {
                let name = photo.name();
                log::info!("footprint of {name}");
                let mut tracker = Tracker::new(&name);
                let result = self.footprint(photo, &mut sampler).and_then(|footprint| {
                    tracker.advance(PhotoState::FootprintComputed);
                    layer.push_feature(
                        footprint.polygon(),
                        vec![FieldValue::String(name.clone())],
                    )?;
                    Ok(())
                });
                match result {
                    Ok(()) => {
                        tracker.advance(PhotoState::Written);
                        report.written.push(name);
                    }
                    Err(error) => {
                        let state = tracker.state;
                        log::error!("{name}: failed after state '{state}': {error}");
                        tracker.advance(PhotoState::Failed);
                        report.failed.push(PhotoFailure { name, state, error });
                    }
                }
            }
        }

        finish(dtm, footprints, &layer)?;
        Ok(report)
    }

    fn footprint(&self, photo: &Photo, dtm: &mut DtmSampler) -> Result<Footprint, RectifyError> {
        let camera = photo.camera();
        let projector = DifferentialRectification::from_photo(photo);
        let pixel_to_photo = frames::pixel_to_photo(camera.calibration.principal_point())?;
        self.estimator
            .estimate(&projector, &pixel_to_photo, camera.size, dtm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_names() {
        assert_eq!(PhotoState::Init.to_string(), "init");
        assert_eq!(PhotoState::GridProcessed.to_string(), "grid processed");
        assert_eq!(PhotoState::Failed.to_string(), "failed");
    }

    #[test]
    fn ortho_dimension_is_bounded() {
        assert_eq!(ortho_dimension(100.0, 1.0).ok(), Some(100));
        assert_eq!(ortho_dimension(100.5, 1.0).ok(), Some(101));
        assert_eq!(ortho_dimension(0.0, 1.0).ok(), Some(1));
        assert!(matches!(
            ortho_dimension(100.0, 1e-9),
            Err(RectifyError::Data(_))
        ));
        assert!(matches!(
            ortho_dimension(f64::INFINITY, 1.0),
            Err(RectifyError::Data(_))
        ));
        assert!(matches!(
            ortho_dimension(f64::NAN, 1.0),
            Err(RectifyError::Data(_))
        ));
    }

    #[test]
    fn missing_terrain_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let dtm = dir.path().join("missing.tif");

        let result = FootprintGenerator::new(&dtm, RectifyConfig::default())
            .run(&[], dir.path().join("footprints.geojson"));
        assert!(matches!(result, Err(RectifyError::Resource { .. })));

        let result = Orthorectification::new(&dtm, RectifyConfig::default()).run(
            &[],
            dir.path().join("ortho"),
            dir.path().join("footprints.geojson"),
        );
        assert!(matches!(result, Err(RectifyError::Resource { .. })));
        Ok(())
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = RectifyConfig {
            max_iterations: 0,
            ..Default::default()
        };
        let result = FootprintGenerator::new("dtm.tif", config).run(&[], "footprints.geojson");
        assert!(matches!(result, Err(RectifyError::Config(_))));
    }
}
