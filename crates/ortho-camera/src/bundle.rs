use std::path::{Path, PathBuf};

use ortho_image::ImageSize;

use crate::calibration::{Calibration, CameraModel, Parameter};
use crate::camera::{Camera, CameraPose, Photo};
use crate::error::CameraError;

fn read_to_string(path: &Path) -> Result<String, CameraError> {
    std::fs::read_to_string(path).map_err(|e| CameraError::Io(path.to_path_buf(), e))
}

fn parse_error(path: &Path, reason: impl Into<String>) -> CameraError {
    CameraError::Parse {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Read a list of image paths, one per line.
///
/// Paths that do not exist as written are looked up inside `image_dir`.
/// Blank lines are ignored.
///
/// # Errors
///
/// Returns [`CameraError::ImageNotFound`] if an image exists in neither place.
pub fn read_image_list(path: &Path, image_dir: Option<&Path>) -> Result<Vec<PathBuf>, CameraError> {
    let content = read_to_string(path)?;
    let mut images = Vec::new();
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let direct = PathBuf::from(line);
        if direct.exists() {
            images.push(direct);
            continue;
        }
        let joined = image_dir.map(|dir| dir.join(line)).unwrap_or(direct);
        if !joined.exists() {
            return Err(CameraError::ImageNotFound(joined));
        }
        images.push(joined);
    }
    Ok(images)
}

/// Read a coordinate offset file holding `x y z`.
pub fn read_offset(path: &Path) -> Result<[f64; 3], CameraError> {
    let content = read_to_string(path)?;
    let values = content
        .split_whitespace()
        .take(3)
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|e| parse_error(path, format!("invalid offset '{token}': {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    match values[..] {
        [x, y, z] => Ok([x, y, z]),
        _ => Err(parse_error(path, "the offset needs three values")),
    }
}

/// Reader for Bundler v0.3 `.out` files.
///
/// Every camera block holds `f k1 k2`, three rotation rows and a translation.
/// Photos get a "Radial" calibration whose principal point is either the one
/// configured on the reader or the image centre.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use ortho_camera::BundleReader;
/// use ortho_camera::bundle::read_image_list;
///
/// let images = read_image_list(Path::new("bundle.out.list.txt"), None).unwrap();
/// let photos = BundleReader::new()
///     .with_offset([272000.0, 4338000.0, 0.0])
///     .read(Path::new("bundle.out"), &images, |_| Ok::<_, String>([4000, 3000].into()))
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct BundleReader {
    principal_point: Option<[f64; 2]>,
    offset: [f64; 3],
}

impl BundleReader {
    /// A reader with no offset that places the principal point at the image centre.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed principal point for every camera.
    pub fn with_principal_point(mut self, principal_point: [f64; 2]) -> Self {
        self.principal_point = Some(principal_point);
        self
    }

    /// Add an offset to every projection centre.
    pub fn with_offset(mut self, offset: [f64; 3]) -> Self {
        self.offset = offset;
        self
    }

    /// Read the cameras of a bundle file.
    ///
    /// # Arguments
    ///
    /// * `path` - The bundle file.
    /// * `images` - The images, in the order of the cameras.
    /// * `image_size` - Returns the size of an image in pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed, if the number of cameras
    /// differs from the number of images, or if a rotation is not orthonormal.
    pub fn read<F, E>(
        &self,
        path: &Path,
        images: &[PathBuf],
        mut image_size: F,
    ) -> Result<Vec<Photo>, CameraError>
    where
        F: FnMut(&Path) -> Result<ImageSize, E>,
        E: std::fmt::Display,
    {
        let content = read_to_string(path)?;
        // the first line is the format signature
        let mut tokens = content.lines().skip(1).flat_map(str::split_whitespace);

        let mut next = |what: &str| -> Result<f64, CameraError> {
            let token = tokens
                .next()
                .ok_or_else(|| parse_error(path, format!("unexpected end of file reading {what}")))?;
            token
                .parse::<f64>()
                .map_err(|e| parse_error(path, format!("invalid {what} '{token}': {e}")))
        };

        let camera_count = next("camera count")? as usize;
        let _point_count = next("point count")?;
        if camera_count != images.len() {
            return Err(CameraError::CameraCountMismatch(camera_count, images.len()));
        }

        let mut photos = Vec::with_capacity(camera_count);
        for image in images {
            let focal = next("focal")?;
            let k1 = next("k1")?;
            let k2 = next("k2")?;

            let mut rotation = [[0.0; 3]; 3];
            for row in rotation.iter_mut() {
                for value in row.iter_mut() {
                    *value = next("rotation")?;
                }
            }
            let mut translation = [0.0; 3];
            for value in translation.iter_mut() {
                *value = next("translation")?;
            }

            let size = image_size(image)
                .map_err(|e| CameraError::ImageSize(image.clone(), e.to_string()))?;
            let [cx, cy] = self
                .principal_point
                .unwrap_or([size.width as f64 / 2.0, size.height as f64 / 2.0]);

            let mut calibration = Calibration::new(CameraModel::Radial2);
            calibration.set_parameter(Parameter::Focal, focal);
            calibration.set_parameter(Parameter::Cx, cx);
            calibration.set_parameter(Parameter::Cy, cy);
            calibration.set_parameter(Parameter::K1, k1);
            calibration.set_parameter(Parameter::K2, k2);

            let pose = CameraPose::from_world_to_camera(rotation, translation, self.offset)?;
            log::debug!("{}: f {focal}, centre {:?}", image.display(), pose.position());
            photos.push(Photo::new(image.clone(), Camera::new(size, calibration), pose));
        }

        Ok(photos)
    }
}
