use std::path::{Path, PathBuf};

use ortho_image::ImageSize;
use serde::{Deserialize, Serialize};

use crate::calibration::Calibration;
use crate::error::CameraError;

/// The camera that took a photo: sensor size in pixels plus its calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Make reported by the manufacturer, empty when unknown.
    pub make: String,
    /// Model reported by the manufacturer, empty when unknown.
    pub model: String,
    /// Size of the images in pixels.
    pub size: ImageSize,
    /// Intrinsic calibration.
    pub calibration: Calibration,
}

impl Camera {
    /// Create a camera of unknown make and model.
    pub fn new(size: ImageSize, calibration: Calibration) -> Self {
        Self {
            make: String::new(),
            model: String::new(),
            size,
            calibration,
        }
    }

    /// The display name of the calibration model.
    pub fn type_name(&self) -> &'static str {
        self.calibration.model().name()
    }
}

const ROTATION_TOLERANCE: f64 = 1e-2;

/// Exterior orientation of a photo.
///
/// `rotation` maps terrain axes to camera axes and `position` is the
/// projection centre in the terrain frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    position: [f64; 3],
    rotation: [[f64; 3]; 3],
}

impl CameraPose {
    /// Create a pose from the projection centre and the terrain to camera rotation.
    ///
    /// # Errors
    ///
    /// Returns [`CameraError::NonFinitePose`] if any entry is NaN or infinite
    /// and [`CameraError::InvalidRotation`] if `R * R^T` departs from the
    /// identity by more than `1e-2` in any entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use ortho_camera::CameraPose;
    ///
    /// let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    /// let pose = CameraPose::new([0.0, 0.0, 100.0], identity).unwrap();
    /// assert_eq!(pose.position(), [0.0, 0.0, 100.0]);
    /// assert!(CameraPose::new([0.0; 3], [[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]).is_err());
    /// ```
    pub fn new(position: [f64; 3], rotation: [[f64; 3]; 3]) -> Result<Self, CameraError> {
        if !position.iter().chain(rotation.iter().flatten()).all(|v| v.is_finite()) {
            return Err(CameraError::NonFinitePose);
        }
        let mut error: f64 = 0.0;
        for i in 0..3 {
            for j in 0..3 {
                let dot = (0..3).map(|k| rotation[i][k] * rotation[j][k]).sum::<f64>();
                let expected = if i == j { 1.0 } else { 0.0 };
                error = error.max((dot - expected).abs());
            }
        }
        if error > ROTATION_TOLERANCE {
            return Err(CameraError::InvalidRotation(error));
        }
        Ok(Self { position, rotation })
    }

    /// Create a pose from a world to camera transform `x_cam = R * x_world + t`.
    ///
    /// The projection centre is `-R^T t`, shifted by `offset` to undo the
    /// reduction applied to the coordinates before the adjustment.
    pub fn from_world_to_camera(
        rotation: [[f64; 3]; 3],
        translation: [f64; 3],
        offset: [f64; 3],
    ) -> Result<Self, CameraError> {
        let mut position = [0.0; 3];
        for (i, p) in position.iter_mut().enumerate() {
            *p = -(0..3).map(|k| rotation[k][i] * translation[k]).sum::<f64>() + offset[i];
        }
        Self::new(position, rotation)
    }

    /// The projection centre in the terrain frame.
    pub fn position(&self) -> [f64; 3] {
        self.position
    }

    /// The terrain to camera rotation.
    pub fn rotation(&self) -> &[[f64; 3]; 3] {
        &self.rotation
    }
}

/// An oriented photo ready to be rectified.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    path: PathBuf,
    camera: Camera,
    pose: CameraPose,
}

impl Photo {
    /// Create a photo.
    pub fn new(path: impl Into<PathBuf>, camera: Camera, pose: CameraPose) -> Self {
        Self {
            path: path.into(),
            camera,
            pose,
        }
    }

    /// The path of the image file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file stem of the image, used to name the outputs.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The camera of the photo.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The exterior orientation of the photo.
    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CameraModel;
    use approx::assert_relative_eq;

    #[test]
    fn photo_name_is_file_stem() -> Result<(), CameraError> {
        let camera = Camera::new([100, 80].into(), Calibration::new(CameraModel::Radial2));
        let pose = CameraPose::new([0.0; 3], [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])?;
        let photo = Photo::new("/data/flight/IMG_0042.JPG", camera, pose);
        assert_eq!(photo.name(), "IMG_0042");
        assert_eq!(photo.camera().type_name(), "Radial");
        Ok(())
    }

    #[test]
    fn pose_from_world_to_camera() -> Result<(), CameraError> {
        // 90 degrees about Z
        let rotation = [[0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        let pose = CameraPose::from_world_to_camera(rotation, [1.0, 2.0, 3.0], [100.0, 200.0, 0.0])?;
        let p = pose.position();
        assert_relative_eq!(p[0], 102.0);
        assert_relative_eq!(p[1], 199.0);
        assert_relative_eq!(p[2], -3.0);
        Ok(())
    }

    #[test]
    fn pose_accepts_rounded_rotation() {
        let rotation = [
            [0.998, -0.054, -0.031],
            [0.057, 0.995, 0.084],
            [0.027, -0.085, 0.996],
        ];
        assert!(CameraPose::new([220.81, 499.165, 799.064], rotation).is_ok());
    }

    #[test]
    fn pose_rejects_nan() {
        let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let rotation = [[f64::NAN, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(matches!(
            CameraPose::new([0.0; 3], rotation),
            Err(CameraError::NonFinitePose)
        ));
        assert!(matches!(
            CameraPose::new([0.0, f64::NAN, 100.0], identity),
            Err(CameraError::NonFinitePose)
        ));
        assert!(matches!(
            CameraPose::new([f64::INFINITY, 0.0, 100.0], identity),
            Err(CameraError::NonFinitePose)
        ));
        assert!(matches!(
            CameraPose::from_world_to_camera(identity, [f64::NAN, 0.0, 0.0], [0.0; 3]),
            Err(CameraError::NonFinitePose)
        ));
    }
}
