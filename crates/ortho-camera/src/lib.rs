#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Readers for Bundler v0.3 orientation files.
pub mod bundle;

/// Intrinsic calibration models.
pub mod calibration;

/// Camera description and exterior orientation.
pub mod camera;

/// Error types for the camera module.
pub mod error;

pub use crate::bundle::BundleReader;
pub use crate::calibration::{Calibration, CameraModel, Parameter};
pub use crate::camera::{Camera, CameraPose, Photo};
pub use crate::error::CameraError;
