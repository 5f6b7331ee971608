#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Frames
//!
//! Rectification moves points between four planar frames:
//!
//! - **pixel**: column/row of the source photo, origin at the top-left corner.
//! - **photo**: centred at the principal point with the Y axis pointing up.
//! - **terrain**: the projected coordinate system of the terrain model.
//! - **ortho**: column/row of the output raster.
//!
//! Every map between two frames is an [`Affine`] and the caller always states
//! the [`Direction`] in which it is applied.
//!
//! ```rust
//! use ortho_geometry::{frames, Direction};
//!
//! let pixel_to_photo = frames::pixel_to_photo([50.0, 40.0]).unwrap();
//! let photo = pixel_to_photo.transform([0.0, 0.0], Direction::Direct);
//! assert_eq!(photo, [-50.0, 40.0]);
//! ```

/// Affine transforms between planar frames.
pub mod affine;

/// Error types for the geometry module.
pub mod error;

/// Constructors for the frames used during rectification.
pub mod frames;

/// Four point projective transforms.
pub mod homography;

/// Polygon predicates.
pub mod polygon;

/// Axis aligned terrain and pixel windows.
pub mod window;

pub use crate::affine::{affine_4pt2d, Affine, Direction};
pub use crate::error::GeometryError;
pub use crate::homography::{homography_4pt2d, project_point, Homography};
pub use crate::window::{PixelWindow, Window};
