#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Type-erased rasters.
pub mod dyn_image;

/// Error types for the image module.
pub mod error;

/// Image representation with a runtime number of channels.
pub mod image;

pub use crate::dyn_image::DynImage;
pub use crate::error::ImageError;
pub use crate::image::{Image, ImageLayout, ImageSize, PixelFormat, PixelType};
