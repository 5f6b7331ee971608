use crate::image::PixelFormat;

/// An error type for the image module.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    /// Error when the data length does not match the image size.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when the pixel coordinates are out of bounds.
    #[error("Pixel coordinates ({0}, {1}) are out of bounds ({2}, {3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when the channel index is out of bounds.
    #[error("Channel index ({0}) is out of bounds ({1})")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when an image has no pixel or no channel.
    #[error("Invalid image size: {0}x{1} with {2} channels")]
    InvalidImageSize(usize, usize, usize),

    /// Error when a crop window exceeds the image.
    #[error("Crop window ({0}, {1}, {2}x{3}) exceeds the image size ({4}x{5})")]
    InvalidCropWindow(usize, usize, usize, usize, usize, usize),

    /// Error when two rasters do not share the pixel format.
    #[error("Pixel format mismatch: {0} vs {1}")]
    PixelFormatMismatch(PixelFormat, PixelFormat),

    /// Error when two rasters do not share the channel count.
    #[error("Channel count mismatch: {0} vs {1}")]
    ChannelMismatch(usize, usize),
}
