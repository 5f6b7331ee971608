use crate::error::ImageError;
use crate::image::{Image, ImageLayout, ImageSize, PixelFormat};

/// A raster whose sample type is only known at runtime.
///
/// Readers produce whichever variant the file holds and the rectifier keeps
/// the output in the same variant as the source.
#[derive(Clone, Debug, PartialEq)]
pub enum DynImage {
    /// Unsigned 8 bit samples.
    U8(Image<u8>),
    /// Unsigned 16 bit samples.
    U16(Image<u16>),
    /// 32 bit float samples.
    F32(Image<f32>),
}

macro_rules! dispatch {
    ($self:expr, $img:ident => $body:expr) => {
        match $self {
            DynImage::U8($img) => $body,
            DynImage::U16($img) => $body,
            DynImage::F32($img) => $body,
        }
    };
}

impl DynImage {
    /// Allocate a zero-filled raster.
    ///
    /// # Examples
    ///
    /// ```
    /// use ortho_image::{DynImage, ImageLayout, ImageSize, PixelFormat};
    ///
    /// let layout = ImageLayout {
    ///     size: ImageSize { width: 4, height: 2 },
    ///     channels: 3,
    ///     pixel_format: PixelFormat::U16,
    /// };
    /// let image = DynImage::zeros(layout).unwrap();
    /// assert_eq!(image.layout(), layout);
    /// ```
    pub fn zeros(layout: ImageLayout) -> Result<Self, ImageError> {
        let (size, channels) = (layout.size, layout.channels);
        Ok(match layout.pixel_format {
            PixelFormat::U8 => DynImage::U8(Image::from_size_val(size, channels, 0)?),
            PixelFormat::U16 => DynImage::U16(Image::from_size_val(size, channels, 0)?),
            PixelFormat::F32 => DynImage::F32(Image::from_size_val(size, channels, 0.0)?),
        })
    }

    /// The layout of the raster.
    pub fn layout(&self) -> ImageLayout {
        dispatch!(self, img => img.layout())
    }

    /// The size of the raster in pixels.
    pub fn size(&self) -> ImageSize {
        dispatch!(self, img => img.size())
    }

    /// The width of the raster in pixels.
    pub fn width(&self) -> usize {
        self.size().width
    }

    /// The height of the raster in pixels.
    pub fn height(&self) -> usize {
        self.size().height
    }

    /// The number of channels per pixel.
    pub fn num_channels(&self) -> usize {
        dispatch!(self, img => img.num_channels())
    }

    /// The sample type.
    pub fn pixel_format(&self) -> PixelFormat {
        match self {
            DynImage::U8(_) => PixelFormat::U8,
            DynImage::U16(_) => PixelFormat::U16,
            DynImage::F32(_) => PixelFormat::F32,
        }
    }

    /// Read one sample widened to f64.
    pub fn sample(&self, x: usize, y: usize, ch: usize) -> Result<f64, ImageError> {
        use crate::image::PixelType;
        dispatch!(self, img => img.get_pixel(x, y, ch).map(PixelType::to_f64))
    }

    /// Copy a rectangular region into a new raster of the same type.
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> Result<Self, ImageError> {
        Ok(match self {
            DynImage::U8(img) => DynImage::U8(img.crop(x, y, width, height)?),
            DynImage::U16(img) => DynImage::U16(img.crop(x, y, width, height)?),
            DynImage::F32(img) => DynImage::F32(img.crop(x, y, width, height)?),
        })
    }

    /// Copy `src` into this raster with its top-left pixel at `(x, y)`.
    pub fn paste(&mut self, src: &DynImage, x: usize, y: usize) -> Result<(), ImageError> {
        match (self, src) {
            (DynImage::U8(a), DynImage::U8(b)) => a.paste(b, x, y),
            (DynImage::U16(a), DynImage::U16(b)) => a.paste(b, x, y),
            (DynImage::F32(a), DynImage::F32(b)) => a.paste(b, x, y),
            (a, b) => Err(ImageError::PixelFormatMismatch(
                a.pixel_format(),
                b.pixel_format(),
            )),
        }
    }

    /// Overwrite pixel `dst` of this raster with pixel `src` of `other`.
    ///
    /// # Errors
    ///
    /// Both rasters must share the pixel format and channel count, and both
    /// coordinates must lie inside their raster.
    pub fn copy_pixel_from(
        &mut self,
        other: &DynImage,
        src: (usize, usize),
        dst: (usize, usize),
    ) -> Result<(), ImageError> {
        if self.num_channels() != other.num_channels() {
            return Err(ImageError::ChannelMismatch(
                self.num_channels(),
                other.num_channels(),
            ));
        }
        match (self, other) {
            (DynImage::U8(a), DynImage::U8(b)) => copy_pixel(b, src, a, dst),
            (DynImage::U16(a), DynImage::U16(b)) => copy_pixel(b, src, a, dst),
            (DynImage::F32(a), DynImage::F32(b)) => copy_pixel(b, src, a, dst),
            (a, b) => Err(ImageError::PixelFormatMismatch(
                a.pixel_format(),
                b.pixel_format(),
            )),
        }
    }
}

fn copy_pixel<T: crate::image::PixelType>(
    src: &Image<T>,
    src_xy: (usize, usize),
    dst: &mut Image<T>,
    dst_xy: (usize, usize),
) -> Result<(), ImageError> {
    let values = src.pixel(src_xy.0, src_xy.1)?;
    dst.pixel_mut(dst_xy.0, dst_xy.1)?.copy_from_slice(values);
    Ok(())
}

impl From<Image<u8>> for DynImage {
    fn from(image: Image<u8>) -> Self {
        DynImage::U8(image)
    }
}

impl From<Image<u16>> for DynImage {
    fn from(image: Image<u16>) -> Self {
        DynImage::U16(image)
    }
}

impl From<Image<f32>> for DynImage {
    fn from(image: Image<f32>) -> Self {
        DynImage::F32(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_between_rasters() -> Result<(), ImageError> {
        let src: DynImage = Image::<u8>::new([2, 1].into(), 3, vec![1, 2, 3, 4, 5, 6])?.into();
        let mut dst = DynImage::zeros(src.layout())?;
        dst.copy_pixel_from(&src, (1, 0), (0, 0))?;
        assert_eq!(dst.sample(0, 0, 0)?, 4.0);
        assert_eq!(dst.sample(0, 0, 2)?, 6.0);
        assert_eq!(dst.sample(1, 0, 0)?, 0.0);
        Ok(())
    }

    #[test]
    fn copy_rejects_mismatched_rasters() -> Result<(), ImageError> {
        let src: DynImage = Image::<f32>::from_size_val([2, 2].into(), 1, 1.0)?.into();
        let mut dst: DynImage = Image::<u8>::from_size_val([2, 2].into(), 1, 0)?.into();
        assert_eq!(
            dst.copy_pixel_from(&src, (0, 0), (0, 0)),
            Err(ImageError::PixelFormatMismatch(PixelFormat::U8, PixelFormat::F32))
        );

        let mut rgb: DynImage = Image::<f32>::from_size_val([2, 2].into(), 3, 0.0)?.into();
        assert!(rgb.copy_pixel_from(&src, (0, 0), (0, 0)).is_err());
        Ok(())
    }

    #[test]
    fn crop_keeps_variant() -> Result<(), ImageError> {
        let image: DynImage = Image::<u16>::from_size_val([5, 5].into(), 1, 9)?.into();
        let crop = image.crop(1, 2, 3, 3)?;
        assert_eq!(crop.pixel_format(), PixelFormat::U16);
        assert_eq!(crop.size(), [3, 3].into());
        Ok(())
    }
}
