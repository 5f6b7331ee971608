use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageDecoder};
use ortho_geometry::{Affine, PixelWindow};
use ortho_image::{DynImage, Image, ImageLayout, ImageSize, PixelFormat};

use crate::error::IoError;
use crate::raster::{crop_to_window, RasterReader};

fn layout_from_color(color: image::ColorType, size: ImageSize) -> Option<ImageLayout> {
    use image::ColorType;

    let (channels, pixel_format) = match color {
        ColorType::L8 => (1, PixelFormat::U8),
        ColorType::La8 => (2, PixelFormat::U8),
        ColorType::Rgb8 => (3, PixelFormat::U8),
        ColorType::Rgba8 => (4, PixelFormat::U8),
        ColorType::L16 => (1, PixelFormat::U16),
        ColorType::La16 => (2, PixelFormat::U16),
        ColorType::Rgb16 => (3, PixelFormat::U16),
        ColorType::Rgba16 => (4, PixelFormat::U16),
        ColorType::Rgb32F => (3, PixelFormat::F32),
        ColorType::Rgba32F => (4, PixelFormat::F32),
        _ => return None,
    };
    Some(ImageLayout {
        size,
        channels,
        pixel_format,
    })
}

fn to_dyn_image(image: DynamicImage, layout: ImageLayout) -> Result<DynImage, IoError> {
    let (size, channels) = (layout.size, layout.channels);
    Ok(match image {
        DynamicImage::ImageLuma8(buf) => Image::new(size, channels, buf.into_raw())?.into(),
        DynamicImage::ImageLumaA8(buf) => Image::new(size, channels, buf.into_raw())?.into(),
        DynamicImage::ImageRgb8(buf) => Image::new(size, channels, buf.into_raw())?.into(),
        DynamicImage::ImageRgba8(buf) => Image::new(size, channels, buf.into_raw())?.into(),
        DynamicImage::ImageLuma16(buf) => Image::new(size, channels, buf.into_raw())?.into(),
        DynamicImage::ImageLumaA16(buf) => Image::new(size, channels, buf.into_raw())?.into(),
        DynamicImage::ImageRgb16(buf) => Image::new(size, channels, buf.into_raw())?.into(),
        DynamicImage::ImageRgba16(buf) => Image::new(size, channels, buf.into_raw())?.into(),
        DynamicImage::ImageRgb32F(buf) => Image::new(size, channels, buf.into_raw())?.into(),
        DynamicImage::ImageRgba32F(buf) => Image::new(size, channels, buf.into_raw())?.into(),
        other => Image::new(size, 3, other.into_rgb8().into_raw())?.into(),
    })
}

/// Reads PNG and JPEG photos through the `image` crate.
///
/// These formats carry no georeference, so [`RasterReader::georeference`]
/// is the identity.
pub struct ImageCrateReader {
    path: PathBuf,
    layout: Option<ImageLayout>,
    cache: Option<DynImage>,
}

impl ImageCrateReader {
    /// Create a reader for the file. Nothing is read until [`RasterReader::open`].
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            layout: None,
            cache: None,
        }
    }

    fn decoded(&mut self) -> Result<&DynImage, IoError> {
        let layout = self
            .layout
            .ok_or_else(|| IoError::NotOpen(self.path.clone()))?;
        if self.cache.is_none() {
            let image = image::ImageReader::open(&self.path)?
                .with_guessed_format()?
                .decode()?;
            self.cache = Some(to_dyn_image(image, layout)?);
        }
        self.cache
            .as_ref()
            .ok_or_else(|| IoError::NotOpen(self.path.clone()))
    }
}

impl RasterReader for ImageCrateReader {
    fn open(&mut self) -> Result<(), IoError> {
        if !self.path.exists() {
            return Err(IoError::FileDoesNotExist(self.path.clone()));
        }
        let decoder = image::ImageReader::open(&self.path)?
            .with_guessed_format()?
            .into_decoder()?;
        let (width, height) = decoder.dimensions();
        let size = ImageSize {
            width: width as usize,
            height: height as usize,
        };
        // unusual color types are expanded to RGB8 on decode
        let layout = layout_from_color(decoder.color_type(), size).unwrap_or(ImageLayout {
            size,
            channels: 3,
            pixel_format: PixelFormat::U8,
        });
        self.layout = Some(layout);
        self.cache = None;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.layout.is_some()
    }

    fn close(&mut self) {
        self.layout = None;
        self.cache = None;
    }

    fn layout(&self) -> Option<ImageLayout> {
        self.layout
    }

    fn georeference(&self) -> Affine {
        Affine::identity()
    }

    fn read(&mut self) -> Result<DynImage, IoError> {
        Ok(self.decoded()?.clone())
    }

    fn read_window(&mut self, window: &PixelWindow) -> Result<Option<DynImage>, IoError> {
        crop_to_window(self.decoded()?, window)
    }
}
