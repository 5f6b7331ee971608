use std::path::Path;

use ortho_geometry::{Affine, PixelWindow};
use ortho_image::{DynImage, ImageLayout, ImageSize, PixelFormat};

use crate::crs::Crs;
use crate::error::IoError;
use crate::geotiff::{GeoTiffReader, GeoTiffWriter};
use crate::image_reader::ImageCrateReader;

/// A raster dataset opened for reading.
///
/// Metadata is available once [`RasterReader::open`] succeeds; the size
/// accessors return zero and [`RasterReader::layout`] returns `None` before.
pub trait RasterReader {
    /// Open the dataset and read its metadata.
    fn open(&mut self) -> Result<(), IoError>;

    /// Whether the dataset is open.
    fn is_open(&self) -> bool;

    /// Release the dataset. Closing twice is a no-op.
    fn close(&mut self);

    /// The layout of the raster.
    fn layout(&self) -> Option<ImageLayout>;

    /// The number of rows.
    fn rows(&self) -> usize {
        self.layout().map_or(0, |l| l.size.height)
    }

    /// The number of columns.
    fn cols(&self) -> usize {
        self.layout().map_or(0, |l| l.size.width)
    }

    /// The number of channels.
    fn channels(&self) -> usize {
        self.layout().map_or(0, |l| l.channels)
    }

    /// The sample type.
    fn pixel_format(&self) -> Option<PixelFormat> {
        self.layout().map(|l| l.pixel_format)
    }

    /// The pixel to terrain map; identity for rasters without georeference.
    fn georeference(&self) -> Affine;

    /// The out-of-band marker of missing samples, if the file carries one.
    fn nodata(&self) -> Option<f64> {
        None
    }

    /// The coordinate reference system, if the file carries one.
    fn crs(&self) -> Option<Crs> {
        None
    }

    /// Read the full raster.
    fn read(&mut self) -> Result<DynImage, IoError>;

    /// Read the part of `window` that lies inside the raster.
    ///
    /// The returned raster covers `window.clamp(cols, rows)`; `None` is
    /// returned when the window is fully outside.
    fn read_window(&mut self, window: &PixelWindow) -> Result<Option<DynImage>, IoError> {
        if window.clamp(self.cols(), self.rows()).is_none() {
            return Ok(None);
        }
        let image = self.read()?;
        crop_to_window(&image, window)
    }
}

pub(crate) fn crop_to_window(
    image: &DynImage,
    window: &PixelWindow,
) -> Result<Option<DynImage>, IoError> {
    let Some(clamped) = window.clamp(image.width(), image.height()) else {
        return Ok(None);
    };
    Ok(Some(image.crop(
        clamped.col0 as usize,
        clamped.row0 as usize,
        clamped.width(),
        clamped.height(),
    )?))
}

/// A raster dataset opened for writing.
///
/// The call order is `open`, `create`, the setters, `write` and `close`.
pub trait RasterWriter {
    /// Open the destination file.
    fn open(&mut self) -> Result<(), IoError>;

    /// Whether the destination is open.
    fn is_open(&self) -> bool;

    /// Declare the layout of the raster to be written.
    fn create(&mut self, layout: ImageLayout) -> Result<(), IoError>;

    /// Set the coordinate reference system stored with the raster.
    fn set_crs(&mut self, crs: &Crs);

    /// Set the pixel to terrain map stored with the raster.
    fn set_georeference(&mut self, georeference: &Affine);

    /// Set the marker of missing samples stored with the raster.
    fn set_nodata(&mut self, nodata: Option<f64>);

    /// Write the raster; its layout must match the created one.
    fn write(&mut self, image: &DynImage) -> Result<(), IoError>;

    /// Flush and release the destination. Closing twice is a no-op.
    fn close(&mut self) -> Result<(), IoError>;
}

pub(crate) fn extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Create a raster reader for the file, chosen by its extension.
///
/// `tif` and `tiff` are read as GeoTIFF, `png`, `jpg` and `jpeg` through the
/// `image` crate.
///
/// # Examples
///
/// ```
/// use ortho_io::create_raster_reader;
///
/// assert!(create_raster_reader("dtm.tif").is_ok());
/// assert!(create_raster_reader("photo.JPG").is_ok());
/// assert!(create_raster_reader("cloud.las").is_err());
/// ```
pub fn create_raster_reader(path: impl AsRef<Path>) -> Result<Box<dyn RasterReader>, IoError> {
    let path = path.as_ref();
    match extension(path).as_str() {
        "tif" | "tiff" => Ok(Box::new(GeoTiffReader::new(path))),
        "png" | "jpg" | "jpeg" => Ok(Box::new(ImageCrateReader::new(path))),
        _ => Err(IoError::InvalidFileExtension(path.to_path_buf())),
    }
}

/// Create a raster writer for the file, chosen by its extension.
///
/// Only GeoTIFF (`tif`, `tiff`) can carry a georeference and is supported.
pub fn create_raster_writer(path: impl AsRef<Path>) -> Result<Box<dyn RasterWriter>, IoError> {
    let path = path.as_ref();
    match extension(path).as_str() {
        "tif" | "tiff" => Ok(Box::new(GeoTiffWriter::new(path))),
        _ => Err(IoError::InvalidFileExtension(path.to_path_buf())),
    }
}

/// The size of a raster file, read from its header.
pub fn raster_size(path: impl AsRef<Path>) -> Result<ImageSize, IoError> {
    let path = path.as_ref();
    let mut reader = create_raster_reader(path)?;
    reader.open()?;
    let layout = reader.layout();
    reader.close();
    layout
        .map(|l| l.size)
        .ok_or_else(|| IoError::NotOpen(path.to_path_buf()))
}
