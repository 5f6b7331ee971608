use std::{
    fs,
    io::{BufReader, BufWriter, Seek, Write},
    path::{Path, PathBuf},
};

use ortho_geometry::{Affine, Direction, PixelWindow};
use ortho_image::{DynImage, Image, ImageLayout, ImageSize, PixelFormat};
use tiff::{
    decoder::{Decoder, DecodingResult, Limits},
    encoder::{colortype, TiffEncoder, TiffValue},
    tags::Tag,
};

use crate::crs::Crs;
use crate::error::IoError;
use crate::raster::{RasterReader, RasterWriter};

const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

fn unsupported() -> IoError {
    IoError::TiffError(tiff::TiffError::UnsupportedError(
        tiff::TiffUnsupportedError::UnknownInterpretation,
    ))
}

fn check_extension(path: &Path) -> Result<(), IoError> {
    if path.extension().map_or(true, |ext| {
        !ext.eq_ignore_ascii_case("tiff") && !ext.eq_ignore_ascii_case("tif")
    }) {
        return Err(IoError::InvalidFileExtension(path.to_path_buf()));
    }
    Ok(())
}

fn layout_from_colortype(
    colortype: tiff::ColorType,
    size: ImageSize,
) -> Result<ImageLayout, IoError> {
    let (channels, bits) = match colortype {
        tiff::ColorType::Gray(bits) => (1, bits),
        tiff::ColorType::GrayA(bits) => (2, bits),
        tiff::ColorType::RGB(bits) => (3, bits),
        tiff::ColorType::RGBA(bits) => (4, bits),
        _ => return Err(unsupported()),
    };
    let pixel_format = match bits {
        8 => PixelFormat::U8,
        16 => PixelFormat::U16,
        32 => PixelFormat::F32,
        _ => return Err(unsupported()),
    };
    Ok(ImageLayout {
        size,
        channels,
        pixel_format,
    })
}

fn find_f64_vec<R: std::io::Read + Seek>(
    decoder: &mut Decoder<R>,
    tag: Tag,
) -> Result<Option<Vec<f64>>, IoError> {
    match decoder.find_tag(tag)? {
        Some(value) => Ok(Some(value.into_f64_vec()?)),
        None => Ok(None),
    }
}

fn read_georeference<R: std::io::Read + Seek>(
    decoder: &mut Decoder<R>,
) -> Result<Affine, IoError> {
    if let Some(m) = find_f64_vec(decoder, Tag::ModelTransformationTag)? {
        if m.len() >= 8 {
            return Ok(Affine::from_matrix([
                [m[0], m[1], m[3]],
                [m[4], m[5], m[7]],
            ])?);
        }
    }

    let scale = find_f64_vec(decoder, Tag::ModelPixelScaleTag)?;
    let tiepoint = find_f64_vec(decoder, Tag::ModelTiepointTag)?;
    match (scale, tiepoint) {
        (Some(s), Some(t)) if s.len() >= 2 && t.len() >= 6 => Ok(Affine::new(
            t[3] - t[0] * s[0],
            t[4] + t[1] * s[1],
            s[0],
            -s[1],
            0.0,
        )?),
        _ => Ok(Affine::identity()),
    }
}

fn read_nodata<R: std::io::Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<f64>, IoError> {
    let Some(value) = decoder.find_tag(Tag::GdalNodata)? else {
        return Ok(None);
    };
    let text = value.into_string()?;
    let text = text.trim_matches(char::from(0)).trim();
    match text.parse::<f64>() {
        Ok(nodata) => Ok(Some(nodata)),
        Err(_) => {
            log::warn!("ignoring unparsable nodata value '{text}'");
            Ok(None)
        }
    }
}

fn read_crs<R: std::io::Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<Crs>, IoError> {
    if decoder.find_tag(Tag::GeoKeyDirectoryTag)?.is_none() {
        return Ok(None);
    }
    let keys = decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag)?;
    // header of 4 values then entries of (key, location, count, value)
    Ok(keys
        .get(4..)
        .unwrap_or_default()
        .chunks_exact(4)
        .find(|entry| {
            (entry[0] == PROJECTED_CS_TYPE || entry[0] == GEOGRAPHIC_TYPE) && entry[1] == 0
        })
        .map(|entry| Crs::from_epsg(entry[3])))
}

struct Header {
    layout: ImageLayout,
    georeference: Affine,
    nodata: Option<f64>,
    crs: Option<Crs>,
    // strip or tile size in pixels
    chunk: [usize; 2],
    chunks_across: usize,
}

fn image_from_result(
    result: DecodingResult,
    size: ImageSize,
    channels: usize,
) -> Result<DynImage, IoError> {
    Ok(match result {
        DecodingResult::U8(data) => DynImage::U8(Image::new(size, channels, data)?),
        DecodingResult::U16(data) => DynImage::U16(Image::new(size, channels, data)?),
        DecodingResult::F32(data) => DynImage::F32(Image::new(size, channels, data)?),
        _ => return Err(unsupported()),
    })
}

/// Reads GeoTIFF rasters with their georeference, nodata marker and CRS.
///
/// Opening parses the header and keeps the file open. A windowed read only
/// decodes the strips or tiles the window touches; the last decoded one is
/// kept so neighbouring lookups do not decode it again.
pub struct GeoTiffReader {
    path: PathBuf,
    header: Option<Header>,
    decoder: Option<Decoder<BufReader<fs::File>>>,
    last_chunk: Option<(u32, DynImage)>,
    decoded_chunks: usize,
}

impl GeoTiffReader {
    /// Create a reader for the file. Nothing is read until [`RasterReader::open`].
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            header: None,
            decoder: None,
            last_chunk: None,
            decoded_chunks: 0,
        }
    }

    fn header(&self) -> Result<&Header, IoError> {
        self.header
            .as_ref()
            .ok_or_else(|| IoError::NotOpen(self.path.clone()))
    }

    fn load_chunk(&mut self, index: u32, channels: usize) -> Result<&DynImage, IoError> {
        if !matches!(&self.last_chunk, Some((cached, _)) if *cached == index) {
            let decoder = self
                .decoder
                .as_mut()
                .ok_or_else(|| IoError::NotOpen(self.path.clone()))?;
            let (width, height) = decoder.chunk_data_dimensions(index);
            let size = ImageSize {
                width: width as usize,
                height: height as usize,
            };
            let chunk = image_from_result(decoder.read_chunk(index)?, size, channels)?;
            self.decoded_chunks += 1;
            self.last_chunk = Some((index, chunk));
        }
        self.last_chunk
            .as_ref()
            .map(|(_, chunk)| chunk)
            .ok_or_else(|| IoError::NotOpen(self.path.clone()))
    }
}

impl RasterReader for GeoTiffReader {
    fn open(&mut self) -> Result<(), IoError> {
        check_extension(&self.path)?;
        if !self.path.exists() {
            return Err(IoError::FileDoesNotExist(self.path.clone()));
        }

        let file = BufReader::new(fs::File::open(&self.path)?);
        let mut decoder = Decoder::new(file)?.with_limits(Limits::unlimited());
        let (width, height) = decoder.dimensions()?;
        let size = ImageSize {
            width: width as usize,
            height: height as usize,
        };
        let layout = layout_from_colortype(decoder.colortype()?, size)?;
        // only interleaved samples
        if decoder.find_tag_unsigned::<u16>(Tag::PlanarConfiguration)? == Some(2) {
            return Err(unsupported());
        }
        let (chunk_width, chunk_height) = decoder.chunk_dimensions();
        if chunk_width == 0 || chunk_height == 0 {
            return Err(unsupported());
        }
        let chunk = [chunk_width as usize, chunk_height as usize];

        self.header = Some(Header {
            layout,
            georeference: read_georeference(&mut decoder)?,
            nodata: read_nodata(&mut decoder)?,
            crs: read_crs(&mut decoder)?,
            chunk,
            chunks_across: size.width.div_ceil(chunk[0]),
        });
        self.decoder = Some(decoder);
        self.last_chunk = None;
        self.decoded_chunks = 0;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.header.is_some()
    }

    fn close(&mut self) {
        if self.header.is_some() {
            log::debug!(
                "closing {} after decoding {} chunks",
                self.path.display(),
                self.decoded_chunks
            );
        }
        self.header = None;
        self.decoder = None;
        self.last_chunk = None;
    }

    fn layout(&self) -> Option<ImageLayout> {
        self.header.as_ref().map(|h| h.layout)
    }

    fn georeference(&self) -> Affine {
        self.header
            .as_ref()
            .map_or_else(Affine::identity, |h| h.georeference)
    }

    fn nodata(&self) -> Option<f64> {
        self.header.as_ref().and_then(|h| h.nodata)
    }

    fn crs(&self) -> Option<Crs> {
        self.header.as_ref().and_then(|h| h.crs.clone())
    }

    fn read(&mut self) -> Result<DynImage, IoError> {
        let size = self.header()?.layout.size;
        let window = PixelWindow::new(0, 0, size.width, size.height);
        self.read_window(&window)?
            .ok_or_else(|| IoError::NotOpen(self.path.clone()))
    }

    fn read_window(&mut self, window: &PixelWindow) -> Result<Option<DynImage>, IoError> {
        let header = self.header()?;
        let (layout, [chunk_width, chunk_height], across) =
            (header.layout, header.chunk, header.chunks_across);
        let Some(clamped) = window.clamp(layout.size.width, layout.size.height) else {
            return Ok(None);
        };
        let (col0, row0) = (clamped.col0 as usize, clamped.row0 as usize);
        let (col1, row1) = (clamped.col1 as usize, clamped.row1 as usize);

        let mut out = DynImage::zeros(ImageLayout {
            size: [clamped.width(), clamped.height()].into(),
            ..layout
        })?;
        for chunk_row in row0 / chunk_height..=(row1 - 1) / chunk_height {
            for chunk_col in col0 / chunk_width..=(col1 - 1) / chunk_width {
                let index = u32::try_from(chunk_row * across + chunk_col)
                    .map_err(|_| unsupported())?;
                let (x0, y0) = (chunk_col * chunk_width, chunk_row * chunk_height);
                let chunk = self.load_chunk(index, layout.channels)?;

                // overlap of the chunk and the window, in raster pixels
                let (xa, xb) = (col0.max(x0), col1.min(x0 + chunk.width()));
                let (ya, yb) = (row0.max(y0), row1.min(y0 + chunk.height()));
                if xa >= xb || ya >= yb {
                    continue;
                }
                let part = chunk.crop(xa - x0, ya - y0, xb - xa, yb - ya)?;
                out.paste(&part, xa - col0, ya - row0)?;
            }
        }
        Ok(Some(out))
    }
}

enum ModelTransform {
    ScaleTiepoint { scale: [f64; 3], tiepoint: [f64; 6] },
    Matrix([f64; 16]),
}

/// Writes GeoTIFF rasters with their georeference, nodata marker and CRS.
///
/// Supported layouts are 1, 3 or 4 channels of `u8`, `u16` or `f32`.
pub struct GeoTiffWriter {
    path: PathBuf,
    file: Option<BufWriter<fs::File>>,
    layout: Option<ImageLayout>,
    crs: Option<Crs>,
    georeference: Affine,
    nodata: Option<f64>,
}

impl GeoTiffWriter {
    /// Create a writer for the file. Nothing is written until [`RasterWriter::open`].
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: None,
            layout: None,
            crs: None,
            georeference: Affine::identity(),
            nodata: None,
        }
    }

    fn model_transform(&self) -> ModelTransform {
        let m = self.georeference.matrix(Direction::Direct);
        if self.georeference.is_axis_aligned() {
            ModelTransform::ScaleTiepoint {
                scale: [m[0][0], -m[1][1], 0.0],
                tiepoint: [0.0, 0.0, 0.0, m[0][2], m[1][2], 0.0],
            }
        } else {
            ModelTransform::Matrix([
                m[0][0], m[0][1], 0.0, m[0][2], //
                m[1][0], m[1][1], 0.0, m[1][2], //
                0.0, 0.0, 0.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ])
        }
    }

    fn geo_keys(&self) -> Vec<u16> {
        let mut entries = vec![[GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]];
        if let Some(crs) = &self.crs {
            match crs.epsg_code() {
                Some(code) if crs.is_geographic() => {
                    entries.push([GT_MODEL_TYPE, 0, 1, MODEL_TYPE_GEOGRAPHIC]);
                    entries.push([GEOGRAPHIC_TYPE, 0, 1, code]);
                }
                Some(code) => {
                    entries.push([GT_MODEL_TYPE, 0, 1, MODEL_TYPE_PROJECTED]);
                    entries.push([PROJECTED_CS_TYPE, 0, 1, code]);
                }
                None => log::warn!("CRS '{crs}' has no EPSG code, not stored"),
            }
        }
        // keys must be sorted
        entries.sort_by_key(|entry| entry[0]);

        let mut keys = vec![1, 1, 0, entries.len() as u16];
        keys.extend(entries.into_iter().flatten());
        keys
    }
}

fn encode<C, W>(
    encoder: &mut TiffEncoder<W>,
    size: ImageSize,
    data: &[C::Inner],
    transform: &ModelTransform,
    geo_keys: &[u16],
    nodata: Option<&str>,
) -> Result<(), IoError>
where
    C: colortype::ColorType,
    [C::Inner]: TiffValue,
    W: Write + Seek,
{
    let mut image = encoder.new_image::<C>(size.width as u32, size.height as u32)?;

    let directory = image.encoder();
    match transform {
        ModelTransform::ScaleTiepoint { scale, tiepoint } => {
            directory.write_tag(Tag::ModelPixelScaleTag, &scale[..])?;
            directory.write_tag(Tag::ModelTiepointTag, &tiepoint[..])?;
        }
        ModelTransform::Matrix(matrix) => {
            directory.write_tag(Tag::ModelTransformationTag, &matrix[..])?;
        }
    }
    directory.write_tag(Tag::GeoKeyDirectoryTag, geo_keys)?;
    if let Some(nodata) = nodata {
        directory.write_tag(Tag::GdalNodata, nodata)?;
    }

    image.write_data(data)?;
    Ok(())
}

impl RasterWriter for GeoTiffWriter {
    fn open(&mut self) -> Result<(), IoError> {
        check_extension(&self.path)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        self.file = Some(BufWriter::new(fs::File::create(&self.path)?));
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn create(&mut self, layout: ImageLayout) -> Result<(), IoError> {
        if !matches!(layout.channels, 1 | 3 | 4) {
            return Err(IoError::UnsupportedLayout(format!(
                "{} channels of {}",
                layout.channels, layout.pixel_format
            )));
        }
        self.layout = Some(layout);
        Ok(())
    }

    fn set_crs(&mut self, crs: &Crs) {
        self.crs = Some(crs.clone());
    }

    fn set_georeference(&mut self, georeference: &Affine) {
        self.georeference = *georeference;
    }

    fn set_nodata(&mut self, nodata: Option<f64>) {
        self.nodata = nodata;
    }

    fn write(&mut self, image: &DynImage) -> Result<(), IoError> {
        let layout = self
            .layout
            .ok_or_else(|| IoError::NotCreated(self.path.clone()))?;
        if image.layout() != layout {
            return Err(IoError::LayoutMismatch {
                expected: format!("{layout:?}"),
                actual: format!("{:?}", image.layout()),
            });
        }

        let transform = self.model_transform();
        let geo_keys = self.geo_keys();
        let nodata = self.nodata.map(|v| v.to_string());
        let nodata = nodata.as_deref();

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| IoError::NotOpen(self.path.clone()))?;
        let mut encoder = TiffEncoder::new(file)?;
        let size = layout.size;

        macro_rules! encode_as {
            ($color:ty, $img:expr) => {
                encode::<$color, _>(
                    &mut encoder,
                    size,
                    $img.as_slice(),
                    &transform,
                    &geo_keys,
                    nodata,
                )
            };
        }

        match (image, layout.channels) {
            (DynImage::U8(img), 1) => encode_as!(colortype::Gray8, img),
            (DynImage::U8(img), 3) => encode_as!(colortype::RGB8, img),
            (DynImage::U8(img), 4) => encode_as!(colortype::RGBA8, img),
            (DynImage::U16(img), 1) => encode_as!(colortype::Gray16, img),
            (DynImage::U16(img), 3) => encode_as!(colortype::RGB16, img),
            (DynImage::U16(img), 4) => encode_as!(colortype::RGBA16, img),
            (DynImage::F32(img), 1) => encode_as!(colortype::Gray32Float, img),
            (DynImage::F32(img), 3) => encode_as!(colortype::RGB32Float, img),
            (DynImage::F32(img), 4) => encode_as!(colortype::RGBA32Float, img),
            _ => Err(IoError::UnsupportedLayout(format!("{layout:?}"))),
        }
    }

    fn close(&mut self) -> Result<(), IoError> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        self.layout = None;
        Ok(())
    }
}
