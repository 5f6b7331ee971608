use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use ortho_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// The sample type of a raster, known at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Unsigned 8 bit samples.
    U8,
    /// Unsigned 16 bit samples.
    U16,
    /// 32 bit float samples.
    F32,
}

impl PixelFormat {
    /// Size of one sample in bytes.
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            PixelFormat::U8 => 1,
            PixelFormat::U16 => 2,
            PixelFormat::F32 => 4,
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            PixelFormat::U8 => "u8",
            PixelFormat::U16 => "u16",
            PixelFormat::F32 => "f32",
        };
        write!(f, "{name}")
    }
}

/// Size, channel count and sample type of a raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageLayout {
    /// Size of the raster in pixels.
    pub size: ImageSize,
    /// Number of channels per pixel.
    pub channels: usize,
    /// Sample type.
    pub pixel_format: PixelFormat,
}

/// Trait for the sample types a raster can hold.
pub trait PixelType: Copy + Default + PartialEq + Send + Sync + 'static {
    /// The runtime tag of the sample type.
    const FORMAT: PixelFormat;

    /// Widen the sample to f64.
    fn to_f64(self) -> f64;
}

impl PixelType for u8 {
    const FORMAT: PixelFormat = PixelFormat::U8;

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl PixelType for u16 {
    const FORMAT: PixelFormat = PixelFormat::U16;

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl PixelType for f32 {
    const FORMAT: PixelFormat = PixelFormat::F32;

    fn to_f64(self) -> f64 {
        self as f64
    }
}

/// Represents an image with pixel data.
///
/// The samples are stored row-major and interleaved, `(H, W, C)`. The number
/// of channels is only known at runtime since rasters come from files.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T: PixelType> {
    size: ImageSize,
    channels: usize,
    data: Vec<T>,
}

impl<T: PixelType> Image<T> {
    /// Create a new image from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `channels` - The number of channels per pixel.
    /// * `data` - The pixel data of the image.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use ortho_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8>::new(
    ///     ImageSize { width: 10, height: 20 },
    ///     3,
    ///     vec![0u8; 10 * 20 * 3],
    /// ).unwrap();
    ///
    /// assert_eq!(image.width(), 10);
    /// assert_eq!(image.height(), 20);
    /// assert_eq!(image.num_channels(), 3);
    /// ```
    pub fn new(size: ImageSize, channels: usize, data: Vec<T>) -> Result<Self, ImageError> {
        let expected = Self::num_samples(size, channels)?;
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }
        Ok(Self {
            size,
            channels,
            data,
        })
    }

    /// Create a new image with every sample set to `val`.
    pub fn from_size_val(size: ImageSize, channels: usize, val: T) -> Result<Self, ImageError> {
        let len = Self::num_samples(size, channels)?;
        Self::new(size, channels, vec![val; len])
    }

    // number of samples, bounded by what a single allocation can hold
    fn num_samples(size: ImageSize, channels: usize) -> Result<usize, ImageError> {
        let invalid = ImageError::InvalidImageSize(size.width, size.height, channels);
        if size.width == 0 || size.height == 0 || channels == 0 {
            return Err(invalid);
        }
        let len = size
            .width
            .checked_mul(size.height)
            .and_then(|n| n.checked_mul(channels))
            .ok_or_else(|| invalid.clone())?;
        match len.checked_mul(std::mem::size_of::<T>()) {
            Some(bytes) if bytes <= isize::MAX as usize => Ok(len),
            _ => Err(invalid),
        }
    }

    /// The size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// The height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// The number of channels per pixel.
    pub fn num_channels(&self) -> usize {
        self.channels
    }

    /// The layout of the image.
    pub fn layout(&self) -> ImageLayout {
        ImageLayout {
            size: self.size,
            channels: self.channels,
            pixel_format: T::FORMAT,
        }
    }

    /// The interleaved samples.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The interleaved samples, mutable.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the image and return its samples.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    fn offset(&self, x: usize, y: usize) -> Result<usize, ImageError> {
        if x >= self.size.width || y >= self.size.height {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.size.width,
                self.size.height,
            ));
        }
        Ok((y * self.size.width + x) * self.channels)
    }

    /// The samples of pixel `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Result<&[T], ImageError> {
        let offset = self.offset(x, y)?;
        Ok(&self.data[offset..offset + self.channels])
    }

    /// The samples of pixel `(x, y)`, mutable.
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> Result<&mut [T], ImageError> {
        let offset = self.offset(x, y)?;
        let channels = self.channels;
        Ok(&mut self.data[offset..offset + channels])
    }

    /// Get one sample of pixel `(x, y)`.
    pub fn get_pixel(&self, x: usize, y: usize, ch: usize) -> Result<T, ImageError> {
        if ch >= self.channels {
            return Err(ImageError::ChannelIndexOutOfBounds(ch, self.channels));
        }
        Ok(self.pixel(x, y)?[ch])
    }

    /// Set one sample of pixel `(x, y)`.
    pub fn set_pixel(&mut self, x: usize, y: usize, ch: usize, val: T) -> Result<(), ImageError> {
        if ch >= self.channels {
            return Err(ImageError::ChannelIndexOutOfBounds(ch, self.channels));
        }
        self.pixel_mut(x, y)?[ch] = val;
        Ok(())
    }

    /// Copy a rectangular region into a new image.
    ///
    /// # Arguments
    ///
    /// * `x` - The first column of the region.
    /// * `y` - The first row of the region.
    /// * `width` - The width of the region.
    /// * `height` - The height of the region.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is empty or exceeds the image.
    ///
    /// # Examples
    ///
    /// ```
    /// use ortho_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8>::new(ImageSize { width: 3, height: 2 }, 1, vec![0, 1, 2, 3, 4, 5]).unwrap();
    /// let crop = image.crop(1, 0, 2, 2).unwrap();
    /// assert_eq!(crop.as_slice(), &[1, 2, 4, 5]);
    /// ```
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> Result<Self, ImageError> {
        if width == 0
            || height == 0
            || x + width > self.size.width
            || y + height > self.size.height
        {
            return Err(ImageError::InvalidCropWindow(
                x,
                y,
                width,
                height,
                self.size.width,
                self.size.height,
            ));
        }

        let row_len = width * self.channels;
        let mut data = Vec::with_capacity(row_len * height);
        for row in y..y + height {
            let start = (row * self.size.width + x) * self.channels;
            data.extend_from_slice(&self.data[start..start + row_len]);
        }

        Self::new(ImageSize { width, height }, self.channels, data)
    }

    /// Copy `src` into this image with its top-left pixel at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Both images must share the channel count and `src` must fit inside
    /// this image once placed.
    pub fn paste(&mut self, src: &Self, x: usize, y: usize) -> Result<(), ImageError> {
        if src.channels != self.channels {
            return Err(ImageError::ChannelMismatch(self.channels, src.channels));
        }
        if x.saturating_add(src.width()) > self.size.width
            || y.saturating_add(src.height()) > self.size.height
        {
            return Err(ImageError::InvalidCropWindow(
                x,
                y,
                src.width(),
                src.height(),
                self.size.width,
                self.size.height,
            ));
        }

        let row_len = src.width() * self.channels;
        for (r, row) in src.data.chunks_exact(row_len).enumerate() {
            let start = ((y + r) * self.size.width + x) * self.channels;
            self.data[start..start + row_len].copy_from_slice(row);
        }
        Ok(())
    }
}
