/// An error type for the io module.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    /// Error when the file does not exist.
    #[error("File does not exist: {0}")]
    FileDoesNotExist(std::path::PathBuf),

    /// Invalid file extension.
    #[error("File does not have a supported extension: {0}")]
    InvalidFileExtension(std::path::PathBuf),

    /// Error to open the file.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),

    /// The dataset must be opened first.
    #[error("The dataset is not open: {0}")]
    NotOpen(std::path::PathBuf),

    /// The dataset must be created before writing.
    #[error("The dataset has not been created: {0}")]
    NotCreated(std::path::PathBuf),

    /// Error to decode or encode a TIFF file.
    #[error("Error with TIFF encoding/decoding. {0}")]
    TiffError(#[from] tiff::TiffError),

    /// Error to decode the image.
    #[error("Failed to decode the image. {0}")]
    ImageDecodeError(#[from] image::ImageError),

    /// Error to create the image.
    #[error("Failed to create image. {0}")]
    ImageCreationError(#[from] ortho_image::ImageError),

    /// Error with the georeference stored in the file.
    #[error("Invalid georeference. {0}")]
    GeoreferenceError(#[from] ortho_geometry::GeometryError),

    /// The raster layout cannot be stored in the format.
    #[error("Unsupported raster layout: {0}")]
    UnsupportedLayout(String),

    /// The raster does not match the layout it was created with.
    #[error("Raster layout mismatch: expected {expected}, got {actual}")]
    LayoutMismatch {
        /// The layout given on creation.
        expected: String,
        /// The layout of the raster.
        actual: String,
    },

    /// Error to read or write JSON.
    #[error("Error with JSON encoding/decoding. {0}")]
    JsonError(#[from] serde_json::Error),

    /// The vector file holds something other than polygons.
    #[error("Invalid vector data: {0}")]
    InvalidVectorData(String),

    /// The attributes of a feature do not match the fields of the layer.
    #[error("Feature has {0} attributes but the layer has {1} fields")]
    AttributeMismatch(usize, usize),
}
