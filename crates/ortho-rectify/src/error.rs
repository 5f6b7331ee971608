use ortho_camera::CameraError;
use ortho_geometry::GeometryError;
use ortho_image::ImageError;
use ortho_io::IoError;

/// An error type for the rectification module.
#[derive(thiserror::Error, Debug)]
pub enum RectifyError {
    /// A dataset could not be opened or created.
    #[error("Failed to open {resource}. {source}")]
    Resource {
        /// The dataset that failed.
        resource: String,
        /// The underlying error.
        #[source]
        source: IoError,
    },

    /// A projection or transform could not be computed.
    #[error("Geometry error. {0}")]
    Geometry(#[from] GeometryError),

    /// No usable terrain elevation where one is required.
    #[error("Missing terrain data: {0}")]
    Data(String),

    /// Error to read or write a dataset.
    #[error("I/O error. {0}")]
    Io(#[from] IoError),

    /// Error to build a raster.
    #[error("Image error. {0}")]
    Image(#[from] ImageError),

    /// Error with the camera description.
    #[error("Camera error. {0}")]
    Camera(#[from] CameraError),

    /// The configuration is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl RectifyError {
    pub(crate) fn resource(resource: impl std::fmt::Display, source: IoError) -> Self {
        RectifyError::Resource {
            resource: resource.to_string(),
            source,
        }
    }
}
