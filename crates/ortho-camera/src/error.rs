use std::path::PathBuf;

/// An error type for the camera module.
#[derive(thiserror::Error, Debug)]
pub enum CameraError {
    /// The camera model name is not known.
    #[error("Invalid camera type: {0}")]
    UnknownModel(String),

    /// The position or the rotation holds a NaN or infinite entry.
    #[error("Camera pose has non finite values")]
    NonFinitePose,

    /// The rotation matrix is not orthonormal.
    #[error("Rotation matrix is not orthonormal (error {0})")]
    InvalidRotation(f64),

    /// A value in an orientation file could not be parsed.
    #[error("Failed to parse {path}: {reason}")]
    Parse {
        /// The file being parsed.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The bundle file and the image list disagree.
    #[error("The bundle file holds {0} cameras but the image list has {1} images")]
    CameraCountMismatch(usize, usize),

    /// An image of the list was not found on disk.
    #[error("Image not found: {0}")]
    ImageNotFound(PathBuf),

    /// The size of an image could not be determined.
    #[error("Failed to read the size of {0}: {1}")]
    ImageSize(PathBuf, String),

    /// Error to open or read a file.
    #[error("Failed to read {0}")]
    Io(PathBuf, #[source] std::io::Error),
}
