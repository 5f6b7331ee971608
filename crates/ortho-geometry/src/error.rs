/// An error type for the geometry module.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The projection ray does not intersect the reference plane.
    #[error("Projection ray is parallel to the reference plane (denominator {0})")]
    ParallelRay(f64),

    /// The affine transform cannot be inverted.
    #[error("Affine transform is singular (determinant {0})")]
    SingularTransform(f64),

    /// Four point correspondences do not define a projective transform.
    #[error("Degenerate point configuration: {0}")]
    DegenerateConfiguration(String),

    /// A scale or sampling distance is zero, negative or not finite.
    #[error("Invalid scale: {0}")]
    InvalidScale(f64),
}
