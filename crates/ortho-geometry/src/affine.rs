use faer::prelude::SpSolverLstsq;

use crate::error::GeometryError;

/// Direction in which a frame transform is applied.
///
/// Every frame map in this crate is stored as its direct form; the caller
/// chooses at the call site whether the direct or the inverse map is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Apply the transform as stored.
    Direct,
    /// Apply the inverse of the stored transform.
    Inverse,
}

/// A 2D affine transform together with its inverse.
///
/// The direct map sends `(x, y)` to
/// `(m00 * x + m01 * y + m02, m10 * x + m11 * y + m12)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    direct: [[f64; 3]; 2],
    inverse: [[f64; 3]; 2],
}

impl Affine {
    /// Create an affine transform from translation, scale and rotation.
    ///
    /// # Arguments
    ///
    /// * `tx` - Translation along X.
    /// * `ty` - Translation along Y.
    /// * `scale_x` - Scale applied to the X axis.
    /// * `scale_y` - Scale applied to the Y axis (negative to flip).
    /// * `rotation` - Rotation angle in radians.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::SingularTransform`] if any scale is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use ortho_geometry::{Affine, Direction};
    ///
    /// let affine = Affine::new(10.0, 20.0, 2.0, -2.0, 0.0).unwrap();
    /// assert_eq!(affine.transform([1.0, 1.0], Direction::Direct), [12.0, 18.0]);
    /// assert_eq!(affine.transform([12.0, 18.0], Direction::Inverse), [1.0, 1.0]);
    /// ```
    pub fn new(
        tx: f64,
        ty: f64,
        scale_x: f64,
        scale_y: f64,
        rotation: f64,
    ) -> Result<Self, GeometryError> {
        let (sin, cos) = rotation.sin_cos();
        Self::from_matrix([
            [scale_x * cos, -scale_y * sin, tx],
            [scale_x * sin, scale_y * cos, ty],
        ])
    }

    /// Create an affine transform from its 2x3 matrix.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::SingularTransform`] if the linear part cannot be inverted.
    pub fn from_matrix(m: [[f64; 3]; 2]) -> Result<Self, GeometryError> {
        let det = m[0][0] * m[1][1] - m[0][1] * m[1][0];
        if det == 0.0 || !det.is_finite() {
            return Err(GeometryError::SingularTransform(det));
        }

        let inv_det = 1.0 / det;
        let a = m[1][1] * inv_det;
        let b = -m[0][1] * inv_det;
        let c = -m[1][0] * inv_det;
        let d = m[0][0] * inv_det;

        let inverse = [
            [a, b, -(a * m[0][2] + b * m[1][2])],
            [c, d, -(c * m[0][2] + d * m[1][2])],
        ];

        Ok(Self { direct: m, inverse })
    }

    /// The identity transform.
    pub fn identity() -> Self {
        let m = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        Self {
            direct: m,
            inverse: m,
        }
    }

    /// The 2x3 matrix of the transform in the requested direction.
    pub fn matrix(&self, direction: Direction) -> [[f64; 3]; 2] {
        match direction {
            Direction::Direct => self.direct,
            Direction::Inverse => self.inverse,
        }
    }

    /// Translation along X of the direct map.
    pub fn tx(&self) -> f64 {
        self.direct[0][2]
    }

    /// Translation along Y of the direct map.
    pub fn ty(&self) -> f64 {
        self.direct[1][2]
    }

    /// Scale of the X axis of the direct map.
    pub fn scale_x(&self) -> f64 {
        self.direct[0][0].hypot(self.direct[1][0])
    }

    /// Scale of the Y axis of the direct map, negative when the map flips orientation.
    pub fn scale_y(&self) -> f64 {
        let det = self.direct[0][0] * self.direct[1][1] - self.direct[0][1] * self.direct[1][0];
        self.direct[0][1].hypot(self.direct[1][1]).copysign(det)
    }

    /// Rotation angle of the direct map in radians.
    pub fn rotation(&self) -> f64 {
        self.direct[1][0].atan2(self.direct[0][0])
    }

    /// Whether the linear part is a pure axis scale (no rotation or shear).
    pub fn is_axis_aligned(&self) -> bool {
        self.direct[0][1] == 0.0 && self.direct[1][0] == 0.0
    }

    /// Transform a point.
    ///
    /// # Arguments
    ///
    /// * `point` - The point to transform.
    /// * `direction` - Whether the direct or the inverse map is applied.
    pub fn transform(&self, point: [f64; 2], direction: Direction) -> [f64; 2] {
        let m = self.matrix(direction);
        [
            m[0][0] * point[0] + m[0][1] * point[1] + m[0][2],
            m[1][0] * point[0] + m[1][1] * point[1] + m[1][2],
        ]
    }
}

/// Computes the least squares 2D affine transform from 4 point correspondences.
///
/// * `x1` - The source points with shape (4, 2).
/// * `x2` - The destination points with shape (4, 2).
///
/// # Returns
///
/// The affine transform mapping `x1` onto `x2` in its direct form.
///
/// # Errors
///
/// Returns an error if the points are collinear and the fitted transform is singular.
pub fn affine_4pt2d(x1: &[[f64; 2]; 4], x2: &[[f64; 2]; 4]) -> Result<Affine, GeometryError> {
    // construct matrix A
    let mut mat_a = faer::Mat::<f64>::zeros(8, 6);
    let mut mat_b = faer::Mat::<f64>::zeros(8, 1);

    for i in 0..4 {
        let (x1_0, x1_1) = (x1[i][0], x1[i][1]);
        let (x2_0, x2_1) = (x2[i][0], x2[i][1]);
        mat_a[(2 * i, 0)] = x1_0;
        mat_a[(2 * i, 1)] = x1_1;
        mat_a[(2 * i, 2)] = 1.0;
        mat_a[(2 * i + 1, 3)] = x1_0;
        mat_a[(2 * i + 1, 4)] = x1_1;
        mat_a[(2 * i + 1, 5)] = 1.0;
        mat_b[(2 * i, 0)] = x2_0;
        mat_b[(2 * i + 1, 0)] = x2_1;
    }

    let params = mat_a.qr().solve_lstsq(mat_b);
    let aff = params.col(0);

    let m = [[aff[0], aff[1], aff[2]], [aff[3], aff[4], aff[5]]];
    if m.iter().flatten().any(|v| !v.is_finite()) {
        return Err(GeometryError::DegenerateConfiguration(
            "affine least squares produced non finite parameters".to_string(),
        ));
    }

    Affine::from_matrix(m)
}
