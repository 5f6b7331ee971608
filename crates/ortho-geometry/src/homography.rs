use faer::prelude::SpSolver;

use crate::error::GeometryError;

/// A 3x3 projective transform in row-major order with `h[2][2] == 1`.
pub type Homography = [[f64; 3]; 3];

#[rustfmt::skip]
fn det_mat33(m: &Homography) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1]) -
    m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0]) +
    m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Compute the homography matrix from four 2d point correspondences.
///
/// The eight unknowns are solved with `h[2][2]` fixed to one, so the four
/// correspondences determine a unique transform.
///
/// * `x1` - The source 2d points with shape (4, 2).
/// * `x2` - The destination 2d points with shape (4, 2).
///
/// # Returns
///
/// The homography mapping `x1` onto `x2`.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateConfiguration`] if three of the points are
/// collinear or the solution is not finite.
///
/// # Examples
///
/// ```
/// use ortho_geometry::{homography_4pt2d, project_point};
///
/// let x1 = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
/// let x2 = [[2.0, 3.0], [4.0, 3.0], [4.0, 5.0], [2.0, 5.0]];
/// let h = homography_4pt2d(&x1, &x2).unwrap();
/// let p = project_point(&h, [0.5, 0.5]).unwrap();
/// assert!((p[0] - 3.0).abs() < 1e-9 && (p[1] - 4.0).abs() < 1e-9);
/// ```
pub fn homography_4pt2d(
    x1: &[[f64; 2]; 4],
    x2: &[[f64; 2]; 4],
) -> Result<Homography, GeometryError> {
    let mut mat_a = faer::Mat::<f64>::zeros(8, 8);
    let mut mat_b = faer::Mat::<f64>::zeros(8, 1);
    for i in 0..4 {
        let (x1_0, x1_1) = (x1[i][0], x1[i][1]);
        let (x2_0, x2_1) = (x2[i][0], x2[i][1]);

        mat_a[(2 * i, 0)] = x1_0;
        mat_a[(2 * i, 1)] = x1_1;
        mat_a[(2 * i, 2)] = 1.0;
        mat_a[(2 * i, 6)] = -x2_0 * x1_0;
        mat_a[(2 * i, 7)] = -x2_0 * x1_1;
        mat_b[(2 * i, 0)] = x2_0;

        mat_a[(2 * i + 1, 3)] = x1_0;
        mat_a[(2 * i + 1, 4)] = x1_1;
        mat_a[(2 * i + 1, 5)] = 1.0;
        mat_a[(2 * i + 1, 6)] = -x2_1 * x1_0;
        mat_a[(2 * i + 1, 7)] = -x2_1 * x1_1;
        mat_b[(2 * i + 1, 0)] = x2_1;
    }

    // solve -> h_mat: 8x1
    let h_mat = mat_a.partial_piv_lu().solve(mat_b);
    let h = h_mat.col(0);

    let homo = [
        [h[0], h[1], h[2]],
        [h[3], h[4], h[5]],
        [h[6], h[7], 1.0],
    ];

    if homo.iter().flatten().any(|v| !v.is_finite()) {
        return Err(GeometryError::DegenerateConfiguration(
            "homography has non finite entries".to_string(),
        ));
    }

    let det = det_mat33(&homo);
    if det.abs() < 1e-12 {
        return Err(GeometryError::DegenerateConfiguration(format!(
            "homography determinant is too small: {det}"
        )));
    }

    Ok(homo)
}

/// Apply a homography to a point.
///
/// Returns `None` when the point maps to infinity.
pub fn project_point(h: &Homography, p: [f64; 2]) -> Option<[f64; 2]> {
    let w = h[2][0] * p[0] + h[2][1] * p[1] + h[2][2];
    if w == 0.0 || !w.is_finite() {
        return None;
    }
    let x = (h[0][0] * p[0] + h[0][1] * p[1] + h[0][2]) / w;
    let y = (h[1][0] * p[0] + h[1][1] * p[1] + h[1][2]) / w;
    Some([x, y])
}
