const EDGE_EPS: f64 = 1e-9;

/// Whether `p` lies inside the polygon or on its boundary.
///
/// The polygon is given by its vertices in order; it is closed implicitly and
/// may be convex or not.
///
/// # Examples
///
/// ```
/// use ortho_geometry::polygon::contains_point;
///
/// let quad = [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]];
/// assert!(contains_point(&quad, [2.0, 2.0]));
/// assert!(contains_point(&quad, [4.0, 1.0]));
/// assert!(!contains_point(&quad, [4.5, 1.0]));
/// ```
pub fn contains_point(polygon: &[[f64; 2]], p: [f64; 2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (polygon[j], polygon[i]);
        if on_segment(a, b, p) {
            return true;
        }
        if (b[1] > p[1]) != (a[1] > p[1]) {
            let x = b[0] + (p[1] - b[1]) * (a[0] - b[0]) / (a[1] - b[1]);
            if p[0] < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_segment(a: [f64; 2], b: [f64; 2], p: [f64; 2]) -> bool {
    let cross = (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]);
    let len = (b[0] - a[0]).hypot(b[1] - a[1]);
    if cross.abs() > EDGE_EPS * len.max(1.0) {
        return false;
    }
    p[0] >= a[0].min(b[0]) - EDGE_EPS
        && p[0] <= a[0].max(b[0]) + EDGE_EPS
        && p[1] >= a[1].min(b[1]) - EDGE_EPS
        && p[1] <= a[1].max(b[1]) + EDGE_EPS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skewed_quad() {
        let quad = [[1.0, 0.0], [5.0, 1.0], [4.0, 5.0], [0.0, 3.0]];
        assert!(contains_point(&quad, [2.5, 2.5]));
        assert!(contains_point(&quad, [1.0, 0.0]));
        assert!(!contains_point(&quad, [0.0, 0.0]));
        assert!(!contains_point(&quad, [5.0, 5.0]));
    }

    #[test]
    fn concave_polygon() {
        let poly = [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [2.0, 1.0], [0.0, 4.0]];
        assert!(contains_point(&poly, [1.0, 1.0]));
        assert!(!contains_point(&poly, [2.0, 3.0]));
    }

    #[test]
    fn degenerate_polygon() {
        assert!(!contains_point(&[[0.0, 0.0], [1.0, 1.0]], [0.5, 0.5]));
    }
}
