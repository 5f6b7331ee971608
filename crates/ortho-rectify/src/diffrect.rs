use ortho_camera::Photo;
use ortho_geometry::GeometryError;

const DENOMINATOR_EPS: f64 = 1e-12;

fn check_denominator(denom: f64) -> Result<f64, GeometryError> {
    if !denom.is_finite() || denom.abs() < DENOMINATOR_EPS {
        return Err(GeometryError::ParallelRay(denom));
    }
    Ok(denom)
}

/// Collinearity projector of one photo.
///
/// Holds the terrain to camera rotation `R`, the projection centre `C` and the
/// focal length `f`, and maps points between the photo frame and the terrain.
///
/// # Examples
///
/// ```
/// use ortho_rectify::DifferentialRectification;
///
/// let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
/// let projector = DifferentialRectification::new(identity, [500.0, 300.0, 1000.0], 100.0);
///
/// let ground = projector.forward_projection([0.0, 0.0], 0.0).unwrap();
/// assert_eq!(ground, [500.0, 300.0, 0.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferentialRectification {
    rotation: [[f64; 3]; 3],
    camera_position: [f64; 3],
    focal: f64,
}

impl DifferentialRectification {
    /// Create a projector.
    ///
    /// # Arguments
    ///
    /// * `rotation` - The terrain to camera rotation.
    /// * `camera_position` - The projection centre in the terrain frame.
    /// * `focal` - The focal length in pixels.
    pub fn new(rotation: [[f64; 3]; 3], camera_position: [f64; 3], focal: f64) -> Self {
        Self {
            rotation,
            camera_position,
            focal,
        }
    }

    /// Create the projector of an oriented photo.
    pub fn from_photo(photo: &Photo) -> Self {
        let pose = photo.pose();
        Self::new(
            *pose.rotation(),
            pose.position(),
            photo.camera().calibration.focal(),
        )
    }

    /// The terrain to camera rotation.
    pub fn rotation(&self) -> &[[f64; 3]; 3] {
        &self.rotation
    }

    /// The projection centre.
    pub fn camera_position(&self) -> [f64; 3] {
        self.camera_position
    }

    /// The focal length in pixels.
    pub fn focal(&self) -> f64 {
        self.focal
    }

    /// Project a photo point onto the horizontal plane at elevation `z`.
    ///
    /// # Returns
    ///
    /// The terrain point `(X, Y, z)`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ParallelRay`] if the ray through the photo
    /// point never reaches the plane.
    pub fn forward_projection(
        &self,
        photo_point: [f64; 2],
        z: f64,
    ) -> Result<[f64; 3], GeometryError> {
        let r = &self.rotation;
        let c = &self.camera_position;
        let [x, y] = photo_point;
        let f = self.focal;

        let denom = check_denominator(r[0][2] * x + r[1][2] * y - r[2][2] * f)?;
        let dz = z - c[2];

        Ok([
            c[0] + dz * (r[0][0] * x + r[1][0] * y - r[2][0] * f) / denom,
            c[1] + dz * (r[0][1] * x + r[1][1] * y - r[2][1] * f) / denom,
            z,
        ])
    }

    /// Project a terrain point into the photo frame.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ParallelRay`] if the point lies on the plane
    /// through the projection centre parallel to the image plane.
    pub fn backward_projection(&self, terrain_point: [f64; 3]) -> Result<[f64; 2], GeometryError> {
        let r = &self.rotation;
        let c = &self.camera_position;
        let dx = terrain_point[0] - c[0];
        let dy = terrain_point[1] - c[1];
        let dz = terrain_point[2] - c[2];

        let denom = check_denominator(r[2][0] * dx + r[2][1] * dy + r[2][2] * dz)?;
        let f = self.focal;

        Ok([
            -f * (r[0][0] * dx + r[0][1] * dy + r[0][2] * dz) / denom,
            -f * (r[1][0] * dx + r[1][1] * dy + r[1][2] * dz) / denom,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::Rng;

    fn reference_projector() -> DifferentialRectification {
        DifferentialRectification::new(
            [
                [0.998, -0.054, -0.031],
                [0.057, 0.995, 0.084],
                [0.027, -0.085, 0.996],
            ],
            [220.81, 499.165, 799.064],
            154.07,
        )
    }

    #[test]
    fn forward_reference_values() -> Result<(), GeometryError> {
        let projector = reference_projector();
        let cases = [
            (400.0, [504.352, 647.918]),
            (300.989, [574.701, 684.824]),
            (307.4828, [570.087, 682.404]),
            (307.0569, [570.389, 682.562]),
            (307.0848, [570.369, 682.552]),
        ];
        for (z, [x, y]) in cases {
            let point = projector.forward_projection([110.0, 50.0], z)?;
            assert_relative_eq!(point[0], x, max_relative = 1e-3);
            assert_relative_eq!(point[1], y, max_relative = 1e-3);
            assert_eq!(point[2], z);
        }
        Ok(())
    }

    #[test]
    fn backward_reference_values() -> Result<(), GeometryError> {
        let projector = reference_projector();
        let photo = projector.backward_projection([570.369, 682.552, 307.0848])?;
        assert_relative_eq!(photo[0], 110.0, max_relative = 1e-3);
        assert_relative_eq!(photo[1], 50.0, max_relative = 1e-3);
        Ok(())
    }

    #[test]
    fn principal_point_hits_nadir() -> Result<(), GeometryError> {
        let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let projector = DifferentialRectification::new(identity, [10.0, -20.0, 300.0], 50.0);
        for z in [-5.0, 0.0, 120.5] {
            assert_eq!(projector.forward_projection([0.0, 0.0], z)?, [10.0, -20.0, z]);
        }
        Ok(())
    }

    fn rotation_omega_phi_kappa(omega: f64, phi: f64, kappa: f64) -> [[f64; 3]; 3] {
        let (so, co) = omega.sin_cos();
        let (sp, cp) = phi.sin_cos();
        let (sk, ck) = kappa.sin_cos();
        [
            [cp * ck, co * sk + so * sp * ck, so * sk - co * sp * ck],
            [-cp * sk, co * ck - so * sp * sk, so * ck + co * sp * sk],
            [sp, -so * cp, co * cp],
        ]
    }

    #[test]
    fn random_roundtrip() -> Result<(), GeometryError> {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let rotation = rotation_omega_phi_kappa(
                rng.random_range(-0.1..0.1),
                rng.random_range(-0.1..0.1),
                rng.random_range(-3.1..3.1),
            );
            let projector = DifferentialRectification::new(rotation, [220.81, 499.165, 799.064], 154.07);
            let photo = [rng.random_range(-150.0..150.0), rng.random_range(-150.0..150.0)];
            let z = rng.random_range(0.0..500.0);
            let terrain = projector.forward_projection(photo, z)?;
            let back = projector.backward_projection(terrain)?;
            assert_relative_eq!(back[0], photo[0], epsilon = 1e-6);
            assert_relative_eq!(back[1], photo[1], epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn parallel_ray() {
        // camera looking along +X, a photo point on the horizon never reaches the ground
        let rotation = [[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [-1.0, 0.0, 0.0]];
        let projector = DifferentialRectification::new(rotation, [0.0, 0.0, 100.0], 50.0);
        assert!(matches!(
            projector.forward_projection([0.0, 0.0], 0.0),
            Err(GeometryError::ParallelRay(_))
        ));

        let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let projector = DifferentialRectification::new(identity, [0.0, 0.0, 100.0], 50.0);
        assert!(projector.backward_projection([10.0, 5.0, 100.0]).is_err());
    }
}
