use ortho_geometry::{affine_4pt2d, Affine, Direction, GeometryError, Window};
use ortho_image::ImageSize;

use crate::config::RectifyConfig;
use crate::diffrect::DifferentialRectification;
use crate::dtm::DtmSampler;
use crate::error::RectifyError;

/// A photo point projected onto the terrain.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TerrainProjection {
    /// The terrain point with the elevation it was projected at.
    pub point: [f64; 3],
    /// Number of refinement steps run.
    pub iterations: usize,
    /// Whether the terrain elevation matched the projection elevation.
    pub converged: bool,
}

/// The terrain quadrilateral seen by a photo.
///
/// Corners are ordered top-left, top-right, bottom-right, bottom-left as
/// seen in the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    corners: [TerrainProjection; 4],
}

impl Footprint {
    /// Create a footprint from its corners, ordered TL, TR, BR, BL.
    pub fn new(corners: [TerrainProjection; 4]) -> Self {
        Self { corners }
    }

    /// The corner projections.
    pub fn corners(&self) -> &[TerrainProjection; 4] {
        &self.corners
    }

    /// The corner points.
    pub fn points(&self) -> [[f64; 3]; 4] {
        self.corners.map(|c| c.point)
    }

    /// The planimetric polygon of the footprint.
    pub fn polygon(&self) -> Vec<[f64; 2]> {
        self.corners.iter().map(|c| [c.point[0], c.point[1]]).collect()
    }

    /// The terrain bounding box of the footprint, `None` if a corner is not finite.
    pub fn bbox(&self) -> Option<Window> {
        Window::from_points(self.corners.map(|c| [c.point[0], c.point[1]]))
    }

    /// Whether every corner converged.
    pub fn converged(&self) -> bool {
        self.corners.iter().all(|c| c.converged)
    }

    /// The mean pixel size on the ground.
    ///
    /// Fits an affine map from the image corners to the footprint corners
    /// and averages the size of its two axes.
    pub fn ground_sample_distance(&self, image_size: ImageSize) -> Result<f64, GeometryError> {
        let corners = image_corners(image_size);
        let points = self.corners.map(|c| [c.point[0], c.point[1]]);
        let affine = affine_4pt2d(&corners, &points)?;
        let gsd = 0.5 * (affine.scale_x() + affine.scale_y().abs());
        if !(gsd > 0.0 && gsd.is_finite()) {
            return Err(GeometryError::InvalidScale(gsd));
        }
        Ok(gsd)
    }
}

/// The pixel corners of an image, ordered TL, TR, BR, BL.
pub fn image_corners(size: ImageSize) -> [[f64; 2]; 4] {
    let (w, h) = (size.width as f64, size.height as f64);
    [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]]
}

/// Projects the corners of a photo onto the terrain model.
///
/// Each corner is first projected at the elevation under the camera and
/// then refined with the elevation found under the projected point until
/// both agree within the tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootprintEstimator {
    max_iterations: usize,
    elevation_tolerance: f64,
}

impl Default for FootprintEstimator {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            elevation_tolerance: 0.1,
        }
    }
}

impl FootprintEstimator {
    /// Create an estimator.
    ///
    /// # Arguments
    ///
    /// * `max_iterations` - Maximum number of refinements per corner.
    /// * `elevation_tolerance` - Elevation change under which a corner is converged.
    pub fn new(max_iterations: usize, elevation_tolerance: f64) -> Self {
        Self {
            max_iterations,
            elevation_tolerance,
        }
    }

    /// Create an estimator from the pipeline settings.
    pub fn from_config(config: &RectifyConfig) -> Self {
        Self::new(config.max_iterations, config.elevation_tolerance)
    }

    /// Compute the footprint of a photo.
    ///
    /// # Arguments
    ///
    /// * `projector` - The collinearity projector of the photo.
    /// * `pixel_to_photo` - The pixel to photo frame map.
    /// * `image_size` - The size of the photo in pixels.
    /// * `dtm` - The terrain model.
    ///
    /// # Errors
    ///
    /// Returns [`RectifyError::Data`] if the camera nadir lies outside the
    /// terrain model or its elevation is not finite.
    pub fn estimate(
        &self,
        projector: &DifferentialRectification,
        pixel_to_photo: &Affine,
        image_size: ImageSize,
        dtm: &mut DtmSampler,
    ) -> Result<Footprint, RectifyError> {
        let [cx, cy, _] = projector.camera_position();
        let z0 = match dtm.elevation([cx, cy])? {
            Some(z) if z.is_finite() => z,
            Some(z) => {
                return Err(RectifyError::Data(format!(
                    "elevation {z} under the camera at ({cx:.3}, {cy:.3})"
                )))
            }
            None => {
                return Err(RectifyError::Data(format!(
                    "camera at ({cx:.3}, {cy:.3}) is outside the terrain model"
                )))
            }
        };
        log::debug!("nadir elevation {z0:.3}");

        let mut corners = [TerrainProjection::default(); 4];
        for (corner, pixel) in corners.iter_mut().zip(image_corners(image_size)) {
            let photo_point = pixel_to_photo.transform(pixel, Direction::Direct);
            *corner = self.project_point(projector, photo_point, z0, dtm)?;
            if !corner.converged {
                log::warn!(
                    "corner {pixel:?} did not converge after {} iterations",
                    corner.iterations
                );
            }
        }

        Ok(Footprint::new(corners))
    }

    /// Project a photo point onto the terrain starting at elevation `z0`.
    pub fn project_point(
        &self,
        projector: &DifferentialRectification,
        photo_point: [f64; 2],
        z0: f64,
        dtm: &mut DtmSampler,
    ) -> Result<TerrainProjection, RectifyError> {
        let extent = dtm.extent();
        let mut z = z0;
        let mut point = projector.forward_projection(photo_point, z)?;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            iterations += 1;
            let xy = [point[0], point[1]];
            if !extent.contains(xy) {
                break;
            }
            let Some(z2) = dtm.elevation(xy)? else {
                break;
            };
            if dtm.is_nodata(z2) {
                break;
            }
            if (z2 - z).abs() > self.elevation_tolerance {
                z = z2;
                point = projector.forward_projection(photo_point, z)?;
            } else {
                converged = true;
                break;
            }
        }

        Ok(TerrainProjection {
            point,
            iterations,
            converged,
        })
    }
}
