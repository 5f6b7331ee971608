use crate::{affine::Affine, error::GeometryError, window::Window};

/// Map between pixel coordinates and photo coordinates.
///
/// The direct map shifts by the principal point and flips the Y axis:
/// `photo = (col - cx, cy - row)`.
///
/// # Arguments
///
/// * `principal_point` - The principal point `(cx, cy)` in pixels.
pub fn pixel_to_photo(principal_point: [f64; 2]) -> Result<Affine, GeometryError> {
    Affine::new(-principal_point[0], principal_point[1], 1.0, -1.0, 0.0)
}

/// Map between ortho raster pixels and terrain coordinates.
///
/// The direct map sends pixel `(0, 0)` to the min-X/max-Y corner of the
/// bounding box, one pixel spans `gsd` terrain units and rows grow southwards.
///
/// # Arguments
///
/// * `bbox` - The terrain bounding box covered by the raster.
/// * `gsd` - The ground sample distance in terrain units per pixel.
///
/// # Errors
///
/// Returns [`GeometryError::InvalidScale`] if `gsd` is not strictly positive.
pub fn ortho_to_terrain(bbox: &Window, gsd: f64) -> Result<Affine, GeometryError> {
    if !(gsd > 0.0 && gsd.is_finite()) {
        return Err(GeometryError::InvalidScale(gsd));
    }
    Affine::new(bbox.min[0], bbox.max[1], gsd, -gsd, 0.0)
}

/// The terrain window covered by a `cols x rows` raster with the given georeference.
pub fn raster_extent(georeference: &Affine, cols: usize, rows: usize) -> Window {
    use crate::affine::Direction::Direct;

    let (c, r) = (cols as f64, rows as f64);
    let corners = [
        georeference.transform([0.0, 0.0], Direct),
        georeference.transform([c, 0.0], Direct),
        georeference.transform([c, r], Direct),
        georeference.transform([0.0, r], Direct),
    ];
    // four corners, never empty
    Window::from_points(corners).unwrap_or_else(|| Window::new(corners[0], corners[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::Direction;

    #[test]
    fn pixel_photo_roundtrip() -> Result<(), GeometryError> {
        let affine = pixel_to_photo([2000.0, 1500.0])?;
        assert_eq!(affine.transform([0.0, 0.0], Direction::Direct), [-2000.0, 1500.0]);
        assert_eq!(affine.transform([4000.0, 3000.0], Direction::Direct), [2000.0, -1500.0]);
        assert_eq!(affine.transform([0.0, 0.0], Direction::Inverse), [2000.0, 1500.0]);
        Ok(())
    }

    #[test]
    fn ortho_origin_is_upper_left() -> Result<(), GeometryError> {
        let bbox = Window::new([100.0, 200.0], [150.0, 260.0]);
        let affine = ortho_to_terrain(&bbox, 0.5)?;
        assert_eq!(affine.transform([0.0, 0.0], Direction::Direct), [100.0, 260.0]);
        assert_eq!(affine.transform([150.0, 200.0], Direction::Inverse), [100.0, 120.0]);
        Ok(())
    }

    #[test]
    fn ortho_invalid_gsd() {
        let bbox = Window::new([0.0, 0.0], [1.0, 1.0]);
        assert!(ortho_to_terrain(&bbox, 0.0).is_err());
        assert!(ortho_to_terrain(&bbox, f64::NAN).is_err());
    }

    #[test]
    fn extent_of_north_up_raster() -> Result<(), GeometryError> {
        let georef = Affine::new(1000.0, 2000.0, 5.0, -5.0, 0.0)?;
        let extent = raster_extent(&georef, 10, 4);
        assert_eq!(extent.min, [1000.0, 1980.0]);
        assert_eq!(extent.max, [1050.0, 2000.0]);
        Ok(())
    }
}
