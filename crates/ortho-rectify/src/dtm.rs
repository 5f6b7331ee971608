use ortho_geometry::{frames, Affine, Direction, PixelWindow, Window};
use ortho_image::DynImage;
use ortho_io::RasterReader;

use crate::error::RectifyError;

/// Elevation lookups in a terrain model opened through a [`RasterReader`].
///
/// Point lookups are single pixel windowed reads. Area lookups load the
/// window once as a [`DtmWindow`].
pub struct DtmSampler<'a> {
    reader: &'a mut dyn RasterReader,
    georeference: Affine,
    extent: Window,
    nodata: Option<f64>,
}

impl<'a> DtmSampler<'a> {
    /// Create a sampler over an open terrain model.
    ///
    /// # Arguments
    ///
    /// * `reader` - The open terrain model.
    /// * `nodata` - The missing elevation marker; see [`crate::RectifyConfig::resolve_nodata`].
    pub fn new(reader: &'a mut dyn RasterReader, nodata: Option<f64>) -> Self {
        let georeference = reader.georeference();
        let extent = frames::raster_extent(&georeference, reader.cols(), reader.rows());
        Self {
            reader,
            georeference,
            extent,
            nodata,
        }
    }

    /// The terrain area covered by the model.
    pub fn extent(&self) -> Window {
        self.extent
    }

    /// The missing elevation marker.
    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// Whether an elevation is missing. NaN is always missing.
    pub fn is_nodata(&self, z: f64) -> bool {
        z.is_nan() || self.nodata == Some(z)
    }

    /// The model pixel holding a terrain point.
    pub fn pixel_of(&self, point: [f64; 2]) -> [i64; 2] {
        let [col, row] = self.georeference.transform(point, Direction::Inverse);
        [col.floor() as i64, row.floor() as i64]
    }

    /// The raw elevation stored at a terrain point.
    ///
    /// # Returns
    ///
    /// `None` when the point is outside the model. The value may be the
    /// nodata marker; check it with [`DtmSampler::is_nodata`].
    pub fn elevation(&mut self, point: [f64; 2]) -> Result<Option<f64>, RectifyError> {
        if !(point[0].is_finite() && point[1].is_finite()) {
            return Ok(None);
        }
        let [col, row] = self.pixel_of(point);
        let window = PixelWindow::new(col, row, 1, 1);
        match self.reader.read_window(&window)? {
            Some(pixel) => Ok(Some(pixel.sample(0, 0, 0)?)),
            None => Ok(None),
        }
    }

    /// Load the elevations under a terrain area.
    ///
    /// The window covers every model pixel touched by `bbox`, grown by one
    /// pixel on each side and clipped to the model.
    ///
    /// # Returns
    ///
    /// `None` when the area does not overlap the model.
    pub fn load_window(&mut self, bbox: &Window) -> Result<Option<DtmWindow>, RectifyError> {
        let corners = [
            bbox.min,
            [bbox.max[0], bbox.min[1]],
            bbox.max,
            [bbox.min[0], bbox.max[1]],
        ]
        .map(|p| self.georeference.transform(p, Direction::Inverse));

        let Some(window) = PixelWindow::from_points(corners)
            .map(|w| w.expand(1))
            .and_then(|w| w.clamp(self.reader.cols(), self.reader.rows()))
        else {
            return Ok(None);
        };

        let Some(elevations) = self.reader.read_window(&window)? else {
            return Ok(None);
        };
        log::debug!(
            "loaded terrain window cols {}..{} rows {}..{}",
            window.col0,
            window.col1,
            window.row0,
            window.row1
        );

        let m = self.georeference.matrix(Direction::Direct);
        let (c0, r0) = (window.col0 as f64, window.row0 as f64);
        let georeference = Affine::from_matrix([
            [m[0][0], m[0][1], m[0][0] * c0 + m[0][1] * r0 + m[0][2]],
            [m[1][0], m[1][1], m[1][0] * c0 + m[1][1] * r0 + m[1][2]],
        ])?;

        Ok(Some(DtmWindow {
            elevations,
            georeference,
            window,
        }))
    }
}

/// A block of terrain elevations with its own pixel to terrain map.
#[derive(Debug, Clone)]
pub struct DtmWindow {
    elevations: DynImage,
    georeference: Affine,
    window: PixelWindow,
}

impl DtmWindow {
    /// Wrap a raster of elevations. The first channel holds the elevation.
    pub fn from_image(elevations: DynImage, georeference: Affine) -> Self {
        let window = PixelWindow::new(0, 0, elevations.width(), elevations.height());
        Self {
            elevations,
            georeference,
            window,
        }
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.elevations.width()
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.elevations.height()
    }

    /// The pixel to terrain map of the window.
    pub fn georeference(&self) -> &Affine {
        &self.georeference
    }

    /// The pixels of the full model covered by the window.
    pub fn window(&self) -> PixelWindow {
        self.window
    }

    /// The elevation of pixel `(col, row)`.
    pub fn elevation(&self, col: usize, row: usize) -> Result<f64, RectifyError> {
        Ok(self.elevations.sample(col, row, 0)?)
    }

    /// The terrain point at the centre of pixel `(col, row)`.
    pub fn terrain_point(&self, col: usize, row: usize) -> Result<[f64; 3], RectifyError> {
        let [x, y] = self
            .georeference
            .transform([col as f64 + 0.5, row as f64 + 0.5], Direction::Direct);
        Ok([x, y, self.elevation(col, row)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryRaster;
    use approx::assert_relative_eq;
    use ortho_io::RasterReader;

    fn georef() -> Result<Affine, RectifyError> {
        Ok(Affine::new(1000.0, 2000.0, 10.0, -10.0, 0.0)?)
    }

    #[test]
    fn point_elevation() -> Result<(), RectifyError> {
        let mut dtm = MemoryRaster::dtm(5, 4, georef()?, |c, r| (10 * r + c) as f32);
        dtm.open()?;
        let mut sampler = DtmSampler::new(&mut dtm, Some(0.0));

        assert_eq!(sampler.extent().min, [1000.0, 1960.0]);
        assert_eq!(sampler.extent().max, [1050.0, 2000.0]);

        assert_eq!(sampler.elevation([1025.0, 1985.0])?, Some(12.0));
        assert_eq!(sampler.elevation([1000.0, 2000.0])?, Some(0.0));
        assert_eq!(sampler.elevation([999.0, 1985.0])?, None);
        assert_eq!(sampler.elevation([1025.0, 2001.0])?, None);
        assert_eq!(sampler.elevation([f64::NAN, 0.0])?, None);

        assert!(sampler.is_nodata(0.0));
        assert!(sampler.is_nodata(f64::NAN));
        assert!(!sampler.is_nodata(12.0));
        Ok(())
    }

    #[test]
    fn window_is_expanded_and_clipped() -> Result<(), RectifyError> {
        let mut dtm = MemoryRaster::dtm(10, 10, georef()?, |c, r| (100 * r + c) as f32);
        dtm.open()?;
        let mut sampler = DtmSampler::new(&mut dtm, None);

        let bbox = Window::new([1025.0, 1955.0], [1044.0, 1972.0]);
        let Some(window) = sampler.load_window(&bbox)? else {
            panic!("bbox overlaps the terrain");
        };
        let w = window.window();
        // cols 2..=4 and rows 2..=4 touched, grown by one
        assert_eq!((w.col0, w.row0, w.col1, w.row1), (1, 1, 6, 6));
        assert_eq!(window.cols(), 5);
        assert_eq!(window.elevation(0, 0)?, 101.0);

        let p = window.terrain_point(0, 0)?;
        assert_relative_eq!(p[0], 1015.0);
        assert_relative_eq!(p[1], 1985.0);
        assert_relative_eq!(p[2], 101.0);

        let corner = sampler.load_window(&Window::new([995.0, 1995.0], [1004.0, 2004.0]))?;
        let w = corner.map(|c| c.window());
        assert_eq!(w.map(|w| (w.col0, w.row0, w.col1, w.row1)), Some((0, 0, 2, 2)));

        let outside = sampler.load_window(&Window::new([0.0, 0.0], [10.0, 10.0]))?;
        assert!(outside.is_none());
        Ok(())
    }
}
