use ortho_geometry::{
    homography_4pt2d, polygon, project_point, Affine, Direction, PixelWindow,
};
use ortho_image::DynImage;

use crate::diffrect::DifferentialRectification;
use crate::dtm::DtmWindow;
use crate::error::RectifyError;

/// What happened to one terrain cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellOutcome {
    /// The cell was resampled into the ortho raster.
    Rectified {
        /// The ortho pixels touched by the cell.
        ortho_window: PixelWindow,
        /// The source pixels the cell was sampled from.
        source_window: PixelWindow,
        /// Number of ortho pixels written.
        pixels: usize,
    },
    /// One of the cell elevations is missing.
    SkippedNodata,
    /// The cell falls partly outside the ortho raster or the source photo.
    SkippedOutOfBounds,
    /// The cell could not be projected.
    SkippedDegenerate,
}

/// Cell counts of a grid pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridStats {
    /// Cells resampled into the ortho raster.
    pub rectified: usize,
    /// Cells with a missing elevation.
    pub nodata: usize,
    /// Cells outside the ortho raster or the photo.
    pub out_of_bounds: usize,
    /// Cells with a degenerate projection.
    pub degenerate: usize,
    /// Ortho pixels written.
    pub pixels: usize,
}

impl GridStats {
    /// Count one cell.
    pub fn record(&mut self, outcome: &CellOutcome) {
        match outcome {
            CellOutcome::Rectified { pixels, .. } => {
                self.rectified += 1;
                self.pixels += pixels;
            }
            CellOutcome::SkippedNodata => self.nodata += 1,
            CellOutcome::SkippedOutOfBounds => self.out_of_bounds += 1,
            CellOutcome::SkippedDegenerate => self.degenerate += 1,
        }
    }

    /// Total number of cells seen.
    pub fn cells(&self) -> usize {
        self.rectified + self.nodata + self.out_of_bounds + self.degenerate
    }
}

/// Resamples a photo into an ortho raster one terrain cell at a time.
///
/// Every cell of four terrain samples is projected into the ortho raster and
/// into the photo. The map between both quadrilaterals is approximated by the
/// homography through their corners, which is then used to fill the ortho
/// pixels inside the cell with their nearest source pixel.
pub struct GridRectifier<'a> {
    projector: &'a DifferentialRectification,
    pixel_to_photo: Affine,
    ortho_to_terrain: Affine,
    source: &'a DynImage,
    nodata: Option<f64>,
}

impl<'a> GridRectifier<'a> {
    /// Create a rectifier.
    ///
    /// # Arguments
    ///
    /// * `projector` - The collinearity projector of the photo.
    /// * `pixel_to_photo` - The pixel to photo frame map of the photo.
    /// * `ortho_to_terrain` - The georeference of the ortho raster.
    /// * `source` - The photo pixels.
    pub fn new(
        projector: &'a DifferentialRectification,
        pixel_to_photo: Affine,
        ortho_to_terrain: Affine,
        source: &'a DynImage,
    ) -> Self {
        Self {
            projector,
            pixel_to_photo,
            ortho_to_terrain,
            source,
            nodata: None,
        }
    }

    /// Set the elevation treated as missing. NaN is always missing.
    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    fn is_nodata(&self, z: f64) -> bool {
        z.is_nan() || self.nodata == Some(z)
    }

    /// Rectify every cell of a terrain window.
    ///
    /// Cells are formed by neighbouring pixel centres, so a window of
    /// `cols x rows` samples holds `(cols - 1) x (rows - 1)` cells.
    pub fn rectify(
        &self,
        dtm: &DtmWindow,
        ortho: &mut DynImage,
    ) -> Result<GridStats, RectifyError> {
        let mut stats = GridStats::default();
        for r in 0..dtm.rows().saturating_sub(1) {
            for c in 0..dtm.cols().saturating_sub(1) {
                let cell = [
                    dtm.terrain_point(c, r)?,
                    dtm.terrain_point(c + 1, r)?,
                    dtm.terrain_point(c + 1, r + 1)?,
                    dtm.terrain_point(c, r + 1)?,
                ];
                stats.record(&self.rectify_cell(&cell, ortho)?);
            }
        }
        log::debug!(
            "grid: {} cells, {} rectified, {} nodata, {} out of bounds, {} degenerate",
            stats.cells(),
            stats.rectified,
            stats.nodata,
            stats.out_of_bounds,
            stats.degenerate
        );
        Ok(stats)
    }

    /// Rectify one terrain cell.
    ///
    /// # Arguments
    ///
    /// * `cell` - The terrain corners ordered TL, TR, BR, BL.
    /// * `ortho` - The ortho raster, with the pixel format and channels of the source.
    ///
    /// # Errors
    ///
    /// Only a pixel copy between incompatible rasters fails. Cells that
    /// cannot be rectified are reported through [`CellOutcome`].
    pub fn rectify_cell(
        &self,
        cell: &[[f64; 3]; 4],
        ortho: &mut DynImage,
    ) -> Result<CellOutcome, RectifyError> {
        if cell.iter().any(|p| self.is_nodata(p[2])) {
            return Ok(CellOutcome::SkippedNodata);
        }

        let ortho_pts = cell.map(|p| {
            self.ortho_to_terrain
                .transform([p[0], p[1]], Direction::Inverse)
        });

        let mut source_pts = [[0.0; 2]; 4];
        for (dst, p) in source_pts.iter_mut().zip(cell) {
            match self.projector.backward_projection(*p) {
                Ok(photo) => *dst = self.pixel_to_photo.transform(photo, Direction::Inverse),
                Err(e) => {
                    log::trace!("cell {cell:?}: {e}");
                    return Ok(CellOutcome::SkippedDegenerate);
                }
            }
        }

        let (cols, rows) = (ortho.width(), ortho.height());
        let (width, height) = (self.source.width(), self.source.height());
        if !all_inside(&ortho_pts, cols, rows) || !all_inside(&source_pts, width, height) {
            return Ok(CellOutcome::SkippedOutOfBounds);
        }

        let Some(ortho_window) =
            PixelWindow::from_points(ortho_pts).and_then(|w| w.clamp(cols, rows))
        else {
            return Ok(CellOutcome::SkippedOutOfBounds);
        };
        let Some(source_window) = PixelWindow::from_points(source_pts)
            .map(|w| w.expand(1))
            .and_then(|w| w.clamp(width, height))
        else {
            return Ok(CellOutcome::SkippedOutOfBounds);
        };

        let (oc0, or0) = (ortho_window.col0 as f64, ortho_window.row0 as f64);
        let (sc0, sr0) = (source_window.col0 as f64, source_window.row0 as f64);
        let ortho_local = ortho_pts.map(|p| [p[0] - oc0, p[1] - or0]);
        let source_local = source_pts.map(|p| [p[0] - sc0, p[1] - sr0]);

        let h = match homography_4pt2d(&ortho_local, &source_local) {
            Ok(h) => h,
            Err(e) => {
                log::trace!("cell {cell:?}: {e}");
                return Ok(CellOutcome::SkippedDegenerate);
            }
        };

        let mut pixels = 0;
        for r in ortho_window.row0..ortho_window.row1 {
            for c in ortho_window.col0..ortho_window.col1 {
                let centre = [c as f64 + 0.5, r as f64 + 0.5];
                if !polygon::contains_point(&ortho_pts, centre) {
                    continue;
                }
                let Some([u, v]) = project_point(&h, [centre[0] - oc0, centre[1] - or0]) else {
                    continue;
                };
                let sc = u.floor() as i64 + source_window.col0;
                let sr = v.floor() as i64 + source_window.row0;
                if !source_window.contains(sc, sr) {
                    continue;
                }
                ortho.copy_pixel_from(
                    self.source,
                    (sc as usize, sr as usize),
                    (c as usize, r as usize),
                )?;
                pixels += 1;
            }
        }

        Ok(CellOutcome::Rectified {
            ortho_window,
            source_window,
            pixels,
        })
    }
}

fn all_inside(points: &[[f64; 2]; 4], cols: usize, rows: usize) -> bool {
    let (cols, rows) = (cols as f64, rows as f64);
    points
        .iter()
        .all(|p| p[0] >= 0.0 && p[0] <= cols && p[1] >= 0.0 && p[1] <= rows)
}
