/// An axis aligned rectangle in a continuous frame (terrain, photo or pixel).
///
/// The window is always normalized so that `min` holds the smallest
/// coordinates on each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    /// Smallest X and Y.
    pub min: [f64; 2],
    /// Largest X and Y.
    pub max: [f64; 2],
}

impl Window {
    /// Create a window from two opposite corners in any order.
    pub fn new(a: [f64; 2], b: [f64; 2]) -> Self {
        Self {
            min: [a[0].min(b[0]), a[1].min(b[1])],
            max: [a[0].max(b[0]), a[1].max(b[1])],
        }
    }

    /// The envelope of a set of points.
    ///
    /// Returns `None` if the set is empty or a coordinate is NaN or infinite.
    ///
    /// # Examples
    ///
    /// ```
    /// use ortho_geometry::Window;
    ///
    /// let w = Window::from_points([[1.0, 5.0], [3.0, -1.0], [2.0, 2.0]]).unwrap();
    /// assert_eq!(w.min, [1.0, -1.0]);
    /// assert_eq!(w.max, [3.0, 5.0]);
    /// ```
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = [f64; 2]>,
    {
        let mut iter = points.into_iter();
        let first = iter.next().filter(|p| p.iter().all(|v| v.is_finite()))?;
        iter.try_fold(Self::new(first, first), |w, p| {
            if !p.iter().all(|v| v.is_finite()) {
                return None;
            }
            Some(Self {
                min: [w.min[0].min(p[0]), w.min[1].min(p[1])],
                max: [w.max[0].max(p[0]), w.max[1].max(p[1])],
            })
        })
    }

    /// Extent along X.
    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    /// Extent along Y.
    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    /// Centre of the window.
    pub fn center(&self) -> [f64; 2] {
        [
            0.5 * (self.min[0] + self.max[0]),
            0.5 * (self.min[1] + self.max[1]),
        ]
    }

    /// Whether the point lies inside the window, borders included.
    pub fn contains(&self, p: [f64; 2]) -> bool {
        p[0] >= self.min[0] && p[0] <= self.max[0] && p[1] >= self.min[1] && p[1] <= self.max[1]
    }
}

/// An integer window of pixels `[col0, col1) x [row0, row1)`.
///
/// Coordinates may be negative or exceed the raster until the window is
/// clamped with [`PixelWindow::clamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    /// First column.
    pub col0: i64,
    /// First row.
    pub row0: i64,
    /// One past the last column.
    pub col1: i64,
    /// One past the last row.
    pub row1: i64,
}

impl PixelWindow {
    /// Create a window from its first pixel and size.
    pub fn new(col: i64, row: i64, width: usize, height: usize) -> Self {
        Self {
            col0: col,
            row0: row,
            col1: col + width as i64,
            row1: row + height as i64,
        }
    }

    /// The pixels touched by a set of continuous pixel coordinates.
    ///
    /// Pixel `(c, r)` covers `[c, c + 1) x [r, r + 1)`. Returns `None` for an
    /// empty set or non finite coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use ortho_geometry::PixelWindow;
    ///
    /// let w = PixelWindow::from_points([[1.2, 3.7], [4.5, 2.0]]).unwrap();
    /// assert_eq!((w.col0, w.row0, w.col1, w.row1), (1, 2, 5, 4));
    /// ```
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = [f64; 2]>,
    {
        let window = Window::from_points(points)?;
        let col0 = window.min[0].floor() as i64;
        let row0 = window.min[1].floor() as i64;
        let col1 = (window.max[0].floor() as i64 + 1).max(col0 + 1);
        let row1 = (window.max[1].floor() as i64 + 1).max(row0 + 1);
        Some(Self {
            col0,
            row0,
            col1,
            row1,
        })
    }

    /// Grow the window by `n` pixels on every side.
    pub fn expand(&self, n: i64) -> Self {
        Self {
            col0: self.col0 - n,
            row0: self.row0 - n,
            col1: self.col1 + n,
            row1: self.row1 + n,
        }
    }

    /// Intersect the window with a `cols x rows` raster.
    ///
    /// Returns `None` when nothing is left.
    pub fn clamp(&self, cols: usize, rows: usize) -> Option<Self> {
        let w = Self {
            col0: self.col0.max(0),
            row0: self.row0.max(0),
            col1: self.col1.min(cols as i64),
            row1: self.row1.min(rows as i64),
        };
        if w.is_empty() {
            None
        } else {
            Some(w)
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        (self.col1 - self.col0).max(0) as usize
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        (self.row1 - self.row0).max(0) as usize
    }

    /// Whether the window holds no pixel.
    pub fn is_empty(&self) -> bool {
        self.col1 <= self.col0 || self.row1 <= self.row0
    }

    /// Whether pixel `(col, row)` belongs to the window.
    pub fn contains(&self, col: i64, row: i64) -> bool {
        col >= self.col0 && col < self.col1 && row >= self.row0 && row < self.row1
    }
}
