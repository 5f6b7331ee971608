use ortho_geometry::Affine;
use ortho_image::{DynImage, Image, ImageLayout};
use ortho_io::{IoError, RasterReader};

/// A raster held in memory, used as terrain model in unit tests.
pub(crate) struct MemoryRaster {
    image: DynImage,
    georeference: Affine,
    nodata: Option<f64>,
    open: bool,
    pub(crate) reads: usize,
}

impl MemoryRaster {
    pub(crate) fn new(image: DynImage, georeference: Affine, nodata: Option<f64>) -> Self {
        Self {
            image,
            georeference,
            nodata,
            open: false,
            reads: 0,
        }
    }

    /// A single band f32 terrain model with elevation `f(col, row)`.
    pub(crate) fn dtm(
        cols: usize,
        rows: usize,
        georeference: Affine,
        f: impl Fn(usize, usize) -> f32,
    ) -> Self {
        let data = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| (c, r)))
            .map(|(c, r)| f(c, r))
            .collect::<Vec<_>>();
        let image = Image::<f32>::new([cols, rows].into(), 1, data)
            .map(DynImage::from)
            .unwrap_or_else(|e| panic!("invalid test terrain: {e}"));
        Self::new(image, georeference, None)
    }
}

impl RasterReader for MemoryRaster {
    fn open(&mut self) -> Result<(), IoError> {
        self.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn layout(&self) -> Option<ImageLayout> {
        self.open.then(|| self.image.layout())
    }

    fn georeference(&self) -> Affine {
        self.georeference
    }

    fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    fn read(&mut self) -> Result<DynImage, IoError> {
        self.reads += 1;
        Ok(self.image.clone())
    }
}
