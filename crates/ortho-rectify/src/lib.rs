#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Settings shared by the rectification pipelines.
pub mod config;

/// Collinearity projections between photo and terrain.
pub mod diffrect;

/// Elevation lookups in a terrain model.
pub mod dtm;

/// Error types for the rectification module.
pub mod error;

/// Terrain footprint of a photo.
pub mod footprint;

/// Per cell rectification of a photo over the terrain grid.
pub mod grid;

/// Batch pipelines over a list of photos.
pub mod pipeline;

/// Selection of the photos that see a terrain point.
pub mod select;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::config::RectifyConfig;
pub use crate::diffrect::DifferentialRectification;
pub use crate::dtm::{DtmSampler, DtmWindow};
pub use crate::error::RectifyError;
pub use crate::footprint::{Footprint, FootprintEstimator, TerrainProjection};
pub use crate::grid::{CellOutcome, GridRectifier, GridStats};
pub use crate::pipeline::{
    BatchReport, FootprintGenerator, Orthorectification, PhotoFailure, PhotoState,
};
pub use crate::select::{photos_containing_point, select_photos, PhotoCandidate};
