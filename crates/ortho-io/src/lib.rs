#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Coordinate reference system identifiers.
pub mod crs;

/// Error types for the io module.
pub mod error;

/// GeoJSON vector layers.
pub mod geojson;

/// GeoTIFF raster reader and writer.
pub mod geotiff;

/// Reader for the common image formats through the `image` crate.
pub mod image_reader;

/// Raster reader and writer traits.
pub mod raster;

/// Vector layers and the vector writer trait.
pub mod vector;

pub use crate::crs::Crs;
pub use crate::error::IoError;
pub use crate::raster::{
    create_raster_reader, create_raster_writer, raster_size, RasterReader, RasterWriter,
};
pub use crate::vector::{
    create_vector_writer, Feature, Field, FieldType, FieldValue, Layer, VectorWriter,
};
