use std::path::Path;

use crate::crs::Crs;
use crate::error::IoError;
use crate::geojson::GeoJsonWriter;
use crate::raster::extension;

/// The type of an attribute field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Text.
    String,
    /// Signed integer.
    Integer,
    /// Floating point number.
    Real,
}

/// An attribute field of a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// The name of the field.
    pub name: String,
    /// The type of the field.
    pub field_type: FieldType,
}

impl Field {
    /// Create a field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// The value of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Text.
    String(String),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Real(f64),
}

impl FieldValue {
    /// The type of the value.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::String(_) => FieldType::String,
            FieldValue::Integer(_) => FieldType::Integer,
            FieldValue::Real(_) => FieldType::Real,
        }
    }

    /// The value as text, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A polygon with one attribute value per field of its layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// The vertices of the outer ring, without repeating the first one.
    pub polygon: Vec<[f64; 2]>,
    /// The attribute values, in field order.
    pub attributes: Vec<FieldValue>,
}

/// A named collection of polygon features sharing the same attribute fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    name: String,
    fields: Vec<Field>,
    features: Vec<Feature>,
}

impl Layer {
    /// Create an empty layer.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            features: Vec::new(),
        }
    }

    /// The name of the layer.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add an attribute field. Fields must be added before any feature.
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// The attribute fields.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The index of a field by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Append a feature.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::AttributeMismatch`] if the number of attributes
    /// differs from the number of fields, and [`IoError::InvalidVectorData`]
    /// if the polygon has fewer than three vertices or a value has the wrong type.
    ///
    /// # Examples
    ///
    /// ```
    /// use ortho_io::{Field, FieldType, FieldValue, Layer};
    ///
    /// let mut layer = Layer::new("footprint");
    /// layer.add_field(Field::new("name", FieldType::String));
    /// layer
    ///     .push_feature(
    ///         vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
    ///         vec![FieldValue::String("IMG_0001".into())],
    ///     )
    ///     .unwrap();
    /// assert_eq!(layer.features().len(), 1);
    /// ```
    pub fn push_feature(
        &mut self,
        polygon: Vec<[f64; 2]>,
        attributes: Vec<FieldValue>,
    ) -> Result<(), IoError> {
        if attributes.len() != self.fields.len() {
            return Err(IoError::AttributeMismatch(
                attributes.len(),
                self.fields.len(),
            ));
        }
        if polygon.len() < 3 {
            return Err(IoError::InvalidVectorData(format!(
                "a polygon needs at least 3 vertices, got {}",
                polygon.len()
            )));
        }
        if let Some((field, value)) = self
            .fields
            .iter()
            .zip(&attributes)
            .find(|(field, value)| field.field_type != value.field_type())
        {
            return Err(IoError::InvalidVectorData(format!(
                "field '{}' expects {:?}, got {:?}",
                field.name, field.field_type, value
            )));
        }
        self.features.push(Feature {
            polygon,
            attributes,
        });
        Ok(())
    }

    /// The features, in insertion order.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Whether the layer has no feature.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// A vector dataset opened for writing.
///
/// The call order is `open`, `create`, `set_crs`, `write` for every layer and `close`.
pub trait VectorWriter {
    /// Check the destination can be written.
    fn open(&mut self) -> Result<(), IoError>;

    /// Whether the destination is open.
    fn is_open(&self) -> bool;

    /// Create the dataset.
    fn create(&mut self) -> Result<(), IoError>;

    /// Set the coordinate reference system of the dataset.
    fn set_crs(&mut self, crs: &Crs);

    /// Write a layer.
    fn write(&mut self, layer: &Layer) -> Result<(), IoError>;

    /// Flush and release the destination. Closing twice is a no-op.
    fn close(&mut self) -> Result<(), IoError>;
}

/// Create a vector writer for the file, chosen by its extension.
///
/// `geojson` and `json` are written as GeoJSON.
pub fn create_vector_writer(path: impl AsRef<Path>) -> Result<Box<dyn VectorWriter>, IoError> {
    let path = path.as_ref();
    match extension(path).as_str() {
        "geojson" | "json" => Ok(Box::new(GeoJsonWriter::new(path))),
        _ => Err(IoError::InvalidFileExtension(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> Layer {
        let mut layer = Layer::new("footprint");
        layer.add_field(Field::new("name", FieldType::String));
        layer
    }

    #[test]
    fn push_checks_attributes() {
        let mut layer = layer();
        let square = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        assert!(matches!(
            layer.push_feature(square.clone(), vec![]),
            Err(IoError::AttributeMismatch(0, 1))
        ));
        assert!(layer
            .push_feature(square.clone(), vec![FieldValue::Real(1.0)])
            .is_err());
        assert!(layer
            .push_feature(vec![[0.0, 0.0]], vec![FieldValue::String("a".into())])
            .is_err());
        assert!(layer
            .push_feature(square, vec![FieldValue::String("a".into())])
            .is_ok());
        assert_eq!(layer.field_index("name"), Some(0));
        assert_eq!(layer.features()[0].attributes[0].as_str(), Some("a"));
    }

    #[test]
    fn vector_factory() {
        assert!(create_vector_writer("footprint.geojson").is_ok());
        assert!(create_vector_writer("footprint.JSON").is_ok());
        assert!(create_vector_writer("footprint.shp").is_err());
    }
}
