use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use serde_json::{json, Map, Value};

use crate::crs::Crs;
use crate::error::IoError;
use crate::vector::{Field, FieldType, FieldValue, Layer, VectorWriter};

/// Writes a layer of polygons as a GeoJSON `FeatureCollection`.
///
/// GeoJSON holds a single layer; the collection takes the name of the layer
/// and the CRS is stored with the legacy `crs` member.
pub struct GeoJsonWriter {
    path: PathBuf,
    file: Option<BufWriter<fs::File>>,
    created: bool,
    crs: Option<Crs>,
    written: bool,
}

impl GeoJsonWriter {
    /// Create a writer for the file. Nothing is written until [`VectorWriter::open`].
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: None,
            created: false,
            crs: None,
            written: false,
        }
    }
}

fn attribute_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::String(s) => Value::from(s.as_str()),
        FieldValue::Integer(i) => Value::from(*i),
        FieldValue::Real(r) => Value::from(*r),
    }
}

fn layer_to_json(layer: &Layer, crs: Option<&Crs>) -> Value {
    let features = layer
        .features()
        .iter()
        .map(|feature| {
            let properties = layer
                .fields()
                .iter()
                .zip(&feature.attributes)
                .map(|(field, value)| (field.name.clone(), attribute_value(value)))
                .collect::<Map<_, _>>();

            let mut ring = feature
                .polygon
                .iter()
                .map(|p| json!([p[0], p[1]]))
                .collect::<Vec<_>>();
            if let Some(first) = ring.first().cloned() {
                ring.push(first);
            }

            json!({
                "type": "Feature",
                "properties": properties,
                "geometry": { "type": "Polygon", "coordinates": [ring] },
            })
        })
        .collect::<Vec<_>>();

    let mut collection = json!({
        "type": "FeatureCollection",
        "name": layer.name(),
        "features": features,
    });
    if let Some(urn) = crs.and_then(Crs::ogc_urn) {
        collection["crs"] = json!({ "type": "name", "properties": { "name": urn } });
    }
    collection
}

impl VectorWriter for GeoJsonWriter {
    fn open(&mut self) -> Result<(), IoError> {
        let ext_ok = self.path.extension().map_or(false, |ext| {
            ext.eq_ignore_ascii_case("geojson") || ext.eq_ignore_ascii_case("json")
        });
        if !ext_ok {
            return Err(IoError::InvalidFileExtension(self.path.clone()));
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        self.file = Some(BufWriter::new(fs::File::create(&self.path)?));
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn create(&mut self) -> Result<(), IoError> {
        if self.file.is_none() {
            return Err(IoError::NotOpen(self.path.clone()));
        }
        self.created = true;
        Ok(())
    }

    fn set_crs(&mut self, crs: &Crs) {
        self.crs = Some(crs.clone());
    }

    fn write(&mut self, layer: &Layer) -> Result<(), IoError> {
        if !self.created {
            return Err(IoError::NotCreated(self.path.clone()));
        }
        if self.written {
            return Err(IoError::InvalidVectorData(
                "GeoJSON holds a single layer".to_string(),
            ));
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| IoError::NotOpen(self.path.clone()))?;
        serde_json::to_writer_pretty(&mut *file, &layer_to_json(layer, self.crs.as_ref()))?;
        file.write_all(b"\n")?;
        self.written = true;
        log::debug!(
            "wrote {} features to {}",
            layer.features().len(),
            self.path.display()
        );
        Ok(())
    }

    fn close(&mut self) -> Result<(), IoError> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        self.created = false;
        Ok(())
    }
}

fn field_value(value: &Value) -> Option<FieldValue> {
    match value {
        Value::String(s) => Some(FieldValue::String(s.clone())),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(FieldValue::Integer(i)),
            None => n.as_f64().map(FieldValue::Real),
        },
        _ => None,
    }
}

fn outer_ring(geometry: &Value) -> Result<Vec<[f64; 2]>, IoError> {
    if geometry["type"] != "Polygon" {
        return Err(IoError::InvalidVectorData(format!(
            "expected a Polygon, got {}",
            geometry["type"]
        )));
    }
    let ring = geometry["coordinates"][0]
        .as_array()
        .ok_or_else(|| IoError::InvalidVectorData("polygon without rings".to_string()))?;

    let mut points = ring
        .iter()
        .map(|p| match (p[0].as_f64(), p[1].as_f64()) {
            (Some(x), Some(y)) => Ok([x, y]),
            _ => Err(IoError::InvalidVectorData(format!("invalid position {p}"))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    Ok(points)
}

/// Read a GeoJSON `FeatureCollection` of polygons into a layer.
///
/// The fields are taken from the properties of the first feature. Properties
/// that are neither text nor numbers are ignored.
///
/// # Returns
///
/// The layer and its CRS, if the file declares one.
pub fn read_layer(path: impl AsRef<Path>) -> Result<(Layer, Option<Crs>), IoError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::FileDoesNotExist(path.to_path_buf()));
    }
    let root: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    if root["type"] != "FeatureCollection" {
        return Err(IoError::InvalidVectorData(format!(
            "{} is not a FeatureCollection",
            path.display()
        )));
    }

    let name = root["name"].as_str().unwrap_or("layer");
    let crs = root["crs"]["properties"]["name"]
        .as_str()
        .map(Crs::from_ogc_urn);

    let features = root["features"].as_array().cloned().unwrap_or_default();
    let mut layer = Layer::new(name);

    let Some(first) = features.first() else {
        return Ok((layer, crs));
    };
    let names = match first["properties"].as_object() {
        Some(properties) => properties
            .iter()
            .filter_map(|(key, value)| {
                let value = field_value(value)?;
                layer.add_field(Field::new(key.clone(), value.field_type()));
                Some(key.clone())
            })
            .collect::<Vec<_>>(),
        None => Vec::new(),
    };

    for feature in &features {
        let attributes = names
            .iter()
            .zip(layer.fields().to_vec())
            .map(|(key, field)| {
                match (field_value(&feature["properties"][key]), field.field_type) {
                    (Some(FieldValue::Integer(i)), FieldType::Real) => Ok(FieldValue::Real(i as f64)),
                    (Some(value), _) => Ok(value),
                    (None, _) => Err(IoError::InvalidVectorData(format!(
                        "feature without property '{key}'"
                    ))),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        layer.push_feature(outer_ring(&feature["geometry"])?, attributes)?;
    }

    Ok((layer, crs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_and_read_footprints() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("footprint.geojson");

        let mut layer = Layer::new("footprint");
        layer.add_field(Field::new("name", FieldType::String));
        layer.push_feature(
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 5.0], [0.0, 5.0]],
            vec![FieldValue::String("IMG_0001".into())],
        )?;
        layer.push_feature(
            vec![[5.0, 0.0], [15.0, 0.0], [15.0, 5.0], [5.0, 5.0]],
            vec![FieldValue::String("IMG_0002".into())],
        )?;

        let mut writer = GeoJsonWriter::new(&path);
        writer.open()?;
        writer.create()?;
        writer.set_crs(&Crs::from_epsg(25830));
        writer.write(&layer)?;
        assert!(writer.write(&layer).is_err());
        writer.close()?;

        let text = fs::read_to_string(&path)?;
        assert!(text.contains("urn:ogc:def:crs:EPSG::25830"));

        let (back, crs) = read_layer(&path)?;
        assert_eq!(crs, Some(Crs::from_epsg(25830)));
        assert_eq!(back, layer);
        Ok(())
    }

    #[test]
    fn ring_is_closed_on_disk() {
        let mut layer = Layer::new("l");
        layer
            .push_feature(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]], vec![])
            .ok();
        let json = layer_to_json(&layer, None);
        let ring = &json["features"][0]["geometry"]["coordinates"][0];
        assert_eq!(ring.as_array().map(Vec::len), Some(4));
        assert_eq!(ring[0], ring[3]);
        assert!(json.get("crs").is_none());
    }

    #[test]
    fn write_requires_create() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let mut writer = GeoJsonWriter::new(tmp_dir.path().join("f.geojson"));
        writer.open()?;
        assert!(matches!(
            writer.write(&Layer::new("l")),
            Err(IoError::NotCreated(_))
        ));
        Ok(())
    }

    #[test]
    fn reject_points() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("points.geojson");
        fs::write(
            &path,
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[1,2]}}]}"#,
        )?;
        assert!(matches!(read_layer(&path), Err(IoError::InvalidVectorData(_))));
        Ok(())
    }
}
