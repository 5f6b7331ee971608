use std::path::Path;

use ortho_geometry::{polygon, Window};
use ortho_io::{geojson, Layer};

use crate::error::RectifyError;

/// A photo whose footprint contains a terrain point.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoCandidate {
    /// The name of the photo.
    pub name: String,
    /// Distance from the point to the centre of the footprint bounding box.
    pub distance: f64,
    /// The footprint polygon.
    pub polygon: Vec<[f64; 2]>,
}

/// Find the photos that see a terrain point.
///
/// Photos are ranked by the distance between the point and the centre of
/// their footprint bounding box, closest first, so the photo that sees the
/// point nearest to its middle comes first.
///
/// # Arguments
///
/// * `layer` - The footprint layer.
/// * `name_field` - The attribute holding the photo name.
/// * `point` - The terrain point.
/// * `best` - Keep at most this many photos; all of them when `None`.
///
/// # Errors
///
/// Returns [`RectifyError::Data`] if the layer has no text field named `name_field`.
pub fn photos_containing_point(
    layer: &Layer,
    name_field: &str,
    point: [f64; 2],
    best: Option<usize>,
) -> Result<Vec<PhotoCandidate>, RectifyError> {
    let index = layer.field_index(name_field).ok_or_else(|| {
        RectifyError::Data(format!(
            "layer '{}' has no field '{name_field}'",
            layer.name()
        ))
    })?;

    let mut candidates = Vec::new();
    for feature in layer.features() {
        if !polygon::contains_point(&feature.polygon, point) {
            continue;
        }
        let name = feature.attributes[index].as_str().ok_or_else(|| {
            RectifyError::Data(format!("field '{name_field}' does not hold text"))
        })?;
        let Some(bbox) = Window::from_points(feature.polygon.iter().copied()) else {
            continue;
        };
        let [cx, cy] = bbox.center();
        candidates.push(PhotoCandidate {
            name: name.to_string(),
            distance: (point[0] - cx).hypot(point[1] - cy),
            polygon: feature.polygon.clone(),
        });
    }

    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    if let Some(best) = best {
        candidates.truncate(best);
    }
    log::debug!(
        "{} photos see ({:.3}, {:.3})",
        candidates.len(),
        point[0],
        point[1]
    );
    Ok(candidates)
}

/// Find the photos that see a terrain point in a GeoJSON footprint file.
///
/// See [`photos_containing_point`].
pub fn select_photos(
    footprint_path: impl AsRef<Path>,
    name_field: &str,
    point: [f64; 2],
    best: Option<usize>,
) -> Result<Vec<PhotoCandidate>, RectifyError> {
    let path = footprint_path.as_ref();
    let (layer, _) =
        geojson::read_layer(path).map_err(|e| RectifyError::resource(path.display(), e))?;
    photos_containing_point(&layer, name_field, point, best)
}
