use std::path::Path;

use ortho_io::{Crs, IoError};
use serde::{Deserialize, Serialize};

use crate::error::RectifyError;

/// Settings of the rectification pipelines.
///
/// Every field has a default, so a JSON file only needs the fields it changes.
///
/// # Examples
///
/// ```
/// use ortho_rectify::RectifyConfig;
///
/// let config: RectifyConfig = serde_json::from_str(r#"{ "dtm_nodata": null }"#).unwrap();
/// assert_eq!(config.dtm_nodata, None);
/// assert_eq!(config.max_iterations, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyConfig {
    /// CRS identifier stored in the outputs.
    pub crs: String,
    /// Output pixel size in terrain units; estimated per photo when unset.
    pub ground_sample_distance: Option<f64>,
    /// Maximum number of elevation refinements per footprint corner.
    pub max_iterations: usize,
    /// Elevation change under which a footprint corner is converged.
    pub elevation_tolerance: f64,
    /// Elevation treated as missing when the terrain file declares none.
    pub dtm_nodata: Option<f64>,
    /// Name of the footprint layer.
    pub layer_name: String,
    /// Name of the attribute holding the photo name.
    pub name_field: String,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self {
            crs: "EPSG:25830".to_string(),
            ground_sample_distance: None,
            max_iterations: 10,
            elevation_tolerance: 0.1,
            dtm_nodata: Some(0.0),
            layer_name: "footprint".to_string(),
            name_field: "name".to_string(),
        }
    }
}

impl RectifyConfig {
    /// Load the configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RectifyError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IoError::FileDoesNotExist(path.to_path_buf()).into());
        }
        let text = std::fs::read_to_string(path).map_err(IoError::from)?;
        let config: Self = serde_json::from_str(&text).map_err(IoError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values are usable.
    pub fn validate(&self) -> Result<(), RectifyError> {
        if let Some(gsd) = self.ground_sample_distance {
            if !(gsd > 0.0 && gsd.is_finite()) {
                return Err(RectifyError::Config(format!(
                    "ground_sample_distance must be positive, got {gsd}"
                )));
            }
        }
        if self.max_iterations == 0 {
            return Err(RectifyError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.elevation_tolerance >= 0.0) {
            return Err(RectifyError::Config(format!(
                "elevation_tolerance must not be negative, got {}",
                self.elevation_tolerance
            )));
        }
        if self.name_field.is_empty() {
            return Err(RectifyError::Config("name_field is empty".to_string()));
        }
        Ok(())
    }

    /// The output CRS.
    pub fn crs(&self) -> Crs {
        Crs::new(self.crs.as_str())
    }

    /// The nodata marker to use for a terrain model.
    ///
    /// The marker declared by the file wins over the configured one.
    pub fn resolve_nodata(&self, file_nodata: Option<f64>) -> Option<f64> {
        file_nodata.or(self.dtm_nodata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RectifyConfig::default();
        assert_eq!(config.crs().epsg_code(), Some(25830));
        assert_eq!(config.dtm_nodata, Some(0.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn nodata_resolution() {
        let config = RectifyConfig::default();
        assert_eq!(config.resolve_nodata(Some(-9999.0)), Some(-9999.0));
        assert_eq!(config.resolve_nodata(None), Some(0.0));

        let config = RectifyConfig {
            dtm_nodata: None,
            ..Default::default()
        };
        assert_eq!(config.resolve_nodata(None), None);
    }

    #[test]
    fn load_from_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "crs": "EPSG:4326", "ground_sample_distance": 0.5 }"#)?;
        let config = RectifyConfig::from_json_file(&path)?;
        assert_eq!(config.crs, "EPSG:4326");
        assert_eq!(config.ground_sample_distance, Some(0.5));
        assert_eq!(config.layer_name, "footprint");

        std::fs::write(&path, r#"{ "max_iterations": 0 }"#)?;
        assert!(matches!(
            RectifyConfig::from_json_file(&path),
            Err(RectifyError::Config(_))
        ));
        Ok(())
    }
}
