//! Editor settings used by the tools.

use crate::snap::{GRID_SIZE, SnapMode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Grid, snapping and interaction settings.
///
/// Distances in diagram units unless noted otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub grid_size: f64,
    /// Reach of grid and point snapping.
    pub snap_distance: f64,
    pub snap_to_grid: bool,
    pub snap_to_points: bool,
    /// Pointer travel before a press becomes a drag, in screen pixels.
    pub min_drag_distance: f64,
    /// Grab radius of control points, in screen pixels.
    pub handle_radius: f64,
    /// Double-click on a rotate handle rotates by 90 degrees.
    pub quick_rotate: bool,
    /// Rotation snapping step in tenths of a degree.
    pub rotate_snap_step: i32,
    /// Arrow-key nudge distance with Alt held.
    pub nudge_distance: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            snap_distance: 5.0,
            snap_to_grid: true,
            snap_to_points: true,
            min_drag_distance: 4.0,
            handle_radius: 8.0,
            quick_rotate: true,
            rotate_snap_step: 150,
            nudge_distance: 1.0,
        }
    }
}

impl EditorConfig {
    pub fn snap_mode(&self) -> SnapMode {
        SnapMode::from_flags(self.snap_to_grid, self.snap_to_points)
    }

    /// Parse and validate settings from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialization(e.to_string()))
    }

    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded editor settings from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        fn invalid(field: &'static str, reason: &str) -> ConfigResult<()> {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        }
        if !(self.grid_size > 0.0) {
            return invalid("grid_size", "must be positive");
        }
        if !(self.snap_distance >= 0.0) {
            return invalid("snap_distance", "must not be negative");
        }
        if !(self.min_drag_distance >= 0.0) {
            return invalid("min_drag_distance", "must not be negative");
        }
        if !(self.handle_radius > 0.0) {
            return invalid("handle_radius", "must be positive");
        }
        if self.rotate_snap_step <= 0 {
            return invalid("rotate_snap_step", "must be positive");
        }
        if !(self.nudge_distance > 0.0) {
            return invalid("nudge_distance", "must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EditorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.snap_mode(), SnapMode::All);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EditorConfig::from_json(r#"{ "grid_size": 10.0, "snap_to_points": false }"#).unwrap();
        assert!((config.grid_size - 10.0).abs() < f64::EPSILON);
        assert!((config.snap_distance - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.snap_mode(), SnapMode::Grid);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EditorConfig::from_json(r#"{ "grid_size": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "grid_size", .. }));
        let err = EditorConfig::from_json(r#"{ "snap_distance": -1.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "snap_distance", .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = EditorConfig::from_json("{ grid_size: ").unwrap_err();
        assert!(matches!(err, ConfigError::Serialization(_)));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = EditorConfig {
            quick_rotate: false,
            ..EditorConfig::default()
        };
        let restored = EditorConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = EditorConfig::load("/nonexistent/connectink.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
