//! Configuration system
//!
//! Configuration files are TOML (`.toml`) or RON (`.ron`), chosen by file
//! extension. Invalid values are never fatal: [`CoreConfig::validate`] clamps
//! them to defaults and logs a warning.

pub use serde::{Deserialize, Serialize};

use crate::foundation::math::Rect;
use crate::spatial::SpatialConfig;
use std::path::Path;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            ConfigFormat::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Supported on-disk formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Ron,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// World construction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Initial scene name tag
    pub scene_name: String,
    /// Bounds handed to the spatial index
    pub world_bounds: Rect,
    /// Spatial index to build, if any
    pub spatial: Option<SpatialConfig>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            scene_name: String::from("default"),
            world_bounds: Rect::default(),
            spatial: Some(SpatialConfig::default()),
        }
    }
}

/// Event bus settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Log every dispatched event at debug level
    pub log_dispatch: bool,
}

/// Top-level configuration for the core
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// World settings
    pub world: WorldConfig,
    /// Event bus settings
    pub events: EventConfig,
}

impl Config for CoreConfig {}

impl CoreConfig {
    /// Clamp invalid values to defaults, logging each correction
    pub fn validate(&mut self) {
        let bounds = self.world.world_bounds;
        if !(bounds.width() > 0.0 && bounds.height() > 0.0) {
            log::warn!("[Config] Degenerate world bounds {bounds:?}, using default");
            self.world.world_bounds = Rect::default();
        }
        if let Some(spatial) = self.world.spatial.as_mut() {
            spatial.validate();
        }
    }
}
