//! Editor configuration loaded from JSON

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::constants;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Layout metrics and completion vocabulary for the editor.
///
/// Every field is optional in the file; missing ones take their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub iolet_width: f32,
    pub iolet_height: f32,
    pub iolet_spacing: f32,
    pub char_width: f32,
    pub line_height: f32,
    pub hit_tolerance: f32,
    /// Class names offered while editing. Empty means every registered class.
    pub vocabulary: Vec<String>,
}

impl EditorConfig {
    pub fn new() -> Self {
        Self {
            iolet_width: constants::iolet::WIDTH,
            iolet_height: constants::iolet::HEIGHT,
            iolet_spacing: constants::iolet::SPACING,
            char_width: constants::text::CHAR_WIDTH,
            line_height: constants::text::LINE_HEIGHT,
            hit_tolerance: constants::interaction::CONNECTION_HIT_TOLERANCE,
            vocabulary: Vec::new(),
        }
    }

    /// `<config dir>/patchcanvas/editor.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(constants::CONFIG_DIR_NAME).join(constants::CONFIG_FILE_NAME))
    }

    pub fn from_json(json: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&contents, path)?;
        debug!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    /// Load from the default location, falling back to defaults when the
    /// file is absent or unreadable
    pub fn load_or_default() -> Self {
        let path = match Self::default_path() {
            Some(path) if path.exists() => path,
            _ => {
                info!("No editor config found, using defaults");
                return Self::default();
            }
        };

        match Self::load(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!("{}; using defaults", err);
                Self::default()
            }
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::new()
    }
}
