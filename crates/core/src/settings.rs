use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    CAMERA_IDEAL_HEIGHT, CAMERA_IDEAL_WIDTH, FACE_MODEL_URL, READY_DELAY_MS, RESULT_PAUSE_MS,
    TICK_INTERVAL_MS,
};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("settings I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted player preferences. Missing fields take their defaults so
/// older files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub confidence: f32,
    /// On-screen size for box placement; `None` uses the camera's size.
    pub display_size: Option<(u32, u32)>,
    pub model: String,
    pub font: Option<PathBuf>,
    pub camera_width: u32,
    pub camera_height: u32,
    pub tick_ms: u64,
    pub pause_ms: u64,
    pub ready_ms: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            confidence: 0.5,
            display_size: None,
            model: FACE_MODEL_URL.to_string(),
            font: None,
            camera_width: CAMERA_IDEAL_WIDTH,
            camera_height: CAMERA_IDEAL_HEIGHT,
            tick_ms: TICK_INTERVAL_MS,
            pause_ms: RESULT_PAUSE_MS,
            ready_ms: READY_DELAY_MS,
        }
    }
}

impl GameSettings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Headcount").join("settings.json"))
    }

    /// Loads from the user config directory, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(SettingsError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::config_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(io_err)
    }
}
