//! `config.toml` and `state.toml` on disk.

use super::app_config::{APP_NAME, APP_ORGANIZATION, APP_QUALIFIER, AppConfig};
use super::state_config::StateConfig;
use crate::domain::entities::{MapRegion, PinId};
use directories::ProjectDirs;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const CONFIG_FILE_NAME: &str = "config.toml";
const STATE_FILE_NAME: &str = "state.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to determine config directory")]
    NoConfigDir,
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        source: toml::ser::Error,
    },
    #[error("map region {0:?} is not a valid view")]
    InvalidMapRegion(MapRegion),
}

/// Owns the user's settings file and the session state remembered between runs.
///
/// The settings file is only ever created with defaults; the state file is
/// rewritten whenever the session changes.
#[derive(Debug, Clone)]
pub struct StorageManager {
    config_path: PathBuf,
    state_path: PathBuf,
}

impl StorageManager {
    /// Uses the platform config directory, reading settings from
    /// `config_override` instead when given.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoConfigDir` if the platform has no config directory.
    pub fn new(config_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        let dir = ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::NoConfigDir)?;

        let mut storage = Self::with_dir(&dir);
        if let Some(path) = config_override {
            storage.config_path = path;
        }
        Ok(storage)
    }

    /// Keeps both files in `dir`.
    #[must_use]
    pub fn with_dir(dir: &Path) -> Self {
        Self {
            config_path: dir.join(CONFIG_FILE_NAME),
            state_path: dir.join(STATE_FILE_NAME),
        }
    }

    /// Settings file location.
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Loads the settings, writing a default file on first run.
    /// A malformed file is left untouched and defaults are used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or the defaults cannot be written.
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let Some(content) = read_optional(&self.config_path)? else {
            info!(path = %self.config_path.display(), "No config file, writing defaults");
            let config = AppConfig::default();
            write_toml(&self.config_path, &config)?;
            return Ok(config);
        };

        Ok(toml::from_str(&content).unwrap_or_else(|e| {
            warn!(
                path = %self.config_path.display(),
                error = %e,
                "Malformed config file, using defaults"
            );
            AppConfig::default()
        }))
    }

    /// Loads the session state. A missing or malformed file yields an empty
    /// session; an unusable map region is forgotten.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read.
    pub fn load_state(&self) -> Result<StateConfig, ConfigError> {
        let Some(content) = read_optional(&self.state_path)? else {
            return Ok(StateConfig::default());
        };

        let mut state: StateConfig = toml::from_str(&content).unwrap_or_else(|e| {
            warn!(
                path = %self.state_path.display(),
                error = %e,
                "Malformed state file, starting fresh"
            );
            StateConfig::default()
        });

        if let Some(region) = state.map_region.filter(|r| !r.is_valid()) {
            warn!(region = ?region, "Ignoring unusable saved map region");
            state.map_region = None;
        }
        Ok(state)
    }

    /// Remembers `pin` as the last opened pin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the state file cannot be read or written.
    pub fn remember_pin(&self, pin: PinId) -> Result<(), ConfigError> {
        self.update_state(|state| {
            let changed = state.last_pin != Some(pin);
            state.last_pin = Some(pin);
            changed
        })
    }

    /// Forgets `pin` if it is the remembered one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the state file cannot be read or written.
    pub fn forget_pin(&self, pin: PinId) -> Result<(), ConfigError> {
        self.update_state(|state| {
            let matches = state.last_pin == Some(pin);
            if matches {
                state.last_pin = None;
            }
            matches
        })
    }

    /// Stores the visible map region.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidMapRegion` for an unusable region, or an
    /// I/O error if the state file cannot be written.
    pub fn save_map_region(&self, region: MapRegion) -> Result<(), ConfigError> {
        if !region.is_valid() {
            return Err(ConfigError::InvalidMapRegion(region));
        }
        self.update_state(|state| {
            state.map_region = Some(region);
            true
        })
    }

    /// The saved map region, or the whole world.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the state file cannot be read.
    pub fn map_region(&self) -> Result<MapRegion, ConfigError> {
        Ok(self.load_state()?.map_region.unwrap_or_default())
    }

    /// Applies `change` to the stored state, writing it back when `change` reports a change.
    fn update_state(
        &self,
        change: impl FnOnce(&mut StateConfig) -> bool,
    ) -> Result<(), ConfigError> {
        let mut state = self.load_state()?;
        if change(&mut state) {
            write_toml(&self.state_path, &state)?;
            debug!(path = %self.state_path.display(), "Saved session state");
        }
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Replaces `path` atomically, creating its directory if needed.
fn write_toml<T: serde::Serialize>(path: &Path, data: &T) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(data).map_err(|source| ConfigError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(write_err)?;

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    file.write_all(content.as_bytes()).map_err(write_err)?;
    file.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
