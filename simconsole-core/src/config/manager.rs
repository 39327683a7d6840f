//! Configuration manager for the state file
//!
//! This module provides the `ConfigManager`, which locates, loads and saves
//! the persisted state document.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

use super::state::PersistedState;

/// File name of the persisted state document
const STATE_FILE: &str = "state.toml";

/// Configuration manager for `SimConsole`
///
/// State is stored in `~/.config/simconsole/` by default.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// Base directory for configuration files
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a new `ConfigManager` with the default configuration directory
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration directory cannot be determined.
    pub fn new() -> ConfigResult<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound(PathBuf::from("~/.config")))?
            .join("simconsole");
        Ok(Self { config_dir })
    }

    /// Creates a new `ConfigManager` with a custom configuration directory
    #[must_use]
    pub const fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Returns the configuration directory path
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Returns the path of the state document
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.config_dir.join(STATE_FILE)
    }

    /// Ensures the configuration directory exists
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_config_dir(&self) -> ConfigResult<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir).map_err(|e| {
                ConfigError::Write(format!(
                    "Failed to create config directory {}: {}",
                    self.config_dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Loads the persisted state
    ///
    /// Never fails: a missing, unreadable or unparsable document yields the
    /// default state, and malformed values fall back to their defaults.
    #[must_use]
    pub fn load_state(&self) -> PersistedState {
        let path = self.state_path();
        if !path.exists() {
            return PersistedState::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => PersistedState::from_toml(&content),
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}", path.display());
                PersistedState::default()
            }
        }
    }

    /// Replaces the persisted state with `state`
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized or written.
    pub fn save_state(&self, state: &PersistedState) -> ConfigResult<()> {
        self.ensure_config_dir()?;
        let path = self.state_path();
        let content = state.to_toml()?;
        fs::write(&path, content)
            .map_err(|e| ConfigError::Write(format!("Failed to write {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir");
        let manager = ConfigManager::with_config_dir(temp_dir.path().join("simconsole"));
        (manager, temp_dir)
    }

    #[test]
    fn test_ensure_config_dir() {
        let (manager, _temp) = create_test_manager();
        assert!(!manager.config_dir().exists());
        manager.ensure_config_dir().expect("created");
        assert!(manager.config_dir().exists());
    }

    #[test]
    fn test_load_missing_state_is_default() {
        let (manager, _temp) = create_test_manager();
        let state = manager.load_state();
        assert!(state.groups.is_empty());
        assert!(state.connections.is_empty());
        assert!(state.ui.black_on_white);
    }

    #[test]
    fn test_load_garbage_is_default() {
        let (manager, _temp) = create_test_manager();
        manager.ensure_config_dir().expect("created");
        fs::write(manager.state_path(), "this is = = not toml [[").expect("written");
        let state = manager.load_state();
        assert!(state.groups.is_empty());
        assert!(!state.ui.system_font);
    }

    #[test]
    fn test_save_replaces_previous_state() {
        let (manager, _temp) = create_test_manager();
        let mut state = PersistedState::default();
        state.ui.system_font = true;
        manager.save_state(&state).expect("saved");

        let state = PersistedState::default();
        manager.save_state(&state).expect("saved");
        assert!(!manager.load_state().ui.system_font);
    }
}
