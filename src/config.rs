//! Input settings
//!
//! Read from `<config_dir>/padplex/settings.toml`. Every field is optional;
//! a missing file gives the defaults, an unreadable one logs a warning and
//! gives the defaults too.
//!
//! ```toml
//! joystick_deadzone = 16384
//! monitor_interval_ms = 250
//! registry_capacity = 8
//! max_joysticks = 8
//! layout_fire_threshold = 5
//! alternate_families = ["cps1", "cps2", "cps3"]
//! config_dirs = ["/etc/padplex/joy"]
//! exit_key = "FBK_F12"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::device::MonitorSettings;
use crate::input::keys::{find_key, fbk};
use crate::input::state::JOYSTICK_DEADZONE;
use crate::input::PollingSettings;
use crate::layout::heuristic::{HardwareFamily, DEFAULT_FIRE_THRESHOLD};
use crate::layout::ResolverSettings;

const APP_DIR: &str = "padplex";
const SETTINGS_FILE: &str = "settings.toml";
const DEFAULT_LOG_DIRECTIVES: &str = "info";

/// Log filter from `RUST_LOG`-style directives, `info` when absent or invalid
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVES))
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InputSettings {
    pub joystick_deadzone: i32,
    pub monitor_interval_ms: u64,
    pub registry_capacity: usize,
    pub max_joysticks: usize,
    pub layout_fire_threshold: usize,
    pub alternate_families: Vec<HardwareFamily>,
    /// Directories searched for `.joy` files; empty means the defaults
    pub config_dirs: Vec<PathBuf>,
    /// FBK key name that requests exit
    pub exit_key: String,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            joystick_deadzone: JOYSTICK_DEADZONE,
            monitor_interval_ms: 250,
            registry_capacity: 8,
            max_joysticks: 8,
            layout_fire_threshold: DEFAULT_FIRE_THRESHOLD,
            alternate_families: HardwareFamily::default_alternates(),
            config_dirs: Vec::new(),
            exit_key: "FBK_F12".to_string(),
        }
    }
}

impl InputSettings {
    /// `<config_dir>/padplex/settings.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Loads the default settings file, falling back to defaults
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            debug!("No config directory on this platform, using default settings");
            return Self::default();
        };
        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => {
                info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                warn!("Ignoring settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.joystick_deadzone < 0 {
            return Err(SettingsError::Invalid(format!(
                "joystick_deadzone must not be negative, got {}",
                self.joystick_deadzone
            )));
        }
        if self.monitor_interval_ms == 0 {
            return Err(SettingsError::Invalid(
                "monitor_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.registry_capacity == 0 {
            return Err(SettingsError::Invalid(
                "registry_capacity must be at least 1".to_string(),
            ));
        }
        if find_key(&self.exit_key).is_none() {
            return Err(SettingsError::Invalid(format!(
                "unknown exit_key '{}'",
                self.exit_key
            )));
        }
        Ok(())
    }

    /// Configured `.joy` directories, or the working directory followed by
    /// `<config_dir>/padplex/joy`
    pub fn joy_config_dirs(&self) -> Vec<PathBuf> {
        if !self.config_dirs.is_empty() {
            return self.config_dirs.clone();
        }
        let mut dirs = vec![PathBuf::from(".")];
        if let Some(config) = dirs::config_dir() {
            dirs.push(config.join(APP_DIR).join("joy"));
        }
        dirs
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            poll_interval: Duration::from_millis(self.monitor_interval_ms),
            registry_capacity: self.registry_capacity,
            ..MonitorSettings::default()
        }
    }

    pub fn polling_settings(&self) -> PollingSettings {
        PollingSettings {
            deadzone: self.joystick_deadzone,
            max_joysticks: self.max_joysticks,
            exit_key: find_key(&self.exit_key).unwrap_or(fbk::F12),
            ..PollingSettings::default()
        }
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            config_dirs: self.joy_config_dirs(),
            fire_threshold: self.layout_fire_threshold,
            families: self.alternate_families.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn log_filter_honors_directives() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(
            log_filter(Some("padplex=debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(log_filter(Some("warn")).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(
            log_filter(Some("padplex=notalevel")).max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(InputSettings::from_toml_str("").unwrap(), InputSettings::default());
    }

    #[test]
    fn partial_file_overrides_fields() {
        let settings = InputSettings::from_toml_str(
            "monitor_interval_ms = 50\nalternate_families = [\"neogeo\"]\nexit_key = \"FBK_ESCAPE\"\n",
        )
        .unwrap();
        assert_eq!(settings.monitor_settings().poll_interval, Duration::from_millis(50));
        assert_eq!(settings.alternate_families, vec![HardwareFamily::Neogeo]);
        assert_eq!(settings.polling_settings().exit_key, fbk::ESCAPE);
        assert_eq!(settings.registry_capacity, 8);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            InputSettings::from_toml_str("exit_key = \"FBK_NOPE\""),
            Err(SettingsError::Invalid(_))
        ));
        assert!(matches!(
            InputSettings::from_toml_str("registry_capacity = 0"),
            Err(SettingsError::Invalid(_))
        ));
        assert!(matches!(
            InputSettings::from_toml_str("registry_capacity = \"many\""),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");
        let settings = InputSettings {
            config_dirs: vec![dir.path().to_path_buf()],
            layout_fire_threshold: 6,
            ..Default::default()
        };
        settings.save_to(&path).unwrap();
        let loaded = InputSettings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.joy_config_dirs(), vec![dir.path().to_path_buf()]);
        assert_eq!(loaded.resolver_settings().fire_threshold, 6);
    }
}
