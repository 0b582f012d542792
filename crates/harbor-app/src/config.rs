//! TOML configuration.
//!
//! Every field has a serde default, so a partial (or missing) config file
//! never fails the load; parse errors are logged and fall back to defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use harbor_common::ConfigError;
use harbor_sessions::RegistryOptions;

fn default_save_debounce_ms() -> u64 {
    70
}

fn default_reload_attempt_cap() -> u32 {
    3
}

fn default_reload_delay_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct HarborConfig {
    /// Directory for the persisted state snapshot. Defaults to the
    /// platform data dir.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    /// Quiet period between a state change and the snapshot write.
    #[serde(default = "default_save_debounce_ms")]
    pub save_debounce_ms: u64,

    /// Automatic reloads after a main-frame load failure.
    #[serde(default = "default_reload_attempt_cap")]
    pub reload_attempt_cap: u32,

    /// Countdown between a load failure and the automatic reload.
    #[serde(default = "default_reload_delay_secs")]
    pub reload_delay_secs: u64,
}

impl Default for HarborConfig {
    fn default() -> Self {
        Self {
            state_dir: None,
            save_debounce_ms: default_save_debounce_ms(),
            reload_attempt_cap: default_reload_attempt_cap(),
            reload_delay_secs: default_reload_delay_secs(),
        }
    }
}

impl HarborConfig {
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            reload_attempt_cap: self.reload_attempt_cap,
            reload_delay: Duration::from_secs(self.reload_delay_secs),
        }
    }

    /// Where the snapshot lives, honoring the config override.
    pub fn state_path(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(default_state_dir)
            .join("state.json")
    }
}

/// `~/.config/harbor/config.toml` (or the platform equivalent).
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("harbor")
        .join("config.toml")
}

fn default_state_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("harbor")
}

/// Load config from a specific TOML file path.
pub fn load_from_path(path: &Path) -> Result<HarborConfig, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|_| ConfigError::FileNotFound(path.to_path_buf()))?;
    let config: HarborConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;
    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load from the given path (or the default location), falling back to
/// defaults on any failure.
pub fn load_or_default(path: Option<&Path>) -> HarborConfig {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path);

    match load_from_path(&path) {
        Ok(config) => config,
        Err(ConfigError::FileNotFound(_)) => {
            info!("no config at {}, using defaults", path.display());
            HarborConfig::default()
        }
        Err(e) => {
            warn!("config load failed, using defaults: {e}");
            HarborConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config: HarborConfig = toml::from_str("").unwrap();
        assert_eq!(config.save_debounce_ms, 70);
        assert_eq!(config.reload_attempt_cap, 3);
        assert_eq!(config.reload_delay_secs, 5);
        assert!(config.state_dir.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: HarborConfig = toml::from_str("reload_attempt_cap = 7").unwrap();
        assert_eq!(config.reload_attempt_cap, 7);
        assert_eq!(config.save_debounce_ms, 70);
    }

    #[test]
    fn state_dir_override_controls_the_snapshot_path() {
        let config: HarborConfig = toml::from_str("state_dir = \"/tmp/harbor-test\"").unwrap();
        assert_eq!(
            config.state_path(),
            PathBuf::from("/tmp/harbor-test/state.json")
        );
    }

    #[test]
    fn load_from_missing_path_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from_path(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "reload_attempt_cap = \"many\"").unwrap();
        let config = load_or_default(Some(&path));
        assert_eq!(config.reload_attempt_cap, 3);
    }

    #[test]
    fn registry_options_reflect_the_config() {
        let config: HarborConfig =
            toml::from_str("reload_attempt_cap = 2\nreload_delay_secs = 9").unwrap();
        let options = config.registry_options();
        assert_eq!(options.reload_attempt_cap, 2);
        assert_eq!(options.reload_delay, Duration::from_secs(9));
    }
}
