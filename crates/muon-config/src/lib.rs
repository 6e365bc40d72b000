//! Configuration for the Muon panel.
//!
//! TOML file + `MUON_`-prefixed environment variables, resolved through
//! figment and translated to `muon_core::PanelConfig`. The file is
//! optional — a fresh install runs entirely on defaults.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use muon_core::PanelConfig;
use muon_core::config::{DEFAULT_BRIDGE_URL, DEFAULT_DEVICE_POLL_MS, DEFAULT_INSTALL_SETTLE_MS};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config struct ──────────────────────────────────────────────

/// On-disk configuration. Every field has a default, so the struct also
/// doubles as the figment defaults provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Backend bridge root URL.
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Device list poll interval in milliseconds, applied while the
    /// hotspot is running.
    #[serde(default = "default_device_poll_ms")]
    pub device_poll_ms: u64,

    /// Delay between a successful dependency install and the re-check,
    /// in milliseconds.
    #[serde(default = "default_install_settle_ms")]
    pub install_settle_ms: u64,

    /// Log filter directive, e.g. "info" or "muon=debug".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bridge_url: default_bridge_url(),
            timeout: default_timeout(),
            device_poll_ms: default_device_poll_ms(),
            install_settle_ms: default_install_settle_ms(),
            log_level: default_log_level(),
        }
    }
}

fn default_bridge_url() -> String {
    DEFAULT_BRIDGE_URL.into()
}
fn default_timeout() -> u64 {
    10
}
fn default_device_poll_ms() -> u64 {
    DEFAULT_DEVICE_POLL_MS
}
fn default_install_settle_ms() -> u64 {
    DEFAULT_INSTALL_SETTLE_MS
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Translate into the panel's runtime configuration.
    pub fn to_panel_config(&self) -> Result<PanelConfig, ConfigError> {
        let bridge_url: url::Url =
            self.bridge_url
                .parse()
                .map_err(|_| ConfigError::Validation {
                    field: "bridge_url".into(),
                    reason: format!("invalid URL: {}", self.bridge_url),
                })?;

        if self.device_poll_ms == 0 {
            return Err(ConfigError::Validation {
                field: "device_poll_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }

        Ok(PanelConfig {
            bridge_url,
            request_timeout: Duration::from_secs(self.timeout),
            device_poll_interval: Duration::from_millis(self.device_poll_ms),
            install_settle_delay: Duration::from_millis(self.install_settle_ms),
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "muon-deck", "muon").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("muon");
    p
}

/// Directory for log files, beside the config.
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("com", "muon-deck", "muon").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("logs");
            p
        },
        |dirs| dirs.data_dir().join("logs"),
    )
}

// ── Config loading / saving ─────────────────────────────────────────

/// Load configuration from defaults + file + environment, in that
/// precedence order (env wins).
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Same as [`load_config`] but with an explicit file path (tests, the
/// `--config` flag).
pub fn load_config_from(path: &std::path::Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MUON_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Serialize config to TOML and write it to the canonical path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_translate_to_panel_config() {
        let panel = Config::default().to_panel_config().unwrap();
        assert_eq!(panel.bridge_url.as_str(), DEFAULT_BRIDGE_URL);
        assert_eq!(panel.device_poll_interval, Duration::from_millis(5000));
        assert_eq!(panel.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn bad_bridge_url_is_rejected() {
        let config = Config {
            bridge_url: "not a url".into(),
            ..Config::default()
        };
        assert!(matches!(
            config.to_panel_config(),
            Err(ConfigError::Validation { field, .. }) if field == "bridge_url"
        ));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config = Config {
            device_poll_ms: 0,
            ..Config::default()
        };
        assert!(config.to_panel_config().is_err());
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "device_poll_ms = 2500\nlog_level = \"debug\"\n").unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.device_poll_ms, 2500);
        assert_eq!(config.log_level, "debug");
        // Untouched fields keep their defaults.
        assert_eq!(config.bridge_url, DEFAULT_BRIDGE_URL);
    }
}
