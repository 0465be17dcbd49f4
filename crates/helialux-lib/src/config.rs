//! Application configuration — TOML-based, platform-aware paths.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HelialuxError, Result};
use crate::protocol::MAX_OVERRIDE_MINUTES;

/// First lines of a file written by [`Config::save_to`].
const CONFIG_HEADER: &str = "# HeliaLux device settings, written by `helialux-cli config --save`.\n\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Accessory name shown to the controller. Default: "HeliaLux".
    #[serde(default = "default_name")]
    pub name: String,

    /// Device host name or IP address. Empty = not configured.
    #[serde(default)]
    pub host: String,

    /// Device HTTP port. Default: 80.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request timeout in milliseconds. Default: 1000.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Cached state is re-queried once older than this (milliseconds). Default: 5000.
    #[serde(default = "default_freshness_window_ms")]
    pub freshness_window_ms: u64,

    /// Manual override requested before each write, in minutes. Default: 60.
    #[serde(default = "default_override_minutes")]
    pub override_minutes: u64,

    /// Expose hue and saturation in addition to power and brightness.
    #[serde(default)]
    pub color_mode: bool,
}

fn default_name() -> String {
    "HeliaLux".into()
}
fn default_port() -> u16 {
    80
}
fn default_request_timeout_ms() -> u64 {
    1000
}
fn default_freshness_window_ms() -> u64 {
    5000
}
fn default_override_minutes() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Config {
            name: default_name(),
            host: String::new(),
            port: default_port(),
            request_timeout_ms: default_request_timeout_ms(),
            freshness_window_ms: default_freshness_window_ms(),
            override_minutes: default_override_minutes(),
            color_mode: false,
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The `host` field is empty or whitespace-only.
    EmptyHost,
    /// The `port` field is 0.
    InvalidPort,
    /// The `request_timeout_ms` field is 0.
    ZeroTimeout,
    /// The `override_minutes` field cannot be expressed as the device's `HH:MM`.
    InvalidOverride(u64),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyHost => write!(f, "Device host cannot be empty"),
            ValidationError::InvalidPort => write!(f, "Device port cannot be 0"),
            ValidationError::ZeroTimeout => write!(f, "Request timeout must be at least 1 ms"),
            ValidationError::InvalidOverride(m) => write!(
                f,
                "Invalid override_minutes: {m} (must be 1..={MAX_OVERRIDE_MINUTES})"
            ),
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("helialux"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Load config from disk, or return defaults if not found.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Persist to `path` through a sibling `.toml.tmp` file and a rename, so
    /// a reader never sees a half-written config. Refuses invalid settings.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Err(errors) = self.validate() {
            let problems: Vec<String> = errors.iter().map(ToString::to_string).collect();
            return Err(HelialuxError::Config(format!(
                "refusing to save invalid config: {}",
                problems.join("; ")
            )));
        }
        let body = toml::to_string_pretty(self)
            .map_err(|e| HelialuxError::Config(format!("cannot serialize config: {e}")))?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, format!("{CONFIG_HEADER}{body}"))?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        log::info!("saved config to {}", path.display());
        Ok(())
    }

    /// Load config from an arbitrary path, returning the config and any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.host.trim().is_empty() {
            errors.push(ValidationError::EmptyHost);
        }
        if self.port == 0 {
            errors.push(ValidationError::InvalidPort);
        }
        if self.request_timeout_ms == 0 {
            errors.push(ValidationError::ZeroTimeout);
        }
        if self.override_minutes == 0 || self.override_minutes > MAX_OVERRIDE_MINUTES {
            errors.push(ValidationError::InvalidOverride(self.override_minutes));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
