//! CLI subcommands — light status, power/brightness/color writes, polling, simulator.

mod config_cmd;
mod set;
mod simulate;
mod status;
mod watch;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use helialux_lib::HelialuxError;
pub(super) use helialux_lib::color::{self, Hsl};
pub(super) use helialux_lib::config::Config;
pub(super) use helialux_lib::device::HttpDevice;
pub(super) use helialux_lib::error::Result;
pub(super) use helialux_lib::light::Light;
pub(super) use helialux_lib::sim::StatusFormat;
pub(super) use helialux_lib::state::{Channels, LightState};

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| HelialuxError::Config(format!("JSON serialization failed: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Power label used across commands.
pub(super) fn power_label(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

// ── global options ──

/// Flags shared by every subcommand.
pub struct GlobalOpts {
    pub json: bool,
    pub config: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Load config from `path`, or from the platform default when `None`.
/// Parse problems are logged and defaults are used.
pub(super) fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(p) => {
            let (config, warnings) = Config::load_from(p);
            for w in &warnings {
                log::warn!("{w}");
            }
            config
        }
        None => Config::load(),
    }
}

/// Config file contents with `--host` / `--port` applied.
pub(super) fn effective_config(opts: &GlobalOpts) -> Config {
    let mut config = load_config(opts.config.as_deref());
    if let Some(host) = &opts.host {
        config.host = host.clone();
    }
    if let Some(port) = opts.port {
        config.port = port;
    }
    config
}

/// Validate the effective config and connect to the light it names.
pub(super) fn open_light(config: &Config) -> Result<Light<HttpDevice>> {
    if let Err(errors) = config.validate() {
        let msg = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(HelialuxError::Config(msg));
    }
    log::debug!("connecting to {}:{}", config.host, config.port);
    Light::from_config(config)
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct StatusOutput {
    pub version: String,
    pub device: String,
    pub on: bool,
    pub brightness: u8,
    pub channels: Channels,
    pub color: String,
    pub hsl: Option<Hsl>,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
}

#[derive(Serialize)]
pub(super) struct WatchEvent {
    pub elapsed_ms: u64,
    pub on: bool,
    pub channels: Channels,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the light's current state
    Status,

    /// Switch the light on (all channels to full)
    On,

    /// Switch the light off (all channels dark)
    Off,

    /// Set brightness, scaling all channels (0-100)
    Brightness {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        level: u8,
    },

    /// Write raw channel values; unspecified channels keep their current value
    Channels {
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        white: Option<u8>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        blue: Option<u8>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        green: Option<u8>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        red: Option<u8>,
    },

    /// Set the color channels from a hex code or name, keeping white
    Color {
        /// `#RRGGBB`, `RRGGBB`, or a name such as `blue`
        color: String,
    },

    /// Set the color channels from hue/saturation/lightness, keeping white
    Hsl {
        /// Hue in degrees (0-360)
        #[arg(long, value_parser = clap::value_parser!(u16).range(0..=360))]
        hue: Option<u16>,
        /// Saturation in percent (0-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        saturation: Option<u8>,
        /// Lightness in percent (0-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        lightness: Option<u8>,
    },

    /// Poll the light and print changes until Ctrl+C
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },

    /// Show current configuration and file path
    Config {
        /// Write the effective settings (including --host/--port) to the config file
        #[arg(long)]
        save: bool,
    },

    /// Run a simulated SmartControl device until Ctrl+C
    Simulate {
        /// Port to listen on (0 picks a free port)
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Status encoding to serve: json or flat
        #[arg(long, default_value_t = StatusFormat::Json)]
        format: StatusFormat,
    },
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, opts: &GlobalOpts) -> Result<()> {
    match cmd {
        Command::Status => status::cmd_status(opts),
        Command::On => set::cmd_power(opts, true),
        Command::Off => set::cmd_power(opts, false),
        Command::Brightness { level } => set::cmd_brightness(opts, level),
        Command::Channels {
            white,
            blue,
            green,
            red,
        } => set::cmd_channels(opts, [white, blue, green, red]),
        Command::Color { color } => set::cmd_color(opts, &color),
        Command::Hsl {
            hue,
            saturation,
            lightness,
        } => set::cmd_hsl(opts, hue, saturation, lightness),
        Command::Watch { interval_ms } => watch::cmd_watch(opts, interval_ms),
        Command::Config { save } => config_cmd::cmd_config(opts, save),
        Command::Simulate { port, format } => {
            if opts.json {
                warn_json_unsupported("simulate");
            }
            simulate::cmd_simulate(port, format)
        }
    }
}

#[cfg(test)]
mod format_tests {
    use super::*;

    #[test]
    fn kv_width_top_only() {
        let w = kv_width(&["Short:", "Longer key:"], &[]);
        // "Longer key:" = 11 + PADDING = 13
        assert_eq!(w, 13);
    }

    #[test]
    fn kv_width_indent_drives_width() {
        let w = kv_width(&["A:"], &["Saturation:"]);
        // "Saturation:" = 11 + PADDING + 2 = 15
        assert_eq!(w, 15);
    }

    #[test]
    fn values_align_across_levels() {
        let w = kv_width(&["Power:"], &["White:"]);
        let top = format_kv("Power:", "V", w);
        let indent = format!("  {:<width$}{}", "White:", "V", width = w - 2);
        assert_eq!(top.find('V'), indent.find('V'));
    }

    #[test]
    fn format_kv_overlong_key_not_padded() {
        assert_eq!(format_kv("ExactWidth:", "val", 10), "ExactWidth:val");
    }

    #[test]
    fn kv_width_empty_both() {
        assert_eq!(kv_width(&[], &[]), 0);
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    fn opts(config: Option<PathBuf>) -> GlobalOpts {
        GlobalOpts {
            json: false,
            config,
            host: None,
            port: None,
        }
    }

    #[test]
    fn overrides_apply_on_top_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "host = \"10.0.0.2\"\nport = 81\ncolor_mode = true\n").unwrap();

        let mut o = opts(Some(path));
        assert_eq!(effective_config(&o).host, "10.0.0.2");

        o.host = Some("aquarium.local".into());
        o.port = Some(8080);
        let c = effective_config(&o);
        assert_eq!(c.host, "aquarium.local");
        assert_eq!(c.port, 8080);
        assert!(c.color_mode);
    }

    #[test]
    fn missing_config_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = load_config(Some(&dir.path().join("absent.toml")));
        assert_eq!(c, Config::default());
    }

    #[test]
    fn open_light_rejects_unconfigured_host() {
        let err = open_light(&Config::default()).err().unwrap();
        assert!(err.to_string().contains("host cannot be empty"), "got {err}");
    }
}
