//! `config` subcommand — show current configuration and file path.

use super::{
    Config, ConfigOutput, GlobalOpts, HelialuxError, Result, effective_config, kv, kv_indent,
    kv_width, print_json,
};

pub(super) fn cmd_config(opts: &GlobalOpts, save: bool) -> Result<()> {
    let config = effective_config(opts);
    let config_path = opts.config.clone().or_else(Config::path);

    if save {
        let path = config_path
            .as_deref()
            .ok_or_else(|| HelialuxError::Config("no config directory; pass --config".into()))?;
        config.save_to(path)?;
        if !opts.json {
            println!("Saved {}", path.display());
            println!();
        }
    }

    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());

    if opts.json {
        let output = ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings: config,
        };
        return print_json(&output);
    }

    // Human-readable output
    let w = kv_width(
        &["Config file:"],
        &[
            "name:",
            "host:",
            "port:",
            "request_timeout_ms:",
            "freshness_window_ms:",
            "override_minutes:",
            "color_mode:",
        ],
    );

    match &config_path {
        Some(p) if config_exists => kv("Config file:", format_args!("{} (loaded)", p.display()), w),
        Some(p) => kv(
            "Config file:",
            format_args!("{} (not found, using defaults)", p.display()),
            w,
        ),
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    kv_indent("name:", &config.name, w);
    let host = if config.host.is_empty() {
        "(not set)"
    } else {
        config.host.as_str()
    };
    kv_indent("host:", host, w);
    kv_indent("port:", config.port, w);
    kv_indent("request_timeout_ms:", config.request_timeout_ms, w);
    kv_indent("freshness_window_ms:", config.freshness_window_ms, w);
    kv_indent("override_minutes:", config.override_minutes, w);
    kv_indent("color_mode:", config.color_mode, w);

    if let Err(errors) = config.validate() {
        println!();
        println!("Problems:");
        for e in errors {
            println!("  {e}");
        }
    }
    Ok(())
}
