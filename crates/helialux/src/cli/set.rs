//! Write subcommands — `on`, `off`, `brightness`, `channels`, `color`, `hsl`.
//!
//! Each write resolves the light first, so unchanged values are skipped and
//! partial updates keep the channels the user did not name.

use super::{
    Channels, Config, GlobalOpts, Hsl, HttpDevice, Light, Result, color, effective_config,
    open_light, power_label,
};

/// Print the channels the light was just set to.
fn report(light: &Light<HttpDevice>) {
    let state = light.resolver().snapshot();
    println!("{} ({})", power_label(state.on), state.channels);
}

pub(super) fn cmd_power(opts: &GlobalOpts, on: bool) -> Result<()> {
    let light = open_light(&effective_config(opts))?;
    light.set_on(on)?;
    report(&light);
    Ok(())
}

pub(super) fn cmd_brightness(opts: &GlobalOpts, level: u8) -> Result<()> {
    let light = open_light(&effective_config(opts))?;
    light.set_brightness(level)?;
    report(&light);
    Ok(())
}

/// Fill unspecified channels from `current`.
fn merge_channels(current: Channels, values: [Option<u8>; 4]) -> Channels {
    let [w, b, g, r] = values;
    Channels::new(
        w.unwrap_or(current.white),
        b.unwrap_or(current.blue),
        g.unwrap_or(current.green),
        r.unwrap_or(current.red),
    )
}

pub(super) fn cmd_channels(opts: &GlobalOpts, values: [Option<u8>; 4]) -> Result<()> {
    let light = open_light(&effective_config(opts))?;
    let current = light.state()?.channels;
    let target = merge_channels(current, values);
    if target == current {
        println!("Unchanged ({current})");
        return Ok(());
    }
    light.set_channels(target)?;
    report(&light);
    Ok(())
}

pub(super) fn cmd_color(opts: &GlobalOpts, input: &str) -> Result<()> {
    let rgb = color::parse_color(input)?;
    let light = open_light(&effective_config(opts))?;
    light.set_color(rgb)?;
    report(&light);
    Ok(())
}

fn merge_hsl(current: Hsl, hue: Option<u16>, saturation: Option<u8>, lightness: Option<u8>) -> Hsl {
    Hsl {
        h: hue.unwrap_or(current.h),
        s: saturation.unwrap_or(current.s),
        l: lightness.unwrap_or(current.l),
    }
}

pub(super) fn cmd_hsl(
    opts: &GlobalOpts,
    hue: Option<u16>,
    saturation: Option<u8>,
    lightness: Option<u8>,
) -> Result<()> {
    // An explicit HSL request implies color mode for this invocation.
    let config = Config {
        color_mode: true,
        ..effective_config(opts)
    };
    let light = open_light(&config)?;
    let target = merge_hsl(light.hsl()?, hue, saturation, lightness);
    light.set_hsl(target)?;
    report(&light);
    Ok(())
}
