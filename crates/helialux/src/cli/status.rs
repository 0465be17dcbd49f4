//! `status` subcommand — show the light's resolved state.

use helialux_lib::device::SmartControl;

use super::{
    GlobalOpts, Hsl, LightState, Result, StatusOutput, color, effective_config, kv, kv_indent,
    kv_width, open_light, power_label, print_json,
};

fn build_output(device: String, state: &LightState, color_mode: bool) -> StatusOutput {
    StatusOutput {
        version: env!("CARGO_PKG_VERSION").to_string(),
        device,
        on: state.on,
        brightness: state.channels.max(),
        channels: state.channels,
        color: color::format_color(state.channels.rgb()),
        hsl: color_mode.then(|| state.hsl()),
    }
}

fn print_human(output: &StatusOutput) {
    let w = kv_width(
        &["Version:", "Device:", "Power:", "Brightness:", "Channels:", "Color:"],
        &["White:", "Blue:", "Green:", "Red:", "Hue:", "Saturation:", "Lightness:"],
    );

    kv("Version:", &output.version, w);
    kv("Device:", &output.device, w);
    println!();

    kv("Power:", power_label(output.on), w);
    kv("Brightness:", format_args!("{}%", output.brightness), w);
    println!("Channels:");
    kv_indent("White:", output.channels.white, w);
    kv_indent("Blue:", output.channels.blue, w);
    kv_indent("Green:", output.channels.green, w);
    kv_indent("Red:", output.channels.red, w);

    kv("Color:", &output.color, w);
    if let Some(Hsl { h, s, l }) = output.hsl {
        kv_indent("Hue:", format_args!("{h}°"), w);
        kv_indent("Saturation:", format_args!("{s}%"), w);
        kv_indent("Lightness:", format_args!("{l}%"), w);
    }
}

pub(super) fn cmd_status(opts: &GlobalOpts) -> Result<()> {
    let config = effective_config(opts);
    let light = open_light(&config)?;
    let state = light.state()?;
    let output = build_output(
        light.device().endpoint().to_string(),
        &state,
        light.color_mode(),
    );

    if opts.json {
        return print_json(&output);
    }
    print_human(&output);
    Ok(())
}
