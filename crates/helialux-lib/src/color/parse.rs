//! Color parsing and formatting for user input.
//!
//! Users think in 8-bit `#RRGGBB`; the device thinks in percent per channel.

use super::convert::Rgb;

fn byte_to_percent(byte: u32) -> u8 {
    ((byte as f64) * 100.0 / 255.0).round() as u8
}

fn percent_to_byte(percent: u8) -> u32 {
    ((percent.min(100) as f64) * 255.0 / 100.0).round() as u32
}

fn named(r: u8, g: u8, b: u8) -> Rgb {
    Rgb { r, g, b }
}

/// Parse a color string into channel percentages.
///
/// Accepts:
/// - Hex: `"#FF0000"`, `"FF0000"`, `"#ff0000"`
/// - Named: `"red"`, `"green"`, `"blue"`, `"white"`, `"orange"`, `"yellow"`, `"purple"`, `"cyan"`
pub fn parse_color(s: &str) -> crate::error::Result<Rgb> {
    let s = s.trim();

    match s.to_lowercase().as_str() {
        "red" => return Ok(named(100, 0, 0)),
        "green" => return Ok(named(0, 100, 0)),
        "blue" => return Ok(named(0, 0, 100)),
        "white" => return Ok(named(100, 100, 100)),
        "orange" => return Ok(named(100, 50, 0)),
        "yellow" => return Ok(named(100, 100, 0)),
        "purple" => return Ok(named(50, 0, 100)),
        "cyan" => return Ok(named(0, 100, 100)),
        "off" | "black" => return Ok(named(0, 0, 0)),
        _ => {}
    }

    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
        return Err(crate::HelialuxError::Color(format!(
            "Invalid color: {s} (use #RRGGBB or a color name)"
        )));
    }
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(crate::HelialuxError::Color(format!("Invalid hex color: {s}")));
    }
    let val = u32::from_str_radix(hex, 16)
        .map_err(|_| crate::HelialuxError::Color(format!("Invalid hex color: {s}")))?;
    Ok(Rgb {
        r: byte_to_percent((val >> 16) & 0xFF),
        g: byte_to_percent((val >> 8) & 0xFF),
        b: byte_to_percent(val & 0xFF),
    })
}

/// Format channel percentages as `#RRGGBB`.
pub fn format_color(rgb: Rgb) -> String {
    format!(
        "#{:02X}{:02X}{:02X}",
        percent_to_byte(rgb.r),
        percent_to_byte(rgb.g),
        percent_to_byte(rgb.b)
    )
}
