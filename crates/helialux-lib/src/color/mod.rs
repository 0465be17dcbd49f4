//! Color handling — RGB/HSL conversion and user-facing color parsing.

mod convert;
mod parse;

pub use convert::{Hsl, Rgb, hsl_to_rgb, rgb_to_hsl};
pub use parse::{format_color, parse_color};
