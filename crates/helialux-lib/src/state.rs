//! Light state model — the four physical channels and the derived views.

use serde::Serialize;

use crate::color::{self, Hsl, Rgb};

/// Highest value a channel can hold (percent).
pub const CHANNEL_MAX: u8 = 100;

/// One reading or write of the four physical channels, each `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Channels {
    pub white: u8,
    pub blue: u8,
    pub green: u8,
    pub red: u8,
}

impl Channels {
    /// All channels dark.
    pub const OFF: Channels = Channels {
        white: 0,
        blue: 0,
        green: 0,
        red: 0,
    };

    /// All channels at full output.
    pub const FULL: Channels = Channels {
        white: CHANNEL_MAX,
        blue: CHANNEL_MAX,
        green: CHANNEL_MAX,
        red: CHANNEL_MAX,
    };

    /// Build a reading; values above 100 are clamped.
    pub fn new(white: u8, blue: u8, green: u8, red: u8) -> Self {
        Channels {
            white: white.min(CHANNEL_MAX),
            blue: blue.min(CHANNEL_MAX),
            green: green.min(CHANNEL_MAX),
            red: red.min(CHANNEL_MAX),
        }
    }

    /// Build from wire order `[white, blue, green, red]`.
    pub fn from_array(values: [u8; 4]) -> Self {
        Channels::new(values[0], values[1], values[2], values[3])
    }

    /// Wire order `[white, blue, green, red]`.
    pub fn to_array(self) -> [u8; 4] {
        [self.white, self.blue, self.green, self.red]
    }

    pub fn sum(self) -> u16 {
        self.to_array().iter().map(|&v| v as u16).sum()
    }

    /// `true` iff any channel emits light.
    pub fn is_on(self) -> bool {
        self.sum() > 0
    }

    /// Highest channel value — the brightness of the light as a whole.
    pub fn max(self) -> u8 {
        self.to_array().into_iter().max().unwrap_or(0)
    }

    /// The color channels as an RGB triple (white is not part of it).
    pub fn rgb(self) -> Rgb {
        Rgb {
            r: self.red,
            g: self.green,
            b: self.blue,
        }
    }

    /// Replace the color channels, keeping white.
    pub fn with_rgb(self, rgb: Rgb) -> Self {
        Channels::new(self.white, rgb.b, rgb.g, rgb.r)
    }

    /// Scale every channel so the highest becomes `level`.
    ///
    /// From all-dark, every channel is set to `level`.
    pub fn scaled_to(self, level: u8) -> Self {
        let level = level.min(CHANNEL_MAX);
        let max = self.max();
        if max == 0 {
            return Channels::new(level, level, level, level);
        }
        let scale = |v: u8| ((v as f64) * (level as f64) / (max as f64)).round() as u8;
        Channels::new(
            scale(self.white),
            scale(self.blue),
            scale(self.green),
            scale(self.red),
        )
    }
}

impl std::fmt::Display for Channels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "W{} B{} G{} R{}",
            self.white, self.blue, self.green, self.red
        )
    }
}

/// Snapshot of the light handed to callers.
///
/// `on` is derived from the channels on construction and never set on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LightState {
    pub channels: Channels,
    pub on: bool,
}

impl LightState {
    pub fn new(channels: Channels) -> Self {
        LightState {
            channels,
            on: channels.is_on(),
        }
    }

    /// HSL view of the color channels, computed on demand.
    pub fn hsl(&self) -> Hsl {
        color::rgb_to_hsl(self.channels.rgb())
    }
}

impl Default for LightState {
    fn default() -> Self {
        LightState::new(Channels::OFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_to_100() {
        let ch = Channels::new(101, 200, 255, 100);
        assert_eq!(ch, Channels::FULL);
    }

    #[test]
    fn on_all_zero() {
        assert!(!LightState::new(Channels::OFF).on);
    }

    #[test]
    fn on_single_channel() {
        for i in 0..4 {
            let mut values = [0u8; 4];
            values[i] = 1;
            let state = LightState::new(Channels::from_array(values));
            assert!(state.on, "channel {i} alone should turn the light on");
        }
    }

    #[test]
    fn on_all_full() {
        assert!(LightState::new(Channels::FULL).on);
    }

    #[test]
    fn on_matches_sum_at_boundaries() {
        for values in [[0, 0, 0, 0], [0, 0, 0, 100], [100, 0, 0, 0], [100, 100, 100, 100]] {
            let ch = Channels::from_array(values);
            let sum: u16 = values.iter().map(|&v| v as u16).sum();
            assert_eq!(LightState::new(ch).on, sum > 0, "{values:?}");
        }
    }

    #[test]
    fn array_order_is_white_blue_green_red() {
        let ch = Channels::from_array([10, 20, 30, 40]);
        assert_eq!(ch.white, 10);
        assert_eq!(ch.blue, 20);
        assert_eq!(ch.green, 30);
        assert_eq!(ch.red, 40);
        assert_eq!(ch.to_array(), [10, 20, 30, 40]);
    }

    #[test]
    fn with_rgb_keeps_white() {
        let ch = Channels::new(55, 1, 2, 3).with_rgb(Rgb { r: 90, g: 80, b: 70 });
        assert_eq!(ch, Channels::new(55, 70, 80, 90));
    }

    #[test]
    fn scaled_to_keeps_ratios() {
        let ch = Channels::new(100, 50, 0, 25).scaled_to(40);
        assert_eq!(ch, Channels::new(40, 20, 0, 10));
    }

    #[test]
    fn scaled_to_from_dark_sets_all() {
        assert_eq!(Channels::OFF.scaled_to(30), Channels::new(30, 30, 30, 30));
    }

    #[test]
    fn scaled_to_zero_turns_off() {
        assert!(!Channels::new(10, 20, 30, 40).scaled_to(0).is_on());
    }

    #[test]
    fn display_format() {
        assert_eq!(Channels::new(1, 2, 3, 4).to_string(), "W1 B2 G3 R4");
    }
}
