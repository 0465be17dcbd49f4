//! RGB ⇄ HSL conversion for the color channels.
//!
//! Channels are percentages (`0..=100`). Hue is in whole degrees
//! (`0..=360`), saturation and lightness in whole percent. Both directions
//! round to integers, so a round trip is exact only to within one unit per
//! channel on typical values.

use serde::Serialize;

/// Red/green/blue channel values, each `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Hue (degrees), saturation and lightness (percent).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Hsl {
    pub h: u16,
    pub s: u8,
    pub l: u8,
}

fn to_unit(percent: u8) -> f64 {
    f64::from(percent.min(100)) / 100.0
}

fn to_percent(unit: f64) -> u8 {
    (unit * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Convert channel percentages to HSL.
pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let (r, g, b) = (to_unit(rgb.r), to_unit(rgb.g), to_unit(rgb.b));
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let l = (max + min) / 2.0;

    if delta == 0.0 {
        return Hsl {
            h: 0,
            s: 0,
            l: to_percent(l),
        };
    }

    let s = if l <= 0.5 {
        delta / (max + min)
    } else {
        delta / (2.0 - max - min)
    };

    let sector = if max == r {
        (g - b) / delta
    } else if max == g {
        2.0 + (b - r) / delta
    } else {
        4.0 + (r - g) / delta
    };
    let mut h = sector * 60.0;
    if h < 0.0 {
        h += 360.0;
    }

    Hsl {
        h: h.round().min(360.0) as u16,
        s: to_percent(s),
        l: to_percent(l),
    }
}

/// Convert HSL to channel percentages.
pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let h = f64::from(hsl.h.min(360)) / 360.0;
    let s = to_unit(hsl.s);
    let l = to_unit(hsl.l);

    if s == 0.0 {
        let v = to_percent(l);
        return Rgb { r: v, g: v, b: v };
    }

    let t2 = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let t1 = 2.0 * l - t2;

    let channel = |index: f64| {
        let mut t3 = h + 1.0 / 3.0 - index / 3.0;
        if t3 < 0.0 {
            t3 += 1.0;
        }
        if t3 > 1.0 {
            t3 -= 1.0;
        }
        let v = if t3 * 6.0 < 1.0 {
            t1 + (t2 - t1) * 6.0 * t3
        } else if t3 * 2.0 < 1.0 {
            t2
        } else if t3 * 3.0 < 2.0 {
            t1 + (t2 - t1) * (2.0 / 3.0 - t3) * 6.0
        } else {
            t1
        };
        to_percent(v)
    };

    Rgb {
        r: channel(0.0),
        g: channel(1.0),
        b: channel(2.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    fn hsl(h: u16, s: u8, l: u8) -> Hsl {
        Hsl { h, s, l }
    }

    fn max_channel_diff(a: Rgb, b: Rgb) -> u8 {
        a.r.abs_diff(b.r).max(a.g.abs_diff(b.g)).max(a.b.abs_diff(b.b))
    }

    fn hue_diff(a: u16, b: u16) -> u16 {
        let d = a.abs_diff(b) % 360;
        d.min(360 - d)
    }

    // ── rgb_to_hsl ──

    #[test]
    fn primaries_to_hsl() {
        assert_eq!(rgb_to_hsl(rgb(100, 0, 0)), hsl(0, 100, 50));
        assert_eq!(rgb_to_hsl(rgb(0, 100, 0)), hsl(120, 100, 50));
        assert_eq!(rgb_to_hsl(rgb(0, 0, 100)), hsl(240, 100, 50));
    }

    #[test]
    fn secondaries_to_hsl() {
        assert_eq!(rgb_to_hsl(rgb(100, 100, 0)), hsl(60, 100, 50));
        assert_eq!(rgb_to_hsl(rgb(0, 100, 100)), hsl(180, 100, 50));
        assert_eq!(rgb_to_hsl(rgb(100, 0, 100)), hsl(300, 100, 50));
    }

    #[test]
    fn grays_have_no_hue_or_saturation() {
        assert_eq!(rgb_to_hsl(rgb(0, 0, 0)), hsl(0, 0, 0));
        assert_eq!(rgb_to_hsl(rgb(50, 50, 50)), hsl(0, 0, 50));
        assert_eq!(rgb_to_hsl(rgb(100, 100, 100)), hsl(0, 0, 100));
    }

    #[test]
    fn negative_hue_wraps() {
        // Red max with blue above green: sector is negative.
        let out = rgb_to_hsl(rgb(100, 0, 50));
        assert_eq!(out.h, 330);
    }

    #[test]
    fn saturation_uses_upper_formula_above_half_lightness() {
        // max 1.0, min 0.5: l = 0.75, s = 0.5 / (2 - 1.5) = 1.0
        assert_eq!(rgb_to_hsl(rgb(100, 50, 50)), hsl(0, 100, 75));
    }

    #[test]
    fn hue_never_exceeds_360() {
        for r in (0..=100).step_by(5) {
            for b in 0..=100 {
                assert!(rgb_to_hsl(rgb(r, 0, b)).h <= 360);
            }
        }
    }

    // ── hsl_to_rgb ──

    #[test]
    fn hsl_primaries_to_rgb() {
        assert_eq!(hsl_to_rgb(hsl(0, 100, 50)), rgb(100, 0, 0));
        assert_eq!(hsl_to_rgb(hsl(120, 100, 50)), rgb(0, 100, 0));
        assert_eq!(hsl_to_rgb(hsl(240, 100, 50)), rgb(0, 0, 100));
        assert_eq!(hsl_to_rgb(hsl(60, 100, 50)), rgb(100, 100, 0));
    }

    #[test]
    fn zero_saturation_is_gray() {
        assert_eq!(hsl_to_rgb(hsl(200, 0, 37)), rgb(37, 37, 37));
        assert_eq!(hsl_to_rgb(hsl(0, 0, 100)), rgb(100, 100, 100));
    }

    #[test]
    fn hue_360_equals_hue_0() {
        assert_eq!(hsl_to_rgb(hsl(360, 100, 50)), hsl_to_rgb(hsl(0, 100, 50)));
    }

    #[test]
    fn lightness_extremes() {
        assert_eq!(hsl_to_rgb(hsl(90, 100, 0)), rgb(0, 0, 0));
        assert_eq!(hsl_to_rgb(hsl(90, 100, 100)), rgb(100, 100, 100));
    }

    // ── round trips ──

    #[test]
    fn rgb_round_trip_within_one_on_grid() {
        for r in (0..=100).step_by(10) {
            for g in (0..=100).step_by(10) {
                for b in (0..=100).step_by(10) {
                    let input = rgb(r, g, b);
                    let out = hsl_to_rgb(rgb_to_hsl(input));
                    assert!(
                        max_channel_diff(input, out) <= 1,
                        "{input:?} -> {out:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn rgb_round_trip_within_two_everywhere() {
        for r in 0..=100 {
            for g in 0..=100 {
                for b in 0..=100 {
                    let input = rgb(r, g, b);
                    let out = hsl_to_rgb(rgb_to_hsl(input));
                    assert!(
                        max_channel_diff(input, out) <= 2,
                        "{input:?} -> {out:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn hsl_round_trip_lightness_within_one_everywhere() {
        for h in (0..360).step_by(3) {
            for s in 0..=100 {
                for l in 0..=100 {
                    let out = rgb_to_hsl(hsl_to_rgb(hsl(h, s, l)));
                    assert!(out.l.abs_diff(l) <= 1, "{h},{s},{l} -> {out:?}");
                }
            }
        }
    }

    #[test]
    fn hsl_round_trip_exact_for_saturated_colors() {
        for h in (0..360).step_by(30) {
            for s in (50..=100).step_by(10) {
                for l in (30..=70).step_by(10) {
                    let out = rgb_to_hsl(hsl_to_rgb(hsl(h, s, l)));
                    assert!(hue_diff(out.h, h) <= 1, "{h},{s},{l} -> {out:?}");
                    assert!(out.s.abs_diff(s) <= 1, "{h},{s},{l} -> {out:?}");
                    assert!(out.l.abs_diff(l) <= 1, "{h},{s},{l} -> {out:?}");
                }
            }
        }
    }

    #[test]
    fn hsl_round_trip_full_hue_circle() {
        for h in 0..360 {
            let out = rgb_to_hsl(hsl_to_rgb(hsl(h, 100, 50)));
            assert!(hue_diff(out.h, h) <= 1, "{h} -> {out:?}");
        }
    }
}
