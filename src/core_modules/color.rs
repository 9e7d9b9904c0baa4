// THEORY:
// The `color` module is the numeric foundation of the relational engine. Every other
// layer (the grid, the relation extractor, the preview builder, the exporter) talks
// about color through the small set of stateless conversions defined here.
//
// Key architectural principles:
// 1.  **HSL as the working space**: Relative color math happens in HSL. A cell's
//     relation to its base is a (hue, saturation, lightness) offset, so hue can rotate
//     while saturation and lightness shift independently. HSL values are never stored
//     on a pixel; they are always derived from the 8-bit channels on demand.
// 2.  **Hue is circular, saturation and lightness are not**: Hue arithmetic wraps
//     modulo 360 and deltas always take the short way around the wheel (350 -> 10 is
//     +20, not -340). Saturation and lightness are clamped to [0, 1] instead. Clamping
//     is lossy on purpose and is never reported as an error.
// 3.  **Quantization at the edges only**: Channels are 8-bit on the way in and on the
//     way out. All intermediate math is `f64`, and rounding happens exactly once, when
//     converting back to a byte.

use crate::core_modules::pixel::pixel::Pixel;
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

pub type Channel = u8;
pub type Hue = f64;
pub type Saturation = f64;
pub type Lightness = f64;

/// An opaque 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub red: Channel,
    pub green: Channel,
    pub blue: Channel,
}

impl Rgb {
    pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
        Self { red, green, blue }
    }
}

/// A color in HSL space: hue in degrees `[0, 360)`, saturation and lightness in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsl {
    pub hue: Hue,
    pub saturation: Saturation,
    pub lightness: Lightness,
}

impl Hsl {
    pub const fn new(hue: Hue, saturation: Saturation, lightness: Lightness) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }
}

/// A signed offset between two HSL colors.
///
/// `hue` is the shortest signed angular distance in `[-180, 180)`; `saturation` and
/// `lightness` are plain differences in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HslDelta {
    pub hue: Hue,
    pub saturation: Saturation,
    pub lightness: Lightness,
}

/// Parses a `#rgb` / `#rrggbb` hex color. The leading `#` is optional and
/// surrounding whitespace is ignored. Shorthand digits are duplicated (`#f80` is
/// `#ff8800`).
pub fn hex_to_rgb(hex: &str) -> Result<Rgb> {
    let digits = hex.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits).as_bytes();
    let invalid = || Error::InvalidColorFormat(hex.to_string());

    match digits.len() {
        3 => {
            let red = parse_hex_digit(digits[0]).ok_or_else(invalid)?;
            let green = parse_hex_digit(digits[1]).ok_or_else(invalid)?;
            let blue = parse_hex_digit(digits[2]).ok_or_else(invalid)?;
            Ok(Rgb::new(red << 4 | red, green << 4 | green, blue << 4 | blue))
        }
        6 => {
            let red = parse_hex_byte(&digits[0..2]).ok_or_else(invalid)?;
            let green = parse_hex_byte(&digits[2..4]).ok_or_else(invalid)?;
            let blue = parse_hex_byte(&digits[4..6]).ok_or_else(invalid)?;
            Ok(Rgb::new(red, green, blue))
        }
        _ => Err(invalid()),
    }
}

/// Formats a color as lowercase `#rrggbb`, the canonical form `hex_to_rgb` round-trips.
pub fn rgb_to_hex(rgb: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
}

#[inline]
const fn parse_hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[inline]
fn parse_hex_byte(bytes: &[u8]) -> Option<u8> {
    let hi = parse_hex_digit(bytes[0])?;
    let lo = parse_hex_digit(bytes[1])?;
    Some(hi << 4 | lo)
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        hex_to_rgb(s)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&rgb_to_hex(*self))
    }
}

/// Standard max/min decomposition. Achromatic colors (max == min) get hue 0 and
/// saturation 0.
pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let red = rgb.red as f64 / 255.0;
    let green = rgb.green as f64 / 255.0;
    let blue = rgb.blue as f64 / 255.0;

    let maximum_channel = red.max(green.max(blue));
    let minimum_channel = red.min(green.min(blue));
    let chroma = maximum_channel - minimum_channel;
    let lightness = (maximum_channel + minimum_channel) / 2.0;

    if chroma == 0.0 {
        return Hsl::new(0.0, 0.0, lightness);
    }

    let saturation = clamp01(chroma / (1.0 - (2.0 * lightness - 1.0).abs()));

    let sector = if maximum_channel == red {
        ((green - blue) / chroma) % 6.0
    } else if maximum_channel == green {
        (blue - red) / chroma + 2.0
    } else {
        (red - green) / chroma + 4.0
    };

    Hsl::new(normalize_hue(sector * 60.0), saturation, lightness)
}

/// Sector-based reconstruction. Hue is taken modulo 360, every channel is rounded
/// and clamped to a byte.
pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let hue = normalize_hue(hsl.hue);
    let chroma = (1.0 - (2.0 * hsl.lightness - 1.0).abs()) * hsl.saturation;
    let secondary = chroma * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
    let offset = hsl.lightness - chroma / 2.0;

    let (red, green, blue) = match hue {
        h if h < 60.0 => (chroma, secondary, 0.0),
        h if h < 120.0 => (secondary, chroma, 0.0),
        h if h < 180.0 => (0.0, chroma, secondary),
        h if h < 240.0 => (0.0, secondary, chroma),
        h if h < 300.0 => (secondary, 0.0, chroma),
        _ => (chroma, 0.0, secondary),
    };

    Rgb::new(
        to_channel((red + offset) * 255.0),
        to_channel((green + offset) * 255.0),
        to_channel((blue + offset) * 255.0),
    )
}

/// The minimal signed rotation taking `from` onto `to`, in `[-180, 180)`.
pub fn shortest_hue_delta(from: Hue, to: Hue) -> Hue {
    let delta = (to - from + 180.0).rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if delta >= 360.0 { -180.0 } else { delta - 180.0 }
}

/// Re-applies a stored offset to a (new) base color. Hue wraps, saturation and
/// lightness clamp to `[0, 1]`.
pub fn apply_relation(base: Hsl, delta: HslDelta) -> Hsl {
    Hsl::new(
        normalize_hue(base.hue + delta.hue),
        clamp01(base.saturation + delta.saturation),
        clamp01(base.lightness + delta.lightness),
    )
}

/// Alpha-over compositing of a cell onto an opaque background. The result is
/// treated as fully opaque by the caller.
pub fn composite_over_background(foreground: &Pixel, background: Rgb) -> Rgb {
    let alpha = foreground.alpha as f64 / 255.0;
    let mix = |fg: Channel, bg: Channel| to_channel(fg as f64 * alpha + bg as f64 * (1.0 - alpha));

    Rgb::new(
        mix(foreground.red, background.red),
        mix(foreground.green, background.green),
        mix(foreground.blue, background.blue),
    )
}

/// Wraps any angle into `[0, 360)`.
pub fn normalize_hue(hue: Hue) -> Hue {
    let wrapped = hue.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

#[inline]
fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[inline]
fn to_channel(value: f64) -> Channel {
    value.round().clamp(0.0, 255.0) as Channel
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(hex_to_rgb("#ff8800").unwrap(), Rgb::new(255, 136, 0));
        assert_eq!(hex_to_rgb("FF8800").unwrap(), Rgb::new(255, 136, 0));
        assert_eq!(hex_to_rgb("#f80").unwrap(), Rgb::new(255, 136, 0));
        assert_eq!(hex_to_rgb("  #0000FF ").unwrap(), Rgb::new(0, 0, 255));
    }

    #[test]
    fn rejects_malformed_hex() {
        for bad in ["", "#", "#12", "#1234", "#12345", "#1234567", "#gg0000", "#+12345", "red"] {
            assert!(
                matches!(hex_to_rgb(bad), Err(Error::InvalidColorFormat(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn formats_lowercase_hex() {
        assert_eq!(rgb_to_hex(Rgb::new(255, 0, 171)), "#ff00ab");
        assert_eq!(Rgb::new(1, 2, 3).to_string(), "#010203");
        assert_eq!("#abc".parse::<Rgb>().unwrap(), Rgb::new(0xaa, 0xbb, 0xcc));
    }

    #[test]
    fn primaries_to_hsl() {
        let red = rgb_to_hsl(Rgb::new(255, 0, 0));
        assert_close(red.hue, 0.0);
        assert_close(red.saturation, 1.0);
        assert_close(red.lightness, 0.5);

        let green = rgb_to_hsl(Rgb::new(0, 255, 0));
        assert_close(green.hue, 120.0);

        let blue = rgb_to_hsl(Rgb::new(0, 0, 255));
        assert_close(blue.hue, 240.0);

        let magenta_ish = rgb_to_hsl(Rgb::new(255, 0, 128));
        assert!(magenta_ish.hue > 300.0 && magenta_ish.hue < 360.0);
    }

    #[test]
    fn achromatic_has_no_hue_or_saturation() {
        for value in [0u8, 17, 128, 255] {
            let hsl = rgb_to_hsl(Rgb::new(value, value, value));
            assert_close(hsl.hue, 0.0);
            assert_close(hsl.saturation, 0.0);
            assert_close(hsl.lightness, value as f64 / 255.0);
        }
    }

    #[test]
    fn hsl_to_rgb_wraps_hue() {
        assert_eq!(hsl_to_rgb(Hsl::new(360.0, 1.0, 0.5)), Rgb::new(255, 0, 0));
        assert_eq!(hsl_to_rgb(Hsl::new(-120.0, 1.0, 0.5)), Rgb::new(0, 0, 255));
        assert_eq!(hsl_to_rgb(Hsl::new(0.0, 0.0, 1.0)), Rgb::new(255, 255, 255));
    }

    #[test]
    fn hue_delta_takes_the_short_way() {
        assert_close(shortest_hue_delta(350.0, 10.0), 20.0);
        assert_close(shortest_hue_delta(10.0, 350.0), -20.0);
        assert_close(shortest_hue_delta(0.0, 180.0), -180.0);
        assert_close(shortest_hue_delta(90.0, 90.0), 0.0);
    }

    #[test]
    fn relation_clamps_saturation_and_lightness() {
        let result = apply_relation(
            Hsl::new(0.0, 0.9, 0.9),
            HslDelta {
                hue: 0.0,
                saturation: 0.5,
                lightness: 0.5,
            },
        );
        assert_close(result.saturation, 1.0);
        assert_close(result.lightness, 1.0);

        let result = apply_relation(
            Hsl::new(350.0, 0.1, 0.1),
            HslDelta {
                hue: 20.0,
                saturation: -0.5,
                lightness: -0.5,
            },
        );
        assert_close(result.hue, 10.0);
        assert_close(result.saturation, 0.0);
        assert_close(result.lightness, 0.0);
    }

    #[test]
    fn composites_half_transparent_over_background() {
        let fg = Pixel::new(255, 0, 0, 128);
        let out = composite_over_background(&fg, Rgb::new(0, 0, 255));
        assert_eq!(out, Rgb::new(128, 0, 127));

        let opaque = Pixel::new(10, 20, 30, 255);
        assert_eq!(composite_over_background(&opaque, Rgb::new(200, 200, 200)), Rgb::new(10, 20, 30));

        let clear = Pixel::new(10, 20, 30, 0);
        assert_eq!(composite_over_background(&clear, Rgb::new(200, 100, 0)), Rgb::new(200, 100, 0));
    }

    quickcheck::quickcheck! {
        fn hex_round_trips(red: u8, green: u8, blue: u8) -> bool {
            let hex = rgb_to_hex(Rgb::new(red, green, blue));
            hex_to_rgb(&hex).map(rgb_to_hex).ok() == Some(hex)
        }

        fn hsl_round_trip_is_within_one(red: u8, green: u8, blue: u8) -> bool {
            let original = Rgb::new(red, green, blue);
            let back = hsl_to_rgb(rgb_to_hsl(original));
            (back.red as i16 - red as i16).abs() <= 1
                && (back.green as i16 - green as i16).abs() <= 1
                && (back.blue as i16 - blue as i16).abs() <= 1
        }

        fn hue_delta_is_half_open(from: u16, to: u16) -> bool {
            let delta = shortest_hue_delta((from % 360) as f64, (to % 360) as f64);
            (-180.0..180.0).contains(&delta)
                && normalize_hue((from % 360) as f64 + delta) == normalize_hue((to % 360) as f64)
        }

        fn derived_hue_is_normalized(red: u8, green: u8, blue: u8) -> bool {
            let hsl = rgb_to_hsl(Rgb::new(red, green, blue));
            (0.0..360.0).contains(&hsl.hue)
                && (0.0..=1.0).contains(&hsl.saturation)
                && (0.0..=1.0).contains(&hsl.lightness)
        }
    }
}
