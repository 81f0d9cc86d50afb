//! Color math over the `palette` crate: hex <-> sRGB <-> HSL, CIE Lab for
//! perceptual lightness steps, hue rotation and uniform random colors.

use ::palette::white_point::D65;
use ::palette::{FromColor, ShiftHue, Srgb};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CIE Lab (D65). `l` is in `[0, 100]`.
pub type Lab = ::palette::Lab<D65, f64>;

type SrgbHsl = ::palette::Hsl<::palette::encoding::Srgb, f64>;

/// A 24-bit sRGB color. Text form is always `#RRGGBB`, uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color '{0}' (expected #RRGGBB)")]
pub struct ParseColorError(pub String);

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from the low 24 bits of `v` (`0xRRGGBB`).
    pub const fn from_u32(v: u32) -> Self {
        Self::new((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }

    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Uniform over all 2^24 colors, so hue, saturation and lightness all vary.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_u32(rng.gen_range(0..=0xFF_FFFF))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    pub fn hsl(self) -> Hsl {
        let hsl = SrgbHsl::from_color(self.to_srgb());
        Hsl {
            h: normalize_hue(hsl.hue.into_degrees()),
            s: hsl.saturation,
            l: hsl.lightness,
        }
    }

    /// `rgb(R, G, B)`
    pub fn rgb_string(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    /// `hsl(H, S%, L%)`
    pub fn hsl_string(self) -> String {
        self.hsl().to_string()
    }

    /// Rotate the hue by `delta` degrees, keeping saturation and lightness.
    ///
    /// The rotation is exact before the result is rounded to 8-bit channels.
    /// Rounding moves each channel by at most half a step, which moves the hue
    /// by at most `120 / (spread - 1)` degrees, `spread` being the distance
    /// between the largest and smallest channel. Near-grey colors therefore
    /// land on a coarse hue grid.
    pub fn hue_rotate(self, delta: f64) -> Self {
        if delta.rem_euclid(360.0) == 0.0 {
            return self;
        }
        let rotated = SrgbHsl::from_color(self.to_srgb()).shift_hue(delta);
        Self::from_srgb(Srgb::<f64>::from_color(rotated))
    }

    pub fn to_lab(self) -> Lab {
        Lab::from_color(self.to_srgb())
    }

    /// Nearest 8-bit color; out-of-gamut Lab values are clamped into sRGB.
    pub fn from_lab(lab: Lab) -> Self {
        Self::from_srgb(Srgb::<f64>::from_color(lab))
    }

    /// Raise Lab lightness by `LAB_STEP * amount`.
    pub fn brighten(self, amount: f64) -> Self {
        self.shift_lightness(LAB_STEP * amount)
    }

    /// Lower Lab lightness by `LAB_STEP * amount`.
    pub fn darken(self, amount: f64) -> Self {
        self.shift_lightness(-LAB_STEP * amount)
    }

    fn shift_lightness(self, delta: f64) -> Self {
        let mut lab = self.to_lab();
        lab.l = (lab.l + delta).clamp(0.0, 100.0);
        Self::from_lab(lab)
    }

    fn to_srgb(self) -> Srgb<f64> {
        Srgb::<u8>::new(self.r, self.g, self.b).into_format()
    }

    fn from_srgb(c: Srgb<f64>) -> Self {
        let (r, g, b) = c.into_components();
        Self::new(to_channel(r), to_channel(g), to_channel(b))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    /// Accepts `#RRGGBB` or `#RGB`, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.bytes().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }

        match hex.len() {
            6 => {
                let v = u32::from_str_radix(hex, 16).map_err(|_| err())?;
                Ok(Self::from_u32(v))
            }
            3 => {
                let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map_err(|_| err());
                Ok(Self::new(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17))
            }
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_hex()
    }
}

/// HSL with `h` in degrees `[0, 360)` and `s`, `l` as fractions `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    pub fn to_color(self) -> Color {
        let hsl = SrgbHsl::new(self.h, self.s.clamp(0.0, 1.0), self.l.clamp(0.0, 1.0));
        Color::from_srgb(Srgb::<f64>::from_color(hsl))
    }
}

impl fmt::Display for Hsl {
    /// Whole degrees and whole percentages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.h.round() as u32 % 360;
        let s = (self.s * 100.0).round() as u32;
        let l = (self.l * 100.0).round() as u32;
        write!(f, "hsl({h}, {s}%, {l}%)")
    }
}

/// Lab lightness moved by one unit of `brighten`/`darken`.
pub const LAB_STEP: f64 = 18.0;

fn normalize_hue(h: f64) -> f64 {
    let h = h.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negatives
    if h >= 360.0 { 0.0 } else { h }
}

fn to_channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn hex(s: &str) -> Color {
        s.parse().unwrap()
    }

    fn channel_diff(a: Color, b: Color) -> u8 {
        a.r.abs_diff(b.r).max(a.g.abs_diff(b.g)).max(a.b.abs_diff(b.b))
    }

    #[test]
    fn parses_and_renders_uppercase_hex() {
        assert_eq!(hex("#ff8000"), Color::new(255, 128, 0));
        assert_eq!(hex("#FF8000").to_hex(), "#FF8000");
        assert_eq!(hex("#abc"), Color::new(0xAA, 0xBB, 0xCC));
        assert_eq!(hex("#0a0b0c").to_string(), "#0A0B0C");
    }

    #[test]
    fn rejects_malformed_hex() {
        for bad in ["", "FF8000", "#FF80", "#GG0000", "#FF80000", "#+F8000"] {
            assert!(bad.parse::<Color>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn serde_uses_hex_strings() -> anyhow::Result<()> {
        let json = serde_json::to_string(&Color::new(1, 2, 255))?;
        assert_eq!(json, "\"#0102FF\"");
        let back: Color = serde_json::from_str("\"#0102ff\"")?;
        assert_eq!(back, Color::new(1, 2, 255));
        assert!(serde_json::from_str::<Color>("\"red\"").is_err());
        Ok(())
    }

    #[test]
    fn hsl_of_primaries() {
        let red = hex("#FF0000").hsl();
        assert_eq!((red.h, red.s, red.l), (0.0, 1.0, 0.5));

        let green = hex("#00FF00").hsl();
        assert!((green.h - 120.0).abs() < 1e-9);

        let blue = hex("#0000FF").hsl();
        assert!((blue.h - 240.0).abs() < 1e-9);

        let grey = hex("#808080").hsl();
        assert_eq!(grey.s, 0.0);
        assert_eq!(grey.h, 0.0);
    }

    #[test]
    fn display_renderings() {
        let c = hex("#3366CC");
        assert_eq!(c.rgb_string(), "rgb(51, 102, 204)");
        assert_eq!(c.hsl_string(), "hsl(220, 60%, 50%)");
        assert_eq!(Color::WHITE.hsl_string(), "hsl(0, 0%, 100%)");
    }

    #[test]
    fn hsl_round_trip_is_within_one_per_channel() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2000 {
            let c = Color::random(&mut rng);
            let back = c.hsl().to_color();
            assert!(channel_diff(c, back) <= 1, "{c} -> {back}");
        }
    }

    #[test]
    fn hue_rotate_keeps_saturation_and_lightness() {
        let base = hex("#3366CC");
        let rotated = base.hue_rotate(120.0);
        let (a, b) = (base.hsl(), rotated.hsl());
        assert!((b.h - 340.0).abs() < 1.0, "hue was {}", b.h);
        assert!((a.s - b.s).abs() < 0.01);
        assert!((a.l - b.l).abs() < 0.01);
        assert_eq!(base.hue_rotate(360.0), base);
        assert_eq!(base.hue_rotate(0.0), base);
    }

    #[test]
    fn hue_rotate_wraps_negative_deltas() {
        let base = hex("#FF0000");
        assert_eq!(base.hue_rotate(-120.0), hex("#0000FF"));
    }

    #[test]
    fn lab_round_trip() {
        for c in ["#000000", "#FFFFFF", "#FF0000", "#00FF00", "#0000FF", "#808080", "#3366CC"] {
            let c = hex(c);
            assert!(channel_diff(c, Color::from_lab(c.to_lab())) <= 1, "{c}");
        }
        assert!(Color::BLACK.to_lab().l.abs() < 0.01);
        assert!((Color::WHITE.to_lab().l - 100.0).abs() < 0.01);
    }

    #[test]
    fn lab_matches_reference_values() {
        let red = hex("#FF0000").to_lab();
        assert!((red.l - 53.24).abs() < 0.05, "{red:?}");
        assert!((red.a - 80.09).abs() < 0.05, "{red:?}");
        assert!((red.b - 67.20).abs() < 0.05, "{red:?}");

        let grey = hex("#808080").to_lab();
        assert!((grey.l - 53.59).abs() < 0.05, "{grey:?}");
        assert!(grey.a.abs() < 0.01 && grey.b.abs() < 0.01, "{grey:?}");
    }

    #[test]
    fn brighten_and_darken_move_lightness() {
        let base = hex("#3366CC");
        let l = base.to_lab().l;
        assert!(base.brighten(1.0).to_lab().l > l + 10.0);
        assert!(base.darken(1.0).to_lab().l < l - 10.0);
        assert_eq!(Color::WHITE.brighten(2.0), Color::WHITE);
        assert_eq!(Color::BLACK.darken(2.0), Color::BLACK);
    }

    #[test]
    fn random_colors_cover_the_full_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let colors: Vec<Color> = (0..500).map(|_| Color::random(&mut rng)).collect();
        assert!(colors.iter().any(|c| c.hsl().l < 0.3));
        assert!(colors.iter().any(|c| c.hsl().l > 0.7));
        assert!(colors.iter().any(|c| c.hsl().s < 0.3));
        assert!(colors.iter().all(|c| c.to_u32() <= 0xFF_FFFF));
    }
}
