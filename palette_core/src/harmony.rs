//! Harmony methods: how the five candidate colors of a palette relate.

use ::palette::Mix;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::color::Color;
use crate::palette::PALETTE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Five unrelated colors.
    #[default]
    Random,
    /// Lab gradient from a brightened to a darkened copy of one seed.
    Monochrome,
    /// Seed plus 120 and 240 degree rotations.
    Triadic,
    /// Seed plus 90, 180 and 270 degree rotations.
    Quadratic,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown generation method '{0}' (expected random, monochrome, triadic or quadratic)")]
pub struct UnknownMethod(pub String);

impl Method {
    pub const ALL: [Method; 4] = [
        Self::Random,
        Self::Monochrome,
        Self::Triadic,
        Self::Quadratic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Monochrome => "monochrome",
            Self::Triadic => "triadic",
            Self::Quadratic => "quadratic",
        }
    }

    /// Lenient parse used for request payloads.
    ///
    /// An absent or blank tag means [`Method::Random`]. An unrecognized tag
    /// also means [`Method::Random`], with a warning so the fallback is visible.
    pub fn resolve(tag: Option<&str>) -> Method {
        let Some(tag) = tag.map(str::trim).filter(|t| !t.is_empty()) else {
            return Method::default();
        };
        match tag.parse() {
            Ok(method) => method,
            Err(UnknownMethod(tag)) => {
                warn!(method = %tag, "unrecognized generation method, using random");
                Method::default()
            }
        }
    }

    /// Hue offsets of the distinct harmonic points, seed first.
    pub fn hue_offsets(self) -> &'static [f64] {
        match self {
            Self::Random | Self::Monochrome => &[],
            Self::Triadic => &[0.0, 120.0, 240.0],
            Self::Quadratic => &[0.0, 90.0, 180.0, 270.0],
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let low = s.trim().to_ascii_lowercase();
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == low)
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

/// How far (in `brighten`/`darken` units) the monochrome ends sit from the seed.
const MONOCHROME_SPREAD: f64 = 2.0;

/// HSL lightness shift applied to padding slots.
const PAD_LIGHTNESS_SHIFT: f64 = 0.25;

/// Produce the five raw colors for `method`, seeded from `rng`.
pub fn generate<R: Rng + ?Sized>(method: Method, rng: &mut R) -> [Color; PALETTE_SIZE] {
    let colors = match method {
        Method::Random => std::array::from_fn(|_| Color::random(&mut *rng)),
        Method::Monochrome => monochrome(Color::random(rng)),
        Method::Triadic | Method::Quadratic => rotations(Color::random(rng), method.hue_offsets()),
    };
    debug!(%method, colors = ?colors.map(Color::to_hex), "generated candidate colors");
    colors
}

/// Five evenly spaced stops of the Lab scale `[brighter, seed, darker]`.
/// The middle stop is the seed itself, not a Lab round trip of it.
pub fn monochrome(seed: Color) -> [Color; PALETTE_SIZE] {
    let light = seed.brighten(MONOCHROME_SPREAD).to_lab();
    let mid = seed.to_lab();
    let dark = seed.darken(MONOCHROME_SPREAD).to_lab();
    let center = PALETTE_SIZE / 2;

    std::array::from_fn(|i| {
        let t = i as f64 / (PALETTE_SIZE - 1) as f64;
        if i == center {
            seed
        } else if t < 0.5 {
            Color::from_lab(light.mix(mid, t * 2.0))
        } else {
            Color::from_lab(mid.mix(dark, (t - 0.5) * 2.0))
        }
    })
}

/// One color per hue offset, then padding up to the palette width.
///
/// Padding slot `k` reuses harmonic point `k % n` with its HSL lightness moved
/// toward the middle, so it keeps a harmonic hue but stays distinguishable.
fn rotations(seed: Color, offsets: &[f64]) -> [Color; PALETTE_SIZE] {
    let points: Vec<Color> = offsets.iter().map(|&d| seed.hue_rotate(d)).collect();
    std::array::from_fn(|k| match points.get(k) {
        Some(&c) => c,
        None => pad_shade(points[k % points.len()]),
    })
}

fn pad_shade(c: Color) -> Color {
    let mut hsl = c.hsl();
    hsl.l = if hsl.l < 0.5 {
        hsl.l + PAD_LIGHTNESS_SHIFT
    } else {
        hsl.l - PAD_LIGHTNESS_SHIFT
    };
    hsl.to_color()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn hue_gap(a: Color, b: Color) -> f64 {
        (b.hsl().h - a.hsl().h).rem_euclid(360.0)
    }

    /// Largest hue error 8-bit rounding can leave after a rotation of `seed`,
    /// or `None` when its channels are too close together for a usable hue.
    fn rounding_slack(seed: Color) -> Option<f64> {
        let spread = seed.r.max(seed.g).max(seed.b) - seed.r.min(seed.g).min(seed.b);
        (spread >= 3).then(|| 0.5 + 120.0 / f64::from(spread - 1))
    }

    fn hue_error(a: Color, b: Color, want: f64) -> f64 {
        let d = (hue_gap(a, b) - want).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    fn seeds() -> Vec<Color> {
        ["#3366CC", "#E04A1F", "#2EB872", "#8E44AD", "#F1C40F", "#1ABC9C"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect()
    }

    #[test]
    fn every_method_yields_five_colors() {
        let mut rng = StdRng::seed_from_u64(1);
        for method in Method::ALL {
            for _ in 0..50 {
                assert_eq!(generate(method, &mut rng).len(), PALETTE_SIZE);
            }
        }
    }

    #[test]
    fn resolve_falls_back_to_random() {
        assert_eq!(Method::resolve(None), Method::Random);
        assert_eq!(Method::resolve(Some("")), Method::Random);
        assert_eq!(Method::resolve(Some("analogous")), Method::Random);
        assert_eq!(Method::resolve(Some("Triadic")), Method::Triadic);
        assert_eq!(Method::resolve(Some(" quadratic ")), Method::Quadratic);
    }

    #[test]
    fn strict_parse_rejects_unknown() {
        assert_eq!("monochrome".parse::<Method>(), Ok(Method::Monochrome));
        assert!("tetradic".parse::<Method>().is_err());
    }

    #[test]
    fn monochrome_middle_is_the_seed() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            let seed = Color::random(&mut rng);
            assert_eq!(monochrome(seed)[2], seed);
        }
    }

    #[test]
    fn monochrome_runs_light_to_dark() {
        for seed in seeds() {
            let ls: Vec<f64> = monochrome(seed).iter().map(|c| c.to_lab().l).collect();
            for pair in ls.windows(2) {
                assert!(pair[0] >= pair[1] - 0.5, "{seed}: {ls:?}");
            }
            assert!(ls[0] > ls[4] + 20.0, "{seed}: {ls:?}");
        }
    }

    #[test]
    fn triadic_points_are_120_degrees_apart() {
        for seed in seeds() {
            let p = rotations(seed, Method::Triadic.hue_offsets());
            assert_eq!(p[0], seed);
            assert!((hue_gap(p[0], p[1]) - 120.0).abs() < 2.0, "{seed}");
            assert!((hue_gap(p[0], p[2]) - 240.0).abs() < 2.0, "{seed}");
        }
    }

    #[test]
    fn quadratic_points_are_90_degrees_apart() {
        for seed in seeds() {
            let p = rotations(seed, Method::Quadratic.hue_offsets());
            assert_eq!(p[0], seed);
            for (i, want) in [90.0, 180.0, 270.0].into_iter().enumerate() {
                assert!((hue_gap(p[0], p[i + 1]) - want).abs() < 2.0, "{seed} slot {}", i + 1);
            }
        }
    }

    #[test]
    fn generated_rotations_hold_within_rounding_on_random_seeds() {
        let mut rng = StdRng::seed_from_u64(33);
        for method in [Method::Triadic, Method::Quadratic] {
            for _ in 0..2000 {
                let p = generate(method, &mut rng);
                let Some(slack) = rounding_slack(p[0]) else {
                    continue;
                };
                for (i, &want) in method.hue_offsets().iter().enumerate().skip(1) {
                    let err = hue_error(p[0], p[i], want);
                    assert!(err <= slack, "{method} {} slot {i}: off by {err:.2}", p[0]);
                }
            }
        }
    }

    #[test]
    fn near_grey_seed_rotates_onto_the_coarse_hue_grid() {
        let seed: Color = "#80807F".parse().unwrap();
        let p = rotations(seed, Method::Quadratic.hue_offsets());
        assert_eq!(rounding_slack(seed), None);
        for c in &p[1..4] {
            let spread = c.r.max(c.g).max(c.b) - c.r.min(c.g).min(c.b);
            assert!(spread <= 1, "{c}");
        }
    }

    #[test]
    fn padding_keeps_a_harmonic_hue_but_differs() {
        for seed in seeds() {
            let tri = rotations(seed, Method::Triadic.hue_offsets());
            assert!(hue_gap(tri[0], tri[3]).min(360.0 - hue_gap(tri[0], tri[3])) < 2.0);
            assert!((hue_gap(tri[0], tri[4]) - 120.0).abs() < 2.0);
            assert_ne!(tri[3], tri[0]);
            assert_ne!(tri[4], tri[1]);

            let quad = rotations(seed, Method::Quadratic.hue_offsets());
            assert!(hue_gap(quad[0], quad[4]).min(360.0 - hue_gap(quad[0], quad[4])) < 2.0);
            assert_ne!(quad[4], quad[0]);
        }
    }
}
