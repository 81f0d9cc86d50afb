use serde::{Deserialize, Serialize};
use std::ops::Index;

use crate::color::Color;

/// Number of swatches in every working palette.
pub const PALETTE_SIZE: usize = 5;

/// One color slot. Only `color` and `locked` are stored; the `rgb` and `hsl`
/// wire fields are derived from `color` each time the swatch is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SwatchWire", into = "SwatchWire")]
pub struct Swatch {
    pub color: Color,
    pub locked: bool,
}

impl Swatch {
    pub fn unlocked(color: Color) -> Self {
        Self {
            color,
            locked: false,
        }
    }

    pub fn locked(color: Color) -> Self {
        Self {
            color,
            locked: true,
        }
    }

    pub fn rgb(&self) -> String {
        self.color.rgb_string()
    }

    pub fn hsl(&self) -> String {
        self.color.hsl_string()
    }
}

/// Wire shape. Incoming `rgb`/`hsl` are ignored.
#[derive(Serialize, Deserialize)]
struct SwatchWire {
    color: Color,
    #[serde(default)]
    locked: bool,
    #[serde(default, skip_deserializing)]
    rgb: String,
    #[serde(default, skip_deserializing)]
    hsl: String,
}

impl From<SwatchWire> for Swatch {
    fn from(w: SwatchWire) -> Self {
        Self {
            color: w.color,
            locked: w.locked,
        }
    }
}

impl From<Swatch> for SwatchWire {
    fn from(s: Swatch) -> Self {
        Self {
            color: s.color,
            locked: s.locked,
            rgb: s.rgb(),
            hsl: s.hsl(),
        }
    }
}

/// The five swatches a client is viewing. Position is identity: index `i`
/// before a regeneration is index `i` after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette {
    swatches: [Swatch; PALETTE_SIZE],
}

impl Palette {
    pub fn new(swatches: [Swatch; PALETTE_SIZE]) -> Self {
        Self { swatches }
    }

    /// All swatches unlocked.
    pub fn from_colors(colors: [Color; PALETTE_SIZE]) -> Self {
        Self::new(colors.map(Swatch::unlocked))
    }

    pub fn swatches(&self) -> &[Swatch; PALETTE_SIZE] {
        &self.swatches
    }

    pub(crate) fn swatches_mut(&mut self) -> &mut [Swatch; PALETTE_SIZE] {
        &mut self.swatches
    }

    pub fn colors(&self) -> [Color; PALETTE_SIZE] {
        self.swatches.map(|s| s.color)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Swatch> {
        self.swatches.iter()
    }

    pub fn locked_count(&self) -> usize {
        self.swatches.iter().filter(|s| s.locked).count()
    }
}

impl Index<usize> for Palette {
    type Output = Swatch;

    fn index(&self, index: usize) -> &Swatch {
        &self.swatches[index]
    }
}

impl<'a> IntoIterator for &'a Palette {
    type Item = &'a Swatch;
    type IntoIter = std::slice::Iter<'a, Swatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
