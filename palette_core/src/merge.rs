//! Lock merge: fold freshly generated colors into a prior palette.

use tracing::debug;

use crate::color::Color;
use crate::error::PaletteError;
use crate::palette::{PALETTE_SIZE, Palette, Swatch};

/// Locked swatches of `prior` win at their index; every other slot takes the
/// fresh color and comes back unlocked. `prior` may be shorter than the
/// palette (or empty on the first request); missing slots count as unlocked.
pub fn merge(fresh: [Color; PALETTE_SIZE], prior: &[Swatch]) -> Palette {
    let swatches = std::array::from_fn(|i| match prior.get(i) {
        Some(prev) if prev.locked => Swatch::locked(prev.color),
        _ => Swatch::unlocked(fresh[i]),
    });
    let palette = Palette::new(swatches);
    debug!(kept = palette.locked_count(), "merged palette");
    palette
}

/// Flip the lock at `index`, leaving every other swatch as it was.
pub fn toggle_lock(palette: &Palette, index: usize) -> Result<Palette, PaletteError> {
    if index >= PALETTE_SIZE {
        return Err(PaletteError::LockIndexOutOfRange {
            index: index as i64,
            len: PALETTE_SIZE,
        });
    }

    let mut out = *palette;
    let swatch = &mut out.swatches_mut()[index];
    swatch.locked = !swatch.locked;
    Ok(out)
}
