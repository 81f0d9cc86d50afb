use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::palette::Palette;

/// Length of a share code.
pub const CODE_LEN: usize = 6;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A named palette as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPalette {
    pub name: String,
    pub colors: Palette,
    pub code: String,
    /// Display convenience built from `code`. Never looked up.
    pub link: String,
    #[serde(default)]
    pub liked: bool,
}

/// The whole store document: every saved palette in first-save order.
/// On disk it is a plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedPalettes {
    pub palettes: Vec<SavedPalette>,
}

impl SavedPalettes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }

    /// Upsert keyed by name only. An existing record gets the new colors and
    /// keeps its code, link and like flag; otherwise a record is appended
    /// with a fresh code.
    pub fn upsert<R: Rng + ?Sized>(
        &mut self,
        name: &str,
        colors: Palette,
        link_base: &str,
        rng: &mut R,
    ) -> SavedPalette {
        if let Some(existing) = self.palettes.iter_mut().find(|p| p.name == name) {
            existing.colors = colors;
            debug!(name, code = %existing.code, "replaced colors of saved palette");
            return existing.clone();
        }

        let code = self.fresh_code(rng);
        let record = SavedPalette {
            name: name.to_string(),
            colors,
            link: link_for(link_base, &code),
            code,
            liked: false,
        };
        info!(name, code = %record.code, "saved new palette");
        self.palettes.push(record.clone());
        record
    }

    /// Codes are uppercase by construction; lookups ignore case.
    pub fn by_code(&self, code: &str) -> Option<&SavedPalette> {
        let code = code.trim();
        self.palettes
            .iter()
            .find(|p| p.code.eq_ignore_ascii_case(code))
    }

    pub fn by_name(&self, name: &str) -> Option<&SavedPalette> {
        self.palettes.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.palettes.iter().map(|p| p.name.clone()).collect()
    }

    /// Flip `liked` on the named record. `None` if there is no such record.
    pub fn toggle_like(&mut self, name: &str) -> Option<SavedPalette> {
        let record = self.palettes.iter_mut().find(|p| p.name == name)?;
        record.liked = !record.liked;
        debug!(name, liked = record.liked, "toggled like");
        Some(record.clone())
    }

    /// Re-rolls until the code is unused in this document.
    fn fresh_code<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        loop {
            let code = generate_code(rng);
            if self.by_code(&code).is_none() {
                return code;
            }
            warn!(%code, "share code collision, re-rolling");
        }
    }
}

/// `CODE_LEN` characters from `[A-Z0-9]`.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

pub fn link_for(link_base: &str, code: &str) -> String {
    format!("{}/{}", link_base.trim_end_matches('/'), code)
}
