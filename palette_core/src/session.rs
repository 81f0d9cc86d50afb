use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

use crate::api::{self, CodeRequest, NameRequest, SaveRequest, ToggleLockRequest};
use crate::collection::SavedPalette;
use crate::error::PaletteError;
use crate::harmony::{self, Method};
use crate::merge;
use crate::palette::Palette;
use crate::store::PaletteStore;

/// One client's working palette. Regeneration and lock toggles mutate it in
/// place; nothing is persisted until [`Session::save`].
pub struct Session {
    pub method: Method,
    palette: Palette,
    store: Arc<dyn PaletteStore>,
    rng: StdRng,
}

impl Session {
    pub fn new(store: Arc<dyn PaletteStore>, method: Method) -> Self {
        Self::with_rng(store, method, StdRng::from_entropy())
    }

    /// Starts with a fresh, fully unlocked palette.
    pub fn with_rng(store: Arc<dyn PaletteStore>, method: Method, mut rng: StdRng) -> Self {
        let palette = Palette::from_colors(harmony::generate(method, &mut rng));
        Self {
            method,
            palette,
            store,
            rng,
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn regenerate(&mut self) -> &Palette {
        let fresh = harmony::generate(self.method, &mut self.rng);
        self.palette = merge::merge(fresh, self.palette.swatches());
        &self.palette
    }

    pub fn toggle_lock(&mut self, index: i64) -> Result<&Palette, PaletteError> {
        let req = ToggleLockRequest {
            current_colors: self.palette,
            index_to_toggle: index,
        };
        self.palette = api::toggle_lock(&req)?.colors;
        Ok(&self.palette)
    }

    pub fn save(&self, name: &str) -> Result<SavedPalette, PaletteError> {
        let req = SaveRequest {
            name: name.to_string(),
            colors: self.palette,
        };
        api::save(&req, self.store.as_ref())
    }

    /// Replace the working palette with the saved one, locks included.
    pub fn load_code(&mut self, code: &str) -> Result<Option<SavedPalette>, PaletteError> {
        let found = api::load_by_code(
            &CodeRequest {
                code: code.to_string(),
            },
            self.store.as_ref(),
        )?;
        if let Some(p) = &found {
            self.palette = p.colors;
        }
        Ok(found)
    }

    pub fn open_name(&mut self, name: &str) -> Result<Option<SavedPalette>, PaletteError> {
        let found = api::load_by_name(
            &NameRequest {
                name: name.to_string(),
            },
            self.store.as_ref(),
        )?;
        if let Some(p) = &found {
            self.palette = p.colors;
        }
        Ok(found)
    }

    pub fn toggle_like(&self, name: &str) -> Result<Option<SavedPalette>, PaletteError> {
        api::toggle_like(
            &NameRequest {
                name: name.to_string(),
            },
            self.store.as_ref(),
        )
    }

    pub fn saved_names(&self) -> Result<Vec<String>, PaletteError> {
        Ok(api::list_names(self.store.as_ref())?.names)
    }

    /// Every saved palette, from a single read of the store.
    pub fn saved_palettes(&self) -> Result<Vec<SavedPalette>, PaletteError> {
        Ok(self.store.list_all()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn session(method: Method) -> Session {
        let store = Arc::new(MemoryStore::with_rng("http://x/p", StdRng::seed_from_u64(1)));
        Session::with_rng(store, method, StdRng::seed_from_u64(2))
    }

    #[test]
    fn lock_then_regenerate_keeps_color() -> anyhow::Result<()> {
        let mut s = session(Method::Monochrome);
        let kept = s.palette()[2].color;
        s.toggle_lock(2)?;
        for _ in 0..10 {
            let p = s.regenerate();
            assert_eq!(p[2].color, kept);
            assert!(p[2].locked);
        }
        Ok(())
    }

    #[test]
    fn bad_index_leaves_palette_alone() {
        let mut s = session(Method::Random);
        let before = *s.palette();
        assert!(s.toggle_lock(5).is_err());
        assert!(s.toggle_lock(-1).is_err());
        assert_eq!(*s.palette(), before);
    }

    #[test]
    fn save_then_load_restores_palette() -> anyhow::Result<()> {
        let mut s = session(Method::Triadic);
        s.toggle_lock(0)?;
        let saved_palette = *s.palette();
        let saved = s.save("Sunset")?;

        s.toggle_lock(0)?;
        s.regenerate();
        assert_ne!(*s.palette(), saved_palette);

        assert!(s.load_code(&saved.code)?.is_some());
        assert_eq!(*s.palette(), saved_palette);

        s.regenerate();
        assert!(s.open_name("Sunset")?.is_some());
        assert_eq!(*s.palette(), saved_palette);
        assert_eq!(s.saved_names()?, vec!["Sunset".to_string()]);

        s.toggle_like("Sunset")?;
        let all = s.saved_palettes()?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].code, saved.code);
        assert!(all[0].liked);
        Ok(())
    }

    #[test]
    fn unknown_code_keeps_working_palette() -> anyhow::Result<()> {
        let mut s = session(Method::Random);
        let before = *s.palette();
        assert_eq!(s.load_code("ZZZZZZ")?, None);
        assert_eq!(*s.palette(), before);
        Ok(())
    }
}
