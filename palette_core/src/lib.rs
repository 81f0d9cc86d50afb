//! Palette generation, lock merging and persistence.

pub mod api;
pub mod collection;
pub mod color;
pub mod config;
pub mod harmony;
pub mod merge;
pub mod palette;
pub mod store;

mod error;
mod session;

pub use collection::{SavedPalette, SavedPalettes};
pub use color::{Color, Hsl, Lab};
pub use config::Config;
pub use error::{ErrorKind, PaletteError};
pub use harmony::Method;
pub use self::palette::{PALETTE_SIZE, Palette, Swatch};
pub use session::Session;
pub use store::{JsonFileStore, MemoryStore, PaletteStore, StoreError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
