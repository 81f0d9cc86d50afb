//! Palette persistence.
//!
//! [`PaletteStore`] is the capability handed to the rest of the crate.
//! [`JsonFileStore`] keeps every saved palette in one JSON file that is read
//! in full before each operation and rewritten in full after each mutation.
//! [`MemoryStore`] has the same semantics without a file.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::collection::{SavedPalette, SavedPalettes};
use crate::palette::Palette;

/// Read/write failure of the backing store. Always distinct from "not found".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("palette store unavailable: cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("palette store unavailable: cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("palette store unavailable: {} is not a palette file: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("palette store unavailable: cannot lock {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("palette store unavailable: a previous writer panicked")]
    Poisoned,
}

pub trait PaletteStore: Send + Sync {
    /// Upsert keyed by `name`. See [`SavedPalettes::upsert`].
    fn save(&self, name: &str, colors: &Palette) -> Result<SavedPalette, StoreError>;

    fn find_by_code(&self, code: &str) -> Result<Option<SavedPalette>, StoreError>;

    fn find_by_name(&self, name: &str) -> Result<Option<SavedPalette>, StoreError>;

    /// Names in first-save order.
    fn list_names(&self) -> Result<Vec<String>, StoreError>;

    /// Every record in first-save order, read from one snapshot.
    fn list_all(&self) -> Result<Vec<SavedPalette>, StoreError>;

    fn toggle_like(&self, name: &str) -> Result<Option<SavedPalette>, StoreError>;
}

/// File-backed store.
///
/// Every mutation holds `writer` and an exclusive OS lock on the sibling
/// `<file>.lock` across its whole load/modify/write cycle, so concurrent saves
/// cannot lose each other's records whether they go through one instance,
/// several instances or several processes. The file is replaced by an atomic
/// rename, so readers never see a partial write and need no lock.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    link_base: String,
    /// Writer lock; also owns the RNG used for share codes.
    writer: Mutex<StdRng>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>, link_base: impl Into<String>) -> Self {
        Self::with_rng(path, link_base, StdRng::from_entropy())
    }

    pub fn with_rng(path: impl Into<PathBuf>, link_base: impl Into<String>, rng: StdRng) -> Self {
        Self {
            path: path.into(),
            link_base: link_base.into(),
            writer: Mutex::new(rng),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whole document. A missing or empty file is an empty store.
    pub fn load(&self) -> Result<SavedPalettes, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no palette file yet");
                return Ok(SavedPalettes::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if text.trim().is_empty() {
            return Ok(SavedPalettes::new());
        }

        serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Write to a temp file next to the target, then rename over it.
    fn write(&self, doc: &SavedPalettes) -> Result<(), StoreError> {
        let write_err = |source: io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let json = serde_json::to_string_pretty(doc).map_err(|e| write_err(io::Error::other(e)))?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        debug!(path = %self.path.display(), records = doc.len(), "wrote palette file");
        Ok(())
    }

    /// Path of the advisory lock file guarding writers of `path`.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn lock(&self) -> Result<WriteGuard<'_>, StoreError> {
        let rng = self.writer.lock().map_err(|_| StoreError::Poisoned)?;

        let path = self.lock_path();
        let lock_err = |source: io::Error| StoreError::Lock {
            path: path.clone(),
            source,
        };
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(lock_err)?;
        file.lock().map_err(lock_err)?;

        Ok(WriteGuard { rng, _file: file })
    }
}

/// Held for one load/modify/write cycle. Dropping it closes the lock file,
/// which releases the OS lock.
struct WriteGuard<'a> {
    rng: MutexGuard<'a, StdRng>,
    _file: fs::File,
}

impl PaletteStore for JsonFileStore {
    fn save(&self, name: &str, colors: &Palette) -> Result<SavedPalette, StoreError> {
        let mut guard = self.lock()?;
        let mut doc = self.load()?;
        let saved = doc.upsert(name, *colors, &self.link_base, &mut *guard.rng);
        self.write(&doc)?;
        Ok(saved)
    }

    fn find_by_code(&self, code: &str) -> Result<Option<SavedPalette>, StoreError> {
        Ok(self.load()?.by_code(code).cloned())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<SavedPalette>, StoreError> {
        Ok(self.load()?.by_name(name).cloned())
    }

    fn list_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.load()?.names())
    }

    fn list_all(&self) -> Result<Vec<SavedPalette>, StoreError> {
        Ok(self.load()?.palettes)
    }

    fn toggle_like(&self, name: &str) -> Result<Option<SavedPalette>, StoreError> {
        let _guard = self.lock()?;
        let mut doc = self.load()?;
        let Some(updated) = doc.toggle_like(name) else {
            return Ok(None);
        };
        self.write(&doc)?;
        Ok(Some(updated))
    }
}

/// In-process store with the same semantics as [`JsonFileStore`].
#[derive(Debug)]
pub struct MemoryStore {
    link_base: String,
    inner: Mutex<(SavedPalettes, StdRng)>,
}

impl MemoryStore {
    pub fn new(link_base: impl Into<String>) -> Self {
        Self::with_rng(link_base, StdRng::from_entropy())
    }

    pub fn with_rng(link_base: impl Into<String>, rng: StdRng) -> Self {
        Self {
            link_base: link_base.into(),
            inner: Mutex::new((SavedPalettes::new(), rng)),
        }
    }

    pub fn snapshot(&self) -> Result<SavedPalettes, StoreError> {
        Ok(self.lock()?.0.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, (SavedPalettes, StdRng)>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl PaletteStore for MemoryStore {
    fn save(&self, name: &str, colors: &Palette) -> Result<SavedPalette, StoreError> {
        let mut guard = self.lock()?;
        let (doc, rng) = &mut *guard;
        Ok(doc.upsert(name, *colors, &self.link_base, rng))
    }

    fn find_by_code(&self, code: &str) -> Result<Option<SavedPalette>, StoreError> {
        Ok(self.lock()?.0.by_code(code).cloned())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<SavedPalette>, StoreError> {
        Ok(self.lock()?.0.by_name(name).cloned())
    }

    fn list_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.lock()?.0.names())
    }

    fn list_all(&self) -> Result<Vec<SavedPalette>, StoreError> {
        Ok(self.lock()?.0.palettes.clone())
    }

    fn toggle_like(&self, name: &str) -> Result<Option<SavedPalette>, StoreError> {
        Ok(self.lock()?.0.toggle_like(name))
    }
}
