//! Request/response contract consumed by the transports (CLI, GUI).
//!
//! Each operation has a typed function; [`handle`] dispatches a tagged
//! [`Request`] to them and folds the outcome into a [`Response`].

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::collection::SavedPalette;
use crate::error::{ErrorKind, PaletteError};
use crate::harmony::{self, Method};
use crate::merge;
use crate::palette::{PALETTE_SIZE, Palette, Swatch};
use crate::store::PaletteStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Unknown or missing tags fall back to random.
    #[serde(default)]
    pub method: Option<String>,
    /// Previous palette, 0 to 5 swatches.
    #[serde(default)]
    pub current_colors: Option<Vec<Swatch>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLockRequest {
    pub current_colors: Palette,
    pub index_to_toggle: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub name: String,
    pub colors: Palette,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeRequest {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteResponse {
    pub colors: Palette,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamesResponse {
    pub names: Vec<String>,
}

pub fn generate<R: Rng + ?Sized>(
    req: &GenerateRequest,
    rng: &mut R,
) -> Result<PaletteResponse, PaletteError> {
    let prior = req.current_colors.as_deref().unwrap_or_default();
    if prior.len() > PALETTE_SIZE {
        return Err(PaletteError::TooManySwatches {
            got: prior.len(),
            max: PALETTE_SIZE,
        });
    }

    let method = Method::resolve(req.method.as_deref());
    let fresh = harmony::generate(method, rng);
    Ok(PaletteResponse {
        colors: merge::merge(fresh, prior),
    })
}

pub fn toggle_lock(req: &ToggleLockRequest) -> Result<PaletteResponse, PaletteError> {
    let index = usize::try_from(req.index_to_toggle).map_err(|_| {
        PaletteError::LockIndexOutOfRange {
            index: req.index_to_toggle,
            len: PALETTE_SIZE,
        }
    })?;
    Ok(PaletteResponse {
        colors: merge::toggle_lock(&req.current_colors, index)?,
    })
}

/// Names are trimmed before they are used as the key.
pub fn save(req: &SaveRequest, store: &dyn PaletteStore) -> Result<SavedPalette, PaletteError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(PaletteError::EmptyName);
    }
    Ok(store.save(name, &req.colors)?)
}

pub fn load_by_code(
    req: &CodeRequest,
    store: &dyn PaletteStore,
) -> Result<Option<SavedPalette>, PaletteError> {
    let code = req.code.trim();
    if code.is_empty() {
        return Err(PaletteError::EmptyCode);
    }
    Ok(store.find_by_code(code)?)
}

pub fn load_by_name(
    req: &NameRequest,
    store: &dyn PaletteStore,
) -> Result<Option<SavedPalette>, PaletteError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(PaletteError::EmptyName);
    }
    Ok(store.find_by_name(name)?)
}

pub fn list_names(store: &dyn PaletteStore) -> Result<NamesResponse, PaletteError> {
    Ok(NamesResponse {
        names: store.list_names()?,
    })
}

pub fn toggle_like(
    req: &NameRequest,
    store: &dyn PaletteStore,
) -> Result<Option<SavedPalette>, PaletteError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(PaletteError::EmptyName);
    }
    Ok(store.toggle_like(name)?)
}

/// One request, tagged by `op`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Request {
    Generate(GenerateRequest),
    ToggleLock(ToggleLockRequest),
    Save(SaveRequest),
    LoadByCode(CodeRequest),
    LoadByName(NameRequest),
    ListNames,
    ToggleLike(NameRequest),
}

impl Request {
    pub fn op(&self) -> &'static str {
        match self {
            Self::Generate(_) => "generate",
            Self::ToggleLock(_) => "toggleLock",
            Self::Save(_) => "save",
            Self::LoadByCode(_) => "loadByCode",
            Self::LoadByName(_) => "loadByName",
            Self::ListNames => "listNames",
            Self::ToggleLike(_) => "toggleLike",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Saved(SavedPalette),
    Palette(PaletteResponse),
    Names(NamesResponse),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

/// `{"ok": ..}`, `{"notFound": {"what": ..}}` or `{"error": {"kind", "message"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Response {
    Ok(Payload),
    NotFound { what: String },
    Error(ErrorBody),
}

impl Response {
    pub fn error(err: &PaletteError) -> Self {
        match err.kind() {
            ErrorKind::Validation => warn!("rejected request: {err}"),
            ErrorKind::StoreUnavailable => error!("store failure: {err}"),
        }
        Self::Error(ErrorBody {
            kind: err.kind(),
            message: err.to_string(),
        })
    }

    fn found(record: Option<SavedPalette>, what: String) -> Self {
        match record {
            Some(p) => Self::Ok(Payload::Saved(p)),
            None => Self::NotFound { what },
        }
    }
}

pub fn handle<R: Rng + ?Sized>(request: Request, store: &dyn PaletteStore, rng: &mut R) -> Response {
    let outcome = match &request {
        Request::Generate(req) => generate(req, rng).map(|r| Response::Ok(Payload::Palette(r))),
        Request::ToggleLock(req) => toggle_lock(req).map(|r| Response::Ok(Payload::Palette(r))),
        Request::Save(req) => save(req, store).map(|p| Response::Ok(Payload::Saved(p))),
        Request::LoadByCode(req) => load_by_code(req, store)
            .map(|p| Response::found(p, format!("no palette with code '{}'", req.code.trim()))),
        Request::LoadByName(req) => load_by_name(req, store)
            .map(|p| Response::found(p, format!("no palette named '{}'", req.name.trim()))),
        Request::ListNames => list_names(store).map(|r| Response::Ok(Payload::Names(r))),
        Request::ToggleLike(req) => toggle_like(req, store)
            .map(|p| Response::found(p, format!("no palette named '{}'", req.name.trim()))),
    };

    outcome.unwrap_or_else(|err| Response::error(&err))
}
