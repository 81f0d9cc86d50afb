use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::harmony::Method;
use crate::store::JsonFileStore;

/// Looked up in the working directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "swatchbox.toml";

/// Runtime settings. Every field is optional in the TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON file holding the saved palettes.
    pub store_path: PathBuf,
    /// Prefix of the share link stored next to each code.
    pub link_base: String,
    /// Method used when a request names none.
    pub default_method: Method,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("palettes.json"),
            link_base: "http://localhost:3000/palette".to_string(),
            default_method: Method::Random,
        }
    }
}

impl Config {
    pub fn load_toml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let config = toml::from_str::<Config>(&text)
            .with_context(|| format!("parse config toml {}", path.display()))?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// An explicit path must exist. Without one, `swatchbox.toml` is used if
    /// present, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path {
            return Self::load_toml_file(path);
        }
        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            Self::load_toml_file(fallback)
        } else {
            debug!("no {DEFAULT_CONFIG_FILE}, using defaults");
            Ok(Self::default())
        }
    }

    pub fn open_store(&self) -> JsonFileStore {
        JsonFileStore::open(&self.store_path, &self.link_base)
    }
}
