//! Narrate configuration.
//!
//! Loaded from `~/.narrate/config.toml`. Every key is optional; a missing
//! file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::selector::DEFAULT_MAX_TEXT_LEN;
use crate::storage::Storage;

/// Narrate configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// The knowledge store file. Defaults to `~/.narrate/knowledge.sqlite`.
    pub store_path: Option<PathBuf>,

    /// Visible-text selectors longer than this are skipped.
    pub max_text_selector_len: usize,

    /// Log filter used when neither `RUST_LOG` nor `-v` is given.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: None,
            max_text_selector_len: DEFAULT_MAX_TEXT_LEN,
            log_filter: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load config from `~/.narrate/config.toml`, or defaults if it does not exist.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if config.max_text_selector_len == 0 {
            return Err(format!(
                "max-text-selector-len must be positive in {}",
                path.display()
            ));
        }

        Ok(config)
    }

    /// The config file path: `~/.narrate/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".narrate").join("config.toml"))
    }

    /// The configured store path, else the default location.
    pub fn store_path(&self) -> Option<PathBuf> {
        self.store_path.clone().or_else(Storage::default_path)
    }
}
