//! Ritual configuration
//!
//! Loaded from `ritual.toml` in the data directory. Every field has a default,
//! so a missing file or a partial file both work.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the config inside the data directory
pub const CONFIG_FILE_NAME: &str = "ritual.toml";

/// Environment variable overriding the session token secret
pub const SECRET_ENV_VAR: &str = "BLOOMWAKE_SECRET";

const DEFAULT_SECRET: &str = "bloomwake-ritual-v1";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables for matching, selection and rendering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RitualConfig {
    /// Maximum edit distance, relative to the target length, still counted as Close
    pub close_threshold: f64,
    /// Minimum keyword overlap ratio counted as Partial
    pub partial_threshold: f64,
    /// Tokens ignored by keyword overlap
    pub stop_words: Vec<String>,
    /// Blooms fetched when no limit is given
    pub default_limit: usize,
    /// Width of the resonance and summary meters
    pub bar_width: usize,
    /// Secret for signing chained ritual tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_secret: Option<String>,
}

pub fn default_stop_words() -> Vec<String> {
    [
        "a", "an", "the", "is", "are", "was", "were", "be", "been", "am", "of", "in", "on", "at",
        "to", "for", "with", "by", "from", "i", "you", "we",
    ]
    .iter()
    .map(|w| w.to_string())
    .collect()
}

impl Default for RitualConfig {
    fn default() -> Self {
        Self {
            close_threshold: 0.20,
            partial_threshold: 0.50,
            stop_words: default_stop_words(),
            default_limit: 20,
            bar_width: 10,
            token_secret: None,
        }
    }
}

impl RitualConfig {
    /// Path of the config file inside a data directory
    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE_NAME)
    }

    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: RitualConfig = toml::from_str(&content)?;
        log::info!("Loaded ritual config from {:?}", path);
        Ok(config)
    }

    /// Load `ritual.toml` from the data directory, or defaults when absent
    pub fn load_or_default(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_in(data_dir);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Secret used to sign chained ritual tokens
    pub fn resolve_secret(&self) -> String {
        std::env::var(SECRET_ENV_VAR)
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.token_secret.clone())
            .unwrap_or_else(|| DEFAULT_SECRET.to_string())
    }
}
