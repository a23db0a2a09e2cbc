//! Storage operations for blooms
//!
//! Directory structure:
//! ```text
//! {data-dir}/blooms/
//! └── {bloom-id}.json   # One file per bloom
//! ```

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use thiserror::Error;

use super::models::{clamp_resonance, ActivationFilter, Bloom};
use super::store::KnowledgeStore;
use crate::ritual::matching::normalize;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bloom not found: {0}")]
    NotFound(String),

    #[error("Invalid wake phrase: {0}")]
    InvalidPhrase(String),

    #[error("Failed to get data directory")]
    DataDirNotFound,

    #[error("Failed to mark {} bloom(s) as activated: {}", .0.len(), .0.join(", "))]
    ActivationIncomplete(Vec<String>),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// File-backed bloom store
pub struct BloomStorage {
    /// Base path for app data (e.g., ~/.local/share/bloomwake)
    base_path: PathBuf,
}

impl BloomStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Default data directory for the current user
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("bloomwake"))
            .ok_or(StoreError::DataDirNotFound)
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    fn blooms_dir(&self) -> PathBuf {
        self.base_path.join("blooms")
    }

    fn bloom_path(&self, id: &str) -> PathBuf {
        self.blooms_dir().join(format!("{}.json", id))
    }

    /// Create the storage directories
    pub fn init(&self) -> Result<()> {
        let dir = self.blooms_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            log::info!("Created bloom storage at {:?}", dir);
        }
        Ok(())
    }

    /// List every bloom, in no particular order
    pub fn list_blooms(&self) -> Result<Vec<Bloom>> {
        let dir = self.blooms_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut blooms = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let content = fs::read_to_string(&path)?;
                let bloom: Bloom = serde_json::from_str(&content)?;
                blooms.push(bloom);
            }
        }

        Ok(blooms)
    }

    /// Get a specific bloom
    pub fn get_bloom(&self, id: &str) -> Result<Bloom> {
        let path = self.bloom_path(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let content = fs::read_to_string(&path)?;
        let bloom: Bloom = serde_json::from_str(&content)?;
        Ok(bloom)
    }

    /// Create a new bloom
    pub fn create_bloom(
        &self,
        title: String,
        body: String,
        resonance: f32,
        phrases: Vec<String>,
        wake_order: Option<i32>,
    ) -> Result<Bloom> {
        self.init()?;

        let mut bloom = Bloom::new(title, body, resonance).with_wake_order(wake_order);
        for phrase in phrases {
            push_phrase(&mut bloom, &phrase)?;
        }

        self.write_bloom(&bloom)?;
        Ok(bloom)
    }

    /// Update an existing bloom
    pub fn update_bloom(&self, bloom: &Bloom) -> Result<()> {
        if !self.bloom_path(&bloom.id).exists() {
            return Err(StoreError::NotFound(bloom.id.clone()));
        }
        let mut bloom = bloom.clone();
        bloom.resonance = clamp_resonance(bloom.resonance);
        bloom.updated_at = Utc::now();
        self.write_bloom(&bloom)
    }

    fn write_bloom(&self, bloom: &Bloom) -> Result<()> {
        fs::write(self.bloom_path(&bloom.id), serde_json::to_string_pretty(bloom)?)?;
        Ok(())
    }

    // ==================== Phrase Operations ====================

    /// Add a wake phrase to a bloom
    pub fn add_phrase(&self, id: &str, phrase: &str) -> Result<Bloom> {
        let mut bloom = self.get_bloom(id)?;
        push_phrase(&mut bloom, phrase)?;
        self.update_bloom(&bloom)?;
        Ok(bloom)
    }

    /// Remove a wake phrase (compared after normalization)
    pub fn remove_phrase(&self, id: &str, phrase: &str) -> Result<Bloom> {
        let mut bloom = self.get_bloom(id)?;
        let wanted = normalize(phrase);
        let before = bloom.wake_phrases.len();
        bloom.wake_phrases.retain(|p| normalize(p) != wanted);

        if bloom.wake_phrases.len() == before {
            return Err(StoreError::InvalidPhrase(format!(
                "'{}' is not a wake phrase of this bloom",
                phrase.trim()
            )));
        }

        self.update_bloom(&bloom)?;
        Ok(bloom)
    }

    /// Set or clear the explicit wake order
    pub fn set_wake_order(&self, id: &str, order: Option<i32>) -> Result<Bloom> {
        let mut bloom = self.get_bloom(id)?;
        bloom.wake_order = order;
        self.update_bloom(&bloom)?;
        Ok(bloom)
    }
}

/// Append a phrase, rejecting blanks and duplicates
fn push_phrase(bloom: &mut Bloom, phrase: &str) -> Result<()> {
    let trimmed = phrase.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidPhrase("phrase is blank".to_string()));
    }

    let normalized = normalize(trimmed);
    if bloom.wake_phrases.iter().any(|p| normalize(p) == normalized) {
        return Err(StoreError::InvalidPhrase(format!(
            "'{}' is already a wake phrase of this bloom",
            trimmed
        )));
    }

    bloom.wake_phrases.push(trimmed.to_string());
    Ok(())
}

impl KnowledgeStore for BloomStorage {
    fn fetch_candidates(&self, limit: usize, filter: &ActivationFilter) -> Result<Vec<Bloom>> {
        Ok(filter.select(self.list_blooms()?, limit, Utc::now()))
    }

    fn get(&self, id: &str) -> Result<Option<Bloom>> {
        match self.get_bloom(id) {
            Ok(bloom) => Ok(Some(bloom)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn append_phrase(&self, id: &str, phrase: &str) -> Result<()> {
        self.add_phrase(id, phrase).map(|_| ())
    }

    fn mark_activated(&self, ids: &[String]) -> Result<()> {
        let now = Utc::now();
        let mut failed = Vec::new();
        for id in ids {
            let marked = self.get_bloom(id).and_then(|mut bloom| {
                bloom.activation_count += 1;
                bloom.last_activated = Some(now);
                self.update_bloom(&bloom)
            });
            if let Err(e) = marked {
                log::warn!("Failed to mark bloom {} as activated: {}", id, e);
                failed.push(id.clone());
            }
        }
        log::debug!("Marked {} of {} blooms as activated", ids.len() - failed.len(), ids.len());

        if failed.is_empty() {
            Ok(())
        } else {
            Err(StoreError::ActivationIncomplete(failed))
        }
    }
}
