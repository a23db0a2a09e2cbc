use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use bloomwake_lib::blooms::{Bloom, BloomStorage};
use bloomwake_lib::config::RitualConfig;
use bloomwake_lib::ritual::MatchClassifier;

/// Shared application state for CLI commands
pub struct App {
    pub storage: BloomStorage,
    pub config: RitualConfig,
}

impl App {
    /// Open the data directory, falling back to the platform default
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => BloomStorage::default_data_dir().context("Failed to get data directory")?,
        };

        let storage = BloomStorage::new(data_dir.clone());
        storage.init().context("Failed to initialize bloom storage")?;

        let config = RitualConfig::load_or_default(&data_dir)
            .with_context(|| format!("Failed to load {}", RitualConfig::path_in(&data_dir).display()))?;

        Ok(Self { storage, config })
    }

    pub fn classifier(&self) -> MatchClassifier {
        MatchClassifier::from_config(&self.config)
    }

    /// Find a bloom by id or title (exact match first, then case-insensitive prefix)
    pub fn find_bloom(&self, query: &str) -> Result<Bloom> {
        let blooms = self.list_blooms()?;
        let query_lower = query.trim().to_lowercase();

        // Exact match first
        if let Some(bloom) = blooms
            .iter()
            .find(|b| b.id == query.trim() || b.title.to_lowercase() == query_lower)
        {
            return Ok(bloom.clone());
        }

        // Prefix match
        let matches: Vec<&Bloom> = blooms
            .iter()
            .filter(|b| {
                b.id.to_lowercase().starts_with(&query_lower)
                    || b.title.to_lowercase().starts_with(&query_lower)
            })
            .collect();

        match matches.len() {
            0 => bail!("No bloom matching '{}'", query),
            1 => Ok(matches[0].clone()),
            _ => bail!(
                "Ambiguous bloom '{}'. Matches:\n{}",
                query,
                matches
                    .iter()
                    .map(|b| format!("  - {} ({})", b.title, b.id))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        }
    }

    pub fn list_blooms(&self) -> Result<Vec<Bloom>> {
        self.storage.list_blooms().context("Failed to list blooms")
    }
}
