//! Contract between the ritual engine and a knowledge store

use super::models::{ActivationFilter, Bloom};
use super::storage::StoreError;

/// What the ritual needs from whatever holds the blooms.
///
/// Writes are synchronous; the caller observes success or failure before it
/// moves on.
pub trait KnowledgeStore {
    /// Candidate blooms for a session. The engine re-orders them itself.
    fn fetch_candidates(&self, limit: usize, filter: &ActivationFilter) -> Result<Vec<Bloom>, StoreError>;

    /// Look up one bloom
    fn get(&self, id: &str) -> Result<Option<Bloom>, StoreError>;

    /// Persist a newly supplied wake phrase
    fn append_phrase(&self, id: &str, phrase: &str) -> Result<(), StoreError>;

    /// Record that these blooms were seen in a ritual
    fn mark_activated(&self, ids: &[String]) -> Result<(), StoreError>;
}
