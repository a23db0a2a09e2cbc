//! The wake ritual: recall-gated access to blooms
//!
//! This module provides:
//! - Fuzzy matching of recalled phrases (normalizer, edit distance, keyword overlap)
//! - Progressive hints
//! - Bloom ordering and phrase selection
//! - The per-bloom attempt state machine
//! - The interactive session driver and its summary
//! - A chained, token-carried variant for non-interactive callers

pub mod chained;
pub mod error;
pub mod hints;
pub mod input;
pub mod machine;
pub mod matching;
pub mod selector;
pub mod session;
pub mod summary;
pub mod token;

pub use chained::{ChainResponse, ChainedRitual};
pub use error::RitualError;
pub use input::{InputEvent, InputSource, ScriptedInput, TerminalInput};
pub use machine::{RitualAttempt, RitualState, MAX_ATTEMPTS};
pub use matching::{MatchClassifier, MatchVerdict};
pub use selector::{order_blooms, PhraseResolver};
pub use session::{RitualObserver, RitualSession, SessionOptions, SessionReport};
pub use summary::{SessionOutcome, SessionSummary};
pub use token::{PhrasePin, RitualToken, TokenError};
