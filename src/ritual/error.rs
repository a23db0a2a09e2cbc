use thiserror::Error;

use super::token::TokenError;
use crate::blooms::StoreError;

#[derive(Error, Debug)]
pub enum RitualError {
    #[error("engage mode requires an interactive terminal")]
    NonInteractiveInput,

    #[error("Input error: {0}")]
    Input(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("No blooms to wake")]
    NothingToWake,

    #[error("Ritual already complete")]
    AlreadyComplete,

    #[error("Bloom not found: {0}")]
    BloomMissing(String),

    #[error("Bloom {0} has no wake phrase; skip it instead")]
    NoPhrase(String),

    #[error("Wake phrases of bloom {0} changed since the ritual began; begin again")]
    PhraseChanged(String),
}

pub type Result<T> = std::result::Result<T, RitualError>;
