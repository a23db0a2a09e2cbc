//! Per-bloom attempt state machine
//!
//! ```text
//! Presented ──arm──▶ WaitingForInput ──submit──▶ Classified ──advance──▶ Resolved
//!     │                     ▲                         │
//!     └──decline──▶ Resolved└──────── retry ──────────┘
//! ```
//!
//! The machine only tracks state. Reading input, showing hints and revealing
//! content are left to the driver, which asks the machine what happened.

use super::error::{Result, RitualError};
use super::hints::hint;
use super::matching::{MatchClassifier, MatchVerdict};
use super::summary::SessionOutcome;

/// Attempts allowed per bloom
pub const MAX_ATTEMPTS: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RitualState {
    Presented,
    WaitingForInput,
    Classified(MatchVerdict),
    Resolved(SessionOutcome),
}

impl RitualState {
    fn name(&self) -> &'static str {
        match self {
            Self::Presented => "presented",
            Self::WaitingForInput => "waiting for input",
            Self::Classified(_) => "classified",
            Self::Resolved(_) => "resolved",
        }
    }
}

/// Result of leaving the Classified state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Back to WaitingForInput for another try
    Retry { attempt: u8, hint: Option<String> },
    Resolved(SessionOutcome),
}

/// One bloom's traversal of the ritual
#[derive(Debug, Clone)]
pub struct RitualAttempt {
    bloom_id: String,
    attempt: u8,
    history: Vec<MatchVerdict>,
    target: Option<String>,
    state: RitualState,
}

impl RitualAttempt {
    pub fn new(bloom_id: impl Into<String>) -> Self {
        Self {
            bloom_id: bloom_id.into(),
            attempt: 0,
            history: Vec::new(),
            target: None,
            state: RitualState::Presented,
        }
    }

    /// Pick up a bloom already waiting on its `attempt`-th try
    pub fn resume(bloom_id: impl Into<String>, target: String, attempt: u8) -> Self {
        Self {
            bloom_id: bloom_id.into(),
            attempt: attempt.clamp(1, MAX_ATTEMPTS),
            history: Vec::new(),
            target: Some(target),
            state: RitualState::WaitingForInput,
        }
    }

    pub fn bloom_id(&self) -> &str {
        &self.bloom_id
    }

    pub fn state(&self) -> RitualState {
        self.state
    }

    /// Current attempt number; 0 until the first input is awaited
    pub fn attempt(&self) -> u8 {
        self.attempt
    }

    pub fn history(&self) -> &[MatchVerdict] {
        &self.history
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        match self.state {
            RitualState::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Fix the phrase under test and wait for the first attempt
    pub fn arm(&mut self, target: String) -> Result<()> {
        self.require(matches!(self.state, RitualState::Presented), "arm a phrase")?;
        self.target = Some(target);
        self.attempt = 1;
        self.state = RitualState::WaitingForInput;
        Ok(())
    }

    /// No phrase to test: resolve as skipped
    pub fn decline(&mut self) -> Result<SessionOutcome> {
        self.require(matches!(self.state, RitualState::Presented), "skip")?;
        self.state = RitualState::Resolved(SessionOutcome::Skipped);
        Ok(SessionOutcome::Skipped)
    }

    /// Classify one line of input against the target
    pub fn submit(&mut self, input: &str, classifier: &MatchClassifier) -> Result<MatchVerdict> {
        self.require(matches!(self.state, RitualState::WaitingForInput), "submit input")?;
        let target = self.target.as_deref().unwrap_or_default();
        let verdict = classifier.classify(input, target);
        self.history.push(verdict);
        self.state = RitualState::Classified(verdict);
        Ok(verdict)
    }

    /// Resolve on a recall or on the last attempt, otherwise retry with a hint
    pub fn advance(&mut self) -> Result<Advance> {
        let verdict = match self.state {
            RitualState::Classified(verdict) => verdict,
            other => {
                return Err(RitualError::InvalidTransition {
                    state: other.name(),
                    action: "advance",
                })
            }
        };

        if verdict.is_recalled() {
            self.state = RitualState::Resolved(SessionOutcome::Remembered);
            return Ok(Advance::Resolved(SessionOutcome::Remembered));
        }

        if self.attempt >= MAX_ATTEMPTS {
            self.state = RitualState::Resolved(SessionOutcome::NeededHelp);
            return Ok(Advance::Resolved(SessionOutcome::NeededHelp));
        }

        self.attempt += 1;
        self.state = RitualState::WaitingForInput;
        let target = self.target.as_deref().unwrap_or_default();
        Ok(Advance::Retry {
            attempt: self.attempt,
            hint: hint(target, self.attempt),
        })
    }

    fn require(&self, allowed: bool, action: &'static str) -> Result<()> {
        if allowed {
            Ok(())
        } else {
            Err(RitualError::InvalidTransition {
                state: self.state.name(),
                action,
            })
        }
    }
}
