//! Interactive ritual session
//!
//! Walks the ordered blooms one at a time through the attempt machine, reading
//! one line per attempt. Every bloom that reaches Resolved adds exactly one
//! outcome to the summary; a bloom interrupted mid-attempt adds none.
//!
//! Between blooms the session waits for one more line before presenting the
//! next. That line is never classified; an interrupt or end of input there
//! cancels with the previous bloom already counted.

use rand::Rng;
use serde::Serialize;

use super::error::{Result, RitualError};
use super::input::{InputEvent, InputSource};
use super::machine::{Advance, RitualAttempt, RitualState};
use super::matching::{MatchClassifier, MatchVerdict};
use super::selector::{order_blooms, PhraseResolver};
use super::summary::{SessionOutcome, SessionSummary};
use crate::blooms::{Bloom, KnowledgeStore, StoreError};

/// Receives everything the operator should see during a session
#[allow(unused_variables)]
pub trait RitualObserver {
    fn session_started(&mut self, total: usize) {}

    /// Header and resonance indicator for the next bloom
    fn bloom_presented(&mut self, position: usize, total: usize, bloom: &Bloom) {}

    /// The bloom has no phrase; `prompting` is true when the operator will be asked for one
    fn phrase_missing(&mut self, bloom: &Bloom, prompting: bool) {}

    fn phrase_saved(&mut self, bloom: &Bloom) {}

    fn phrase_save_failed(&mut self, bloom: &Bloom, error: &StoreError) {}

    /// About to block for attempt number `attempt`
    fn awaiting_input(&mut self, attempt: u8) {}

    fn verdict(&mut self, verdict: MatchVerdict, attempt: u8) {}

    fn hint(&mut self, hint: &str) {}

    /// Attempts exhausted; the phrase is shown
    fn phrase_revealed(&mut self, phrase: &str) {}

    /// The bloom resolved; its content is revealed
    fn bloom_resolved(&mut self, bloom: &Bloom, outcome: SessionOutcome) {}

    /// Bloom `position` is done and the session waits before the next one
    fn awaiting_continue(&mut self, position: usize, total: usize) {}

    fn session_finished(&mut self, report: &SessionReport) {}
}

/// Operator controls for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Ask for a phrase when a bloom has none, and store it
    pub set_missing: bool,
    /// Mark resolved blooms as activated in the store
    pub activate: bool,
}

/// Final (or partial, when cancelled) result of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub summary: SessionSummary,
    /// Blooms selected for the session
    pub selected: usize,
    /// Ids of resolved blooms, in ritual order
    pub resolved: Vec<String>,
    pub cancelled: bool,
}

enum Solicited {
    Phrase(String),
    Declined,
    Interrupted,
}

pub struct RitualSession<'a, R: Rng> {
    store: &'a dyn KnowledgeStore,
    classifier: &'a MatchClassifier,
    resolver: PhraseResolver<R>,
    options: SessionOptions,
}

impl<'a, R: Rng> RitualSession<'a, R> {
    pub fn new(
        store: &'a dyn KnowledgeStore,
        classifier: &'a MatchClassifier,
        resolver: PhraseResolver<R>,
        options: SessionOptions,
    ) -> Self {
        Self {
            store,
            classifier,
            resolver,
            options,
        }
    }

    /// Run the ritual over `blooms`, re-ordered for the session.
    ///
    /// Fails before any bloom is presented if `input` is not interactive.
    /// Cancellation is not an error: the report carries `cancelled` and the
    /// outcomes gathered so far.
    pub fn run(
        &mut self,
        blooms: Vec<Bloom>,
        input: &mut dyn InputSource,
        observer: &mut dyn RitualObserver,
    ) -> Result<SessionReport> {
        if !input.is_interactive() {
            return Err(RitualError::NonInteractiveInput);
        }

        let blooms = order_blooms(blooms);
        let total = blooms.len();
        let mut summary = SessionSummary::default();
        let mut resolved = Vec::new();
        let mut cancelled = false;

        log::info!("Wake ritual started with {} blooms", total);
        observer.session_started(total);

        for (idx, bloom) in blooms.iter().enumerate() {
            observer.bloom_presented(idx + 1, total, bloom);

            match self.run_bloom(bloom, input, observer)? {
                Some(outcome) => {
                    log::debug!("Bloom {} resolved as {:?}", bloom.id, outcome);
                    summary.record(outcome);
                    resolved.push(bloom.id.clone());
                    observer.bloom_resolved(bloom, outcome);
                }
                None => {
                    log::info!(
                        "Wake ritual cancelled at bloom {}/{} ({})",
                        idx + 1,
                        total,
                        bloom.id
                    );
                    cancelled = true;
                    break;
                }
            }

            if idx + 1 < total {
                observer.awaiting_continue(idx + 1, total);
                if !matches!(input.read_line()?, InputEvent::Line(_)) {
                    log::info!("Wake ritual cancelled after bloom {}/{}", idx + 1, total);
                    cancelled = true;
                    break;
                }
            }
        }

        if self.options.activate && !resolved.is_empty() {
            if let Err(e) = self.store.mark_activated(&resolved) {
                log::warn!("Failed to mark blooms as activated: {}", e);
            }
        }

        let report = SessionReport {
            summary,
            selected: total,
            resolved,
            cancelled,
        };
        observer.session_finished(&report);
        Ok(report)
    }

    /// Drive one bloom to Resolved. `None` when the session was interrupted.
    fn run_bloom(
        &mut self,
        bloom: &Bloom,
        input: &mut dyn InputSource,
        observer: &mut dyn RitualObserver,
    ) -> Result<Option<SessionOutcome>> {
        let mut attempt = RitualAttempt::new(bloom.id.clone());

        loop {
            match attempt.state() {
                RitualState::Presented => {
                    if let Some(resolved) = self.resolver.resolve(bloom) {
                        attempt.arm(resolved.text)?;
                        continue;
                    }

                    observer.phrase_missing(bloom, self.options.set_missing);
                    if !self.options.set_missing {
                        attempt.decline()?;
                        continue;
                    }

                    match self.solicit_phrase(bloom, input, observer)? {
                        Solicited::Phrase(phrase) => attempt.arm(phrase)?,
                        Solicited::Declined => {
                            attempt.decline()?;
                        }
                        Solicited::Interrupted => return Ok(None),
                    }
                }
                RitualState::WaitingForInput => {
                    observer.awaiting_input(attempt.attempt());
                    match input.read_line()? {
                        InputEvent::Line(line) => {
                            attempt.submit(&line, self.classifier)?;
                        }
                        InputEvent::Interrupted | InputEvent::Closed => return Ok(None),
                    }
                }
                RitualState::Classified(verdict) => {
                    observer.verdict(verdict, attempt.attempt());
                    if let Advance::Retry { hint: Some(hint), .. } = attempt.advance()? {
                        observer.hint(&hint);
                    }
                }
                RitualState::Resolved(outcome) => {
                    if outcome == SessionOutcome::NeededHelp {
                        if let Some(phrase) = attempt.target() {
                            observer.phrase_revealed(phrase);
                        }
                    }
                    return Ok(Some(outcome));
                }
            }
        }
    }

    /// Ask for a phrase for a bloom that has none. A blank line declines.
    ///
    /// A failed write-back is reported but the phrase is still used for
    /// this session.
    fn solicit_phrase(
        &mut self,
        bloom: &Bloom,
        input: &mut dyn InputSource,
        observer: &mut dyn RitualObserver,
    ) -> Result<Solicited> {
        let phrase = match input.read_line()? {
            InputEvent::Line(line) => line.trim().to_string(),
            InputEvent::Interrupted | InputEvent::Closed => return Ok(Solicited::Interrupted),
        };

        if phrase.is_empty() {
            return Ok(Solicited::Declined);
        }

        match self.store.append_phrase(&bloom.id, &phrase) {
            Ok(()) => observer.phrase_saved(bloom),
            Err(e) => {
                log::warn!("Failed to save wake phrase for {}: {}", bloom.id, e);
                observer.phrase_save_failed(bloom, &e);
            }
        }

        Ok(Solicited::Phrase(phrase))
    }
}
