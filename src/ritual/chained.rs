//! Chained ritual: one step per invocation, state carried in a signed token
//!
//! `begin` hands out the first prompt and a token; each `respond` or `skip`
//! verifies the token, advances the current bloom through the same attempt
//! machine the interactive session uses, and hands back a fresh token.

use rand::Rng;
use serde::Serialize;

use super::error::{Result, RitualError};
use super::machine::{Advance, RitualAttempt, MAX_ATTEMPTS};
use super::matching::{MatchClassifier, MatchVerdict};
use super::selector::{order_blooms, PhraseResolver};
use super::summary::{SessionOutcome, SessionSummary};
use super::token::{PhrasePin, RitualToken};
use crate::blooms::{Bloom, KnowledgeStore};

/// What a caller sees of a bloom before recalling it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BloomPrompt {
    pub id: String,
    pub title: String,
    pub resonance: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wake_order: Option<i32>,
    pub has_wake_phrase: bool,
}

impl From<&Bloom> for BloomPrompt {
    fn from(bloom: &Bloom) -> Self {
        Self {
            id: bloom.id.clone(),
            title: bloom.title.clone(),
            resonance: bloom.resonance,
            wake_order: bloom.wake_order,
            has_wake_phrase: bloom.has_wake_phrase(),
        }
    }
}

/// A resolved bloom, content included
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BloomReveal {
    pub id: String,
    pub title: String,
    pub content: String,
    pub resonance: f32,
    /// The phrase that was asked for, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wake_phrase: Option<String>,
}

impl BloomReveal {
    fn new(bloom: &Bloom, wake_phrase: Option<String>) -> Self {
        Self {
            id: bloom.id.clone(),
            title: bloom.title.clone(),
            content: bloom.content().to_string(),
            resonance: bloom.resonance,
            wake_phrase,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    #[serde(flatten)]
    pub counts: SessionSummary,
}

/// One step's reply, tagged by `status`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChainResponse {
    RitualStarted {
        session: String,
        prompt: BloomPrompt,
        progress: Progress,
    },
    Remembered {
        verdict: MatchVerdict,
        bloom: BloomReveal,
        session: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        next: Option<BloomPrompt>,
        progress: Progress,
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<SessionSummary>,
    },
    Incorrect {
        verdict: MatchVerdict,
        attempt: u8,
        max_attempts: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
        prompt: BloomPrompt,
        session: String,
    },
    Revealed {
        bloom: BloomReveal,
        session: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        next: Option<BloomPrompt>,
        progress: Progress,
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<SessionSummary>,
    },
    Skipped {
        bloom: BloomReveal,
        session: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        next: Option<BloomPrompt>,
        progress: Progress,
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<SessionSummary>,
    },
    Error {
        error: String,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        expected_id: Option<String>,
    },
}

impl ChainResponse {
    fn wrong_bloom(expected: &str, got: &str) -> Self {
        Self::Error {
            error: "invalid_bloom_id".to_string(),
            message: format!("Expected bloom {}, got {}", expected, got),
            expected_id: Some(expected.to_string()),
        }
    }
}

/// Position after a bloom resolves: next prompt, or the final summary
struct Followup {
    next: Option<BloomPrompt>,
    progress: Progress,
    summary: Option<SessionSummary>,
}

pub struct ChainedRitual<'a> {
    store: &'a dyn KnowledgeStore,
    classifier: &'a MatchClassifier,
    secret: &'a str,
    activate: bool,
}

impl<'a> ChainedRitual<'a> {
    pub fn new(store: &'a dyn KnowledgeStore, classifier: &'a MatchClassifier, secret: &'a str) -> Self {
        Self {
            store,
            classifier,
            secret,
            activate: true,
        }
    }

    /// Whether `begin` marks the selected blooms as activated
    pub fn with_activation(mut self, activate: bool) -> Self {
        self.activate = activate;
        self
    }

    /// Start a chain over `blooms`, fixing the order and the phrase per bloom
    pub fn begin<R: Rng>(&self, blooms: Vec<Bloom>, resolver: &mut PhraseResolver<R>) -> Result<ChainResponse> {
        let blooms = order_blooms(blooms);
        let first = blooms.first().ok_or(RitualError::NothingToWake)?;

        let phrases = blooms
            .iter()
            .map(|b| {
                resolver
                    .resolve(b)
                    .map(|p| PhrasePin::new(p.index, &p.text, self.secret))
                    .transpose()
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let token = RitualToken::new(blooms.iter().map(|b| b.id.clone()).collect(), phrases);
        log::info!(
            "Chained ritual {} started with {} blooms",
            token.session_id,
            token.total()
        );

        if self.activate {
            if let Err(e) = self.store.mark_activated(&token.bloom_ids) {
                log::warn!("Failed to mark blooms as activated: {}", e);
            }
        }

        Ok(ChainResponse::RitualStarted {
            session: token.sign(self.secret)?,
            prompt: BloomPrompt::from(first),
            progress: progress(&token),
        })
    }

    /// Check `phrase` against the current bloom's phrase
    pub fn respond(&self, bloom_id: &str, phrase: &str, session: &str) -> Result<ChainResponse> {
        let mut token = RitualToken::verify(session, self.secret)?;
        let expected = token.current_bloom_id().ok_or(RitualError::AlreadyComplete)?.to_string();
        if bloom_id != expected {
            return Ok(ChainResponse::wrong_bloom(&expected, bloom_id));
        }

        let bloom = self.fetch(&expected)?;
        let pin = token
            .current_phrase()
            .ok_or_else(|| RitualError::NoPhrase(expected.clone()))?;
        let target = match bloom.wake_phrases.get(pin.index) {
            Some(phrase) if pin.matches(phrase, self.secret)? => phrase.clone(),
            _ => {
                log::warn!("Wake phrase {} of bloom {} changed mid-chain", pin.index, expected);
                return Err(RitualError::PhraseChanged(expected));
            }
        };

        let mut attempt = RitualAttempt::resume(expected.as_str(), target.clone(), token.attempt);
        let verdict = attempt.submit(phrase, self.classifier)?;

        match attempt.advance()? {
            Advance::Retry { attempt, hint } => {
                token.attempt = attempt;
                Ok(ChainResponse::Incorrect {
                    verdict,
                    attempt,
                    max_attempts: MAX_ATTEMPTS,
                    hint,
                    prompt: BloomPrompt::from(&bloom),
                    session: token.sign(self.secret)?,
                })
            }
            Advance::Resolved(outcome) => {
                log::debug!("Bloom {} resolved as {:?}", expected, outcome);
                token.resolve(outcome);
                let followup = self.followup(&token)?;
                let bloom = BloomReveal::new(&bloom, Some(target));
                let session = token.sign(self.secret)?;

                Ok(match outcome {
                    SessionOutcome::Remembered => ChainResponse::Remembered {
                        verdict,
                        bloom,
                        session,
                        next: followup.next,
                        progress: followup.progress,
                        summary: followup.summary,
                    },
                    _ => ChainResponse::Revealed {
                        bloom,
                        session,
                        next: followup.next,
                        progress: followup.progress,
                        summary: followup.summary,
                    },
                })
            }
        }
    }

    /// Resolve the current bloom as skipped
    pub fn skip(&self, bloom_id: &str, session: &str) -> Result<ChainResponse> {
        let mut token = RitualToken::verify(session, self.secret)?;
        let expected = token.current_bloom_id().ok_or(RitualError::AlreadyComplete)?.to_string();
        if bloom_id != expected {
            return Ok(ChainResponse::wrong_bloom(&expected, bloom_id));
        }

        let bloom = self.fetch(&expected)?;
        let outcome = RitualAttempt::new(expected.as_str()).decline()?;
        log::debug!("Bloom {} resolved as {:?}", expected, outcome);
        token.resolve(outcome);
        let followup = self.followup(&token)?;

        Ok(ChainResponse::Skipped {
            bloom: BloomReveal::new(&bloom, None),
            session: token.sign(self.secret)?,
            next: followup.next,
            progress: followup.progress,
            summary: followup.summary,
        })
    }

    fn fetch(&self, id: &str) -> Result<Bloom> {
        self.store
            .get(id)?
            .ok_or_else(|| RitualError::BloomMissing(id.to_string()))
    }

    fn followup(&self, token: &RitualToken) -> Result<Followup> {
        let next = match token.current_bloom_id() {
            Some(id) => Some(BloomPrompt::from(&self.fetch(id)?)),
            None => {
                log::info!("Chained ritual {} complete", token.session_id);
                None
            }
        };

        Ok(Followup {
            summary: next.is_none().then_some(token.summary),
            next,
            progress: progress(token),
        })
    }
}

fn progress(token: &RitualToken) -> Progress {
    Progress {
        current: token.position(),
        total: token.total(),
        counts: token.summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blooms::{ActivationFilter, StoreError};
    use crate::ritual::hints::hint;
    use std::cell::RefCell;

    const SECRET: &str = "test-secret";

    #[derive(Default)]
    struct MemoryStore {
        blooms: Vec<Bloom>,
        activated: RefCell<Vec<String>>,
    }

    impl KnowledgeStore for MemoryStore {
        fn fetch_candidates(&self, limit: usize, _filter: &ActivationFilter) -> std::result::Result<Vec<Bloom>, StoreError> {
            Ok(self.blooms.iter().take(limit).cloned().collect())
        }

        fn get(&self, id: &str) -> std::result::Result<Option<Bloom>, StoreError> {
            Ok(self.blooms.iter().find(|b| b.id == id).cloned())
        }

        fn append_phrase(&self, id: &str, _phrase: &str) -> std::result::Result<(), StoreError> {
            Err(StoreError::NotFound(id.to_string()))
        }

        fn mark_activated(&self, ids: &[String]) -> std::result::Result<(), StoreError> {
            self.activated.borrow_mut().extend(ids.iter().cloned());
            Ok(())
        }
    }

    fn bloom(id: &str, order: i32, phrases: &[&str]) -> Bloom {
        Bloom::new(id.to_string(), format!("{} body", id), 0.5)
            .with_id(id)
            .with_wake_order(Some(order))
            .with_phrases(phrases.iter().copied())
    }

    fn store() -> MemoryStore {
        MemoryStore {
            blooms: vec![
                bloom("one", 1, &["a b c"]),
                bloom("two", 2, &["every movement is awareness"]),
                bloom("three", 3, &[]),
            ],
            ..Default::default()
        }
    }

    fn begin(ritual: &ChainedRitual, store: &MemoryStore) -> String {
        match ritual.begin(store.blooms.clone(), &mut PhraseResolver::seeded(5)).unwrap() {
            ChainResponse::RitualStarted { session, prompt, progress } => {
                assert_eq!(prompt.id, "one");
                assert_eq!(progress.current, 1);
                assert_eq!(progress.total, 3);
                session
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    fn session_of(response: &ChainResponse) -> String {
        match response {
            ChainResponse::RitualStarted { session, .. }
            | ChainResponse::Remembered { session, .. }
            | ChainResponse::Incorrect { session, .. }
            | ChainResponse::Revealed { session, .. }
            | ChainResponse::Skipped { session, .. } => session.clone(),
            ChainResponse::Error { .. } => panic!("no session on error"),
        }
    }

    #[test]
    fn test_full_chain_one_of_each() {
        let store = store();
        let classifier = MatchClassifier::default();
        let ritual = ChainedRitual::new(&store, &classifier, SECRET);
        let session = begin(&ritual, &store);

        let response = ritual.respond("one", "A  B C", &session).unwrap();
        match &response {
            ChainResponse::Remembered { verdict, next, summary, progress, .. } => {
                assert_eq!(*verdict, MatchVerdict::Exact);
                assert_eq!(next.as_ref().unwrap().id, "two");
                assert!(summary.is_none());
                assert_eq!(progress.current, 2);
            }
            other => panic!("unexpected response: {:?}", other),
        }

        let target = "every movement is awareness";
        let mut session = session_of(&response);
        for expected_attempt in [2u8, 3] {
            let response = ritual.respond("two", "nothing alike", &session).unwrap();
            match &response {
                ChainResponse::Incorrect { attempt, hint: h, max_attempts, .. } => {
                    assert_eq!(*attempt, expected_attempt);
                    assert_eq!(*max_attempts, 3);
                    assert_eq!(*h, hint(target, expected_attempt));
                }
                other => panic!("unexpected response: {:?}", other),
            }
            session = session_of(&response);
        }

        let response = ritual.respond("two", "nothing alike", &session).unwrap();
        match &response {
            ChainResponse::Revealed { bloom, next, .. } => {
                assert_eq!(bloom.wake_phrase.as_deref(), Some(target));
                assert_eq!(bloom.content, "two body");
                assert_eq!(next.as_ref().unwrap().id, "three");
                assert!(!next.as_ref().unwrap().has_wake_phrase);
            }
            other => panic!("unexpected response: {:?}", other),
        }

        let response = ritual.skip("three", &session_of(&response)).unwrap();
        match &response {
            ChainResponse::Skipped { next, summary, progress, .. } => {
                assert!(next.is_none());
                let summary = summary.unwrap();
                assert_eq!((summary.remembered, summary.needed_help, summary.skipped), (1, 1, 1));
                assert_eq!(progress.current, 3);
            }
            other => panic!("unexpected response: {:?}", other),
        }

        let finished = session_of(&response);
        assert!(matches!(
            ritual.skip("three", &finished),
            Err(RitualError::AlreadyComplete)
        ));
    }

    #[test]
    fn test_wrong_bloom_id_keeps_state() {
        let store = store();
        let classifier = MatchClassifier::default();
        let ritual = ChainedRitual::new(&store, &classifier, SECRET);
        let session = begin(&ritual, &store);

        let response = ritual.respond("two", "a b c", &session).unwrap();
        assert_eq!(
            response,
            ChainResponse::Error {
                error: "invalid_bloom_id".to_string(),
                message: "Expected bloom one, got two".to_string(),
                expected_id: Some("one".to_string()),
            }
        );

        // The unused token is still valid
        assert!(matches!(
            ritual.respond("one", "a b c", &session).unwrap(),
            ChainResponse::Remembered { .. }
        ));
    }

    #[test]
    fn test_respond_without_phrase_is_an_error() {
        let store = MemoryStore {
            blooms: vec![bloom("three", 1, &[])],
            ..Default::default()
        };
        let classifier = MatchClassifier::default();
        let ritual = ChainedRitual::new(&store, &classifier, SECRET);
        let session = session_of(&ritual.begin(store.blooms.clone(), &mut PhraseResolver::seeded(1)).unwrap());

        assert!(matches!(
            ritual.respond("three", "anything", &session),
            Err(RitualError::NoPhrase(_))
        ));
    }

    #[test]
    fn test_removed_phrase_invalidates_session() {
        let store = MemoryStore {
            blooms: vec![bloom("one", 1, &["a b c"])],
            ..Default::default()
        };
        let classifier = MatchClassifier::default();
        let ritual = ChainedRitual::new(&store, &classifier, SECRET);
        let session = session_of(&ritual.begin(store.blooms.clone(), &mut PhraseResolver::seeded(1)).unwrap());

        // "a b c" removed and another phrase now sits at the same index
        let edited = MemoryStore {
            blooms: vec![bloom("one", 1, &["x y z"])],
            ..Default::default()
        };
        let after_edit = ChainedRitual::new(&edited, &classifier, SECRET);
        assert!(matches!(
            after_edit.respond("one", "x y z", &session),
            Err(RitualError::PhraseChanged(id)) if id == "one"
        ));

        let emptied = MemoryStore {
            blooms: vec![bloom("one", 1, &[])],
            ..Default::default()
        };
        let after_removal = ChainedRitual::new(&emptied, &classifier, SECRET);
        assert!(matches!(
            after_removal.respond("one", "a b c", &session),
            Err(RitualError::PhraseChanged(_))
        ));

        // Skipping does not need the phrase
        assert!(matches!(
            after_edit.skip("one", &session).unwrap(),
            ChainResponse::Skipped { .. }
        ));
    }

    #[test]
    fn test_forged_session_rejected() {
        let store = store();
        let classifier = MatchClassifier::default();
        let ritual = ChainedRitual::new(&store, &classifier, SECRET);
        let session = begin(&ritual, &store);

        let other = ChainedRitual::new(&store, &classifier, "another-secret");
        assert!(matches!(other.skip("one", &session), Err(RitualError::Token(_))));
    }

    #[test]
    fn test_begin_activation_and_empty() {
        let store = store();
        let classifier = MatchClassifier::default();

        let ritual = ChainedRitual::new(&store, &classifier, SECRET).with_activation(false);
        begin(&ritual, &store);
        assert!(store.activated.borrow().is_empty());

        let ritual = ChainedRitual::new(&store, &classifier, SECRET);
        begin(&ritual, &store);
        assert_eq!(store.activated.borrow().len(), 3);

        assert!(matches!(
            ritual.begin(Vec::new(), &mut PhraseResolver::seeded(1)),
            Err(RitualError::NothingToWake)
        ));
    }

    #[test]
    fn test_response_json_shape() {
        let store = store();
        let classifier = MatchClassifier::default();
        let ritual = ChainedRitual::new(&store, &classifier, SECRET);
        let session = begin(&ritual, &store);

        let response = ritual.respond("one", "a b c", &session).unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "remembered");
        assert_eq!(json["verdict"], "exact");
        assert_eq!(json["bloom"]["wake_phrase"], "a b c");
        assert_eq!(json["next"]["id"], "two");
        assert_eq!(json["progress"]["remembered"], 1);
        assert!(json.get("summary").is_none());
    }
}
