//! Signed session token for the chained ritual
//!
//! Format: `base64(payload json) "." base64(hmac-sha256(payload))`, both
//! URL-safe without padding so the token survives a shell argument.
//!
//! The phrase chosen per bloom is pinned by index and by a keyed digest of its
//! text, so a phrase list edited mid-chain is detected instead of silently
//! testing a different phrase.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use super::summary::{SessionOutcome, SessionSummary};

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Malformed session token")]
    Malformed,

    #[error("Invalid base64 in session token: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Session token signature does not match")]
    BadSignature,

    #[error("Invalid session token payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unusable signing key")]
    Key,
}

/// The phrase a bloom is tested against for the whole chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhrasePin {
    /// Position in the bloom's phrase list at begin
    pub index: usize,
    /// HMAC of the phrase text, base64
    pub digest: String,
}

impl PhrasePin {
    pub fn new(index: usize, phrase: &str, secret: &str) -> Result<Self, TokenError> {
        let digest = mac(secret, phrase.as_bytes())?.finalize().into_bytes();
        Ok(Self {
            index,
            digest: URL_SAFE_NO_PAD.encode(digest),
        })
    }

    /// True if `phrase` is the text that was pinned
    pub fn matches(&self, phrase: &str, secret: &str) -> Result<bool, TokenError> {
        let digest = URL_SAFE_NO_PAD.decode(&self.digest)?;
        Ok(mac(secret, phrase.as_bytes())?.verify_slice(&digest).is_ok())
    }
}

/// Everything needed to resume a chained ritual on the next invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RitualToken {
    pub session_id: String,
    /// Blooms in ritual order
    pub bloom_ids: Vec<String>,
    /// Phrase chosen per bloom at begin; `None` for blooms with no phrase
    pub phrases: Vec<Option<PhrasePin>>,
    pub current_index: usize,
    /// Attempt number the current bloom is waiting on
    pub attempt: u8,
    #[serde(flatten)]
    pub summary: SessionSummary,
    pub created_at: i64,
}

impl RitualToken {
    pub fn new(bloom_ids: Vec<String>, phrases: Vec<Option<PhrasePin>>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            bloom_ids,
            phrases,
            current_index: 0,
            attempt: 1,
            summary: SessionSummary::default(),
            created_at: Utc::now().timestamp(),
        }
    }

    pub fn current_bloom_id(&self) -> Option<&str> {
        self.bloom_ids.get(self.current_index).map(|s| s.as_str())
    }

    pub fn current_phrase(&self) -> Option<&PhrasePin> {
        self.phrases.get(self.current_index).and_then(Option::as_ref)
    }

    pub fn total(&self) -> usize {
        self.bloom_ids.len()
    }

    /// 1-based position of the current bloom, capped at the total
    pub fn position(&self) -> usize {
        (self.current_index + 1).min(self.total())
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.bloom_ids.len()
    }

    /// Record the current bloom's outcome and move on
    pub fn resolve(&mut self, outcome: SessionOutcome) {
        self.summary.record(outcome);
        self.current_index += 1;
        self.attempt = 1;
    }

    pub fn sign(&self, secret: &str) -> Result<String, TokenError> {
        let payload = serde_json::to_vec(self)?;
        let signature = mac(secret, &payload)?.finalize().into_bytes();
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    pub fn verify(token: &str, secret: &str) -> Result<Self, TokenError> {
        let (payload_b64, signature_b64) = token.trim().split_once('.').ok_or(TokenError::Malformed)?;
        if signature_b64.contains('.') {
            return Err(TokenError::Malformed);
        }

        let payload = URL_SAFE_NO_PAD.decode(payload_b64)?;
        let signature = URL_SAFE_NO_PAD.decode(signature_b64)?;

        mac(secret, &payload)?
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let token: RitualToken = serde_json::from_slice(&payload)?;
        if token.phrases.len() != token.bloom_ids.len() {
            return Err(TokenError::Malformed);
        }
        Ok(token)
    }
}

fn mac(secret: &str, payload: &[u8]) -> Result<HmacSha256, TokenError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::Key)?;
    mac.update(payload);
    Ok(mac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> RitualToken {
        RitualToken::new(
            vec!["one".to_string(), "two".to_string()],
            vec![Some(PhrasePin::new(0, "river stone", "secret").unwrap()), None],
        )
    }

    #[test]
    fn test_sign_then_verify() {
        let mut issued = token();
        issued.resolve(SessionOutcome::Remembered);

        let signed = issued.sign("secret").unwrap();
        let verified = RitualToken::verify(&signed, "secret").unwrap();

        assert_eq!(verified, issued);
        assert_eq!(verified.current_bloom_id(), Some("two"));
        assert_eq!(verified.current_phrase(), None);
        assert_eq!(verified.summary.remembered, 1);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signed = token().sign("secret").unwrap();
        assert!(matches!(
            RitualToken::verify(&signed, "other"),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let issued = token();
        let signed = issued.sign("secret").unwrap();
        let (_, signature) = signed.split_once('.').unwrap();

        let mut forged = issued.clone();
        forged.summary.remembered = 2;
        forged.current_index = 2;
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());

        let result = RitualToken::verify(&format!("{}.{}", forged_payload, signature), "secret");
        assert!(matches!(result, Err(TokenError::BadSignature)));
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(matches!(RitualToken::verify("no-dot", "s"), Err(TokenError::Malformed)));
        assert!(matches!(RitualToken::verify("a.b.c", "s"), Err(TokenError::Malformed)));
        assert!(matches!(RitualToken::verify("%%%.abc", "s"), Err(TokenError::Encoding(_))));
    }

    #[test]
    fn test_phrase_pin_detects_changed_text() {
        let t = token();
        let pin = t.current_phrase().unwrap();

        assert_eq!(pin.index, 0);
        assert!(pin.matches("river stone", "secret").unwrap());
        assert!(!pin.matches("river stones", "secret").unwrap());
        assert!(!pin.matches("river stone", "other").unwrap());
        assert!(!pin.digest.contains("river"));
    }

    #[test]
    fn test_phrase_count_must_match_blooms() {
        let mut t = token();
        t.phrases.pop();
        let signed = t.sign("secret").unwrap();

        assert!(matches!(RitualToken::verify(&signed, "secret"), Err(TokenError::Malformed)));
    }

    #[test]
    fn test_progress_accessors() {
        let mut t = token();
        assert_eq!(t.position(), 1);
        assert_eq!(t.attempt, 1);

        t.attempt = 3;
        t.resolve(SessionOutcome::NeededHelp);
        assert_eq!(t.attempt, 1);
        t.resolve(SessionOutcome::Skipped);

        assert!(t.is_complete());
        assert_eq!(t.position(), 2);
        assert_eq!(t.current_bloom_id(), None);
        assert_eq!(t.summary.total(), 2);
    }
}
