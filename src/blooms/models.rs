//! Data models for blooms

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ritual::selector::order_blooms;

/// A knowledge entry subject to the wake ritual
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bloom {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Importance in [0, 1], the default ordering key
    #[serde(default)]
    pub resonance: f32,
    /// Secret phrases, one of which is asked for per ritual pass
    #[serde(default)]
    pub wake_phrases: Vec<String>,
    /// Explicit position in the ritual, ahead of every unordered bloom
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wake_order: Option<i32>,
    #[serde(default)]
    pub activation_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bloom {
    pub fn new(title: String, body: String, resonance: f32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            body,
            resonance: clamp_resonance(resonance),
            wake_phrases: Vec::new(),
            wake_order: None,
            activation_count: 0,
            last_activated: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wake_phrases = phrases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_wake_order(mut self, order: Option<i32>) -> Self {
        self.wake_order = order;
        self
    }

    /// True if at least one non-blank phrase is set
    pub fn has_wake_phrase(&self) -> bool {
        self.wake_phrases.iter().any(|p| !p.trim().is_empty())
    }

    /// Body text, or a placeholder when empty
    pub fn content(&self) -> &str {
        if self.body.trim().is_empty() {
            "(no content)"
        } else {
            &self.body
        }
    }
}

/// Clamp a resonance value into [0, 1]; NaN becomes 0
pub fn clamp_resonance(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Resonance at or above which a bloom belongs to the core of the cascade
pub const CORE_RESONANCE: f32 = 0.8;

/// How the store picks ritual candidates.
///
/// Without options the candidates are the first `limit` blooms in ritual
/// order. With `activated_within_days` the core (ordered or high resonance
/// blooms) comes first and recently activated blooms fill what is left of
/// the limit. `min_resonance` returns every bloom at or above the threshold
/// and ignores the limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivationFilter {
    pub min_resonance: Option<f32>,
    pub activated_within_days: Option<i64>,
}

impl ActivationFilter {
    /// Blooms that lead the cascade regardless of activation history
    pub fn is_core(bloom: &Bloom) -> bool {
        bloom.wake_order.is_some() || bloom.resonance >= CORE_RESONANCE
    }

    pub fn activated_within(bloom: &Bloom, days: i64, now: DateTime<Utc>) -> bool {
        matches!(bloom.last_activated, Some(at) if now - at <= chrono::Duration::days(days))
    }

    /// Pick candidates out of `blooms`, returned in ritual order
    pub fn select(&self, blooms: Vec<Bloom>, limit: usize, now: DateTime<Utc>) -> Vec<Bloom> {
        let ordered = order_blooms(blooms);

        if let Some(min) = self.min_resonance {
            return ordered.into_iter().filter(|b| b.resonance >= min).collect();
        }

        let Some(days) = self.activated_within_days else {
            return ordered.into_iter().take(limit).collect();
        };

        let (core, rest): (Vec<Bloom>, Vec<Bloom>) = ordered.into_iter().partition(Self::is_core);
        let mut selected: Vec<Bloom> = core.into_iter().take(limit).collect();
        let remaining = limit.saturating_sub(selected.len());
        selected.extend(
            rest.into_iter()
                .filter(|b| Self::activated_within(b, days, now))
                .take(remaining),
        );
        order_blooms(selected)
    }
}

/// Wake phrase filter for listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PhraseFilter {
    #[default]
    Any,
    WithPhrase,
    WithoutPhrase,
}

impl PhraseFilter {
    pub fn matches(self, bloom: &Bloom) -> bool {
        match self {
            Self::Any => true,
            Self::WithPhrase => bloom.has_wake_phrase(),
            Self::WithoutPhrase => !bloom.has_wake_phrase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_resonance_is_clamped() {
        assert_eq!(Bloom::new("a".into(), String::new(), 1.7).resonance, 1.0);
        assert_eq!(Bloom::new("a".into(), String::new(), -0.3).resonance, 0.0);
        assert_eq!(clamp_resonance(f32::NAN), 0.0);
    }

    #[test]
    fn test_blank_phrases_do_not_count() {
        let bloom = Bloom::new("a".into(), String::new(), 0.5).with_phrases(["  ", ""]);
        assert!(!bloom.has_wake_phrase());

        let bloom = bloom.with_phrases(["", "river stone"]);
        assert!(bloom.has_wake_phrase());
    }

    fn bloom(id: &str, resonance: f32) -> Bloom {
        Bloom::new(id.into(), String::new(), resonance).with_id(id)
    }

    fn ids(blooms: &[Bloom]) -> Vec<&str> {
        blooms.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_activated_within() {
        let now = Utc::now();
        let mut b = bloom("a", 0.4);

        assert!(!ActivationFilter::activated_within(&b, 7, now));
        b.last_activated = Some(now - Duration::days(3));
        assert!(ActivationFilter::activated_within(&b, 7, now));
        b.last_activated = Some(now - Duration::days(30));
        assert!(!ActivationFilter::activated_within(&b, 7, now));
    }

    #[test]
    fn test_recent_window_keeps_never_woken_core() {
        let now = Utc::now();
        let blooms = vec![bloom("a", 0.9), bloom("b", 0.9)];
        let filter = ActivationFilter {
            activated_within_days: Some(7),
            ..Default::default()
        };

        assert_eq!(filter.select(blooms, 20, now).len(), 2);
    }

    #[test]
    fn test_recent_blooms_fill_after_core() {
        let now = Utc::now();
        let mut recent = bloom("recent", 0.3);
        recent.last_activated = Some(now - Duration::days(1));
        let mut stale = bloom("stale", 0.5);
        stale.last_activated = Some(now - Duration::days(40));
        let ordered = bloom("ordered", 0.1).with_wake_order(Some(1));
        let blooms = vec![recent, stale, bloom("core", 0.85), ordered, bloom("quiet", 0.6)];

        let filter = ActivationFilter {
            activated_within_days: Some(7),
            ..Default::default()
        };
        assert_eq!(ids(&filter.select(blooms.clone(), 10, now)), vec!["ordered", "core", "recent"]);
        // Core fills the limit first
        assert_eq!(ids(&filter.select(blooms, 2, now)), vec!["ordered", "core"]);
    }

    #[test]
    fn test_min_resonance_ignores_limit() {
        let now = Utc::now();
        let blooms = vec![bloom("a", 0.9), bloom("b", 0.6), bloom("c", 0.2)];
        let filter = ActivationFilter {
            min_resonance: Some(0.5),
            activated_within_days: Some(7),
        };

        assert_eq!(ids(&filter.select(blooms, 1, now)), vec!["a", "b"]);
    }

    #[test]
    fn test_default_filter_takes_limit_in_ritual_order() {
        let now = Utc::now();
        let blooms = vec![bloom("low", 0.1), bloom("high", 0.7), bloom("mid", 0.4)];

        assert_eq!(ids(&ActivationFilter::default().select(blooms, 2, now)), vec!["high", "mid"]);
    }

    #[test]
    fn test_phrase_filter() {
        let with = bloom("with", 0.5).with_phrases(["river stone"]);
        let blank = bloom("blank", 0.5).with_phrases(["  "]);

        assert!(PhraseFilter::Any.matches(&with) && PhraseFilter::Any.matches(&blank));
        assert!(PhraseFilter::WithPhrase.matches(&with));
        assert!(!PhraseFilter::WithPhrase.matches(&blank));
        assert!(PhraseFilter::WithoutPhrase.matches(&blank));
        assert!(!PhraseFilter::WithoutPhrase.matches(&with));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{
            "id": "kn-1",
            "title": "Stillness",
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-01-01T00:00:00Z"
        }"#;
        let bloom: Bloom = serde_json::from_str(json).unwrap();
        assert_eq!(bloom.id, "kn-1");
        assert!(bloom.wake_phrases.is_empty());
        assert_eq!(bloom.wake_order, None);
        assert_eq!(bloom.content(), "(no content)");
    }
}
