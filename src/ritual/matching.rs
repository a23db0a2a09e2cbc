//! Fuzzy matching of a recalled phrase against its target
//!
//! Three tiers, strictest first:
//! - Exact: equal after normalization
//! - Close: edit distance within `close_threshold` of the target length
//! - Partial: at least `partial_threshold` of the target's keywords recalled
//!
//! Anything else is Wrong.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::RitualConfig;

/// Classifier verdict, strongest evidence of recall first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchVerdict {
    Exact,
    Close,
    Partial,
    Wrong,
}

impl MatchVerdict {
    /// Exact or Close
    pub fn is_recalled(self) -> bool {
        matches!(self, Self::Exact | Self::Close)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Close => "close",
            Self::Partial => "partial",
            Self::Wrong => "wrong",
        }
    }
}

/// Lowercase, trim, and collapse whitespace runs to single spaces
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Levenshtein distance over chars
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Tokens ignored by keyword overlap
#[derive(Debug, Clone)]
pub struct StopWords(HashSet<String>);

impl StopWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(words.into_iter().map(|w| normalize(w.as_ref())).collect())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    /// Keyword set of already-normalized text
    pub fn keywords<'a>(&self, normalized: &'a str) -> HashSet<&'a str> {
        normalized
            .split(' ')
            .filter(|t| !t.is_empty() && !self.contains(t))
            .collect()
    }
}

impl Default for StopWords {
    fn default() -> Self {
        Self::new(crate::config::default_stop_words())
    }
}

/// Share of the target's keywords present in the input.
///
/// A target made only of stop words has nothing to overlap with: any
/// non-empty input counts as full overlap, an empty one as none.
pub fn keyword_overlap(input: &str, target: &str, stop_words: &StopWords) -> f64 {
    let input = normalize(input);
    let target = normalize(target);

    let target_keywords = stop_words.keywords(&target);
    if target_keywords.is_empty() {
        return if input.is_empty() { 0.0 } else { 1.0 };
    }

    let input_keywords = stop_words.keywords(&input);
    let shared = input_keywords.intersection(&target_keywords).count();
    shared as f64 / target_keywords.len().max(1) as f64
}

/// Combines the normalizer and both scorers into one verdict
#[derive(Debug, Clone)]
pub struct MatchClassifier {
    stop_words: StopWords,
    close_threshold: f64,
    partial_threshold: f64,
}

impl Default for MatchClassifier {
    fn default() -> Self {
        Self::from_config(&RitualConfig::default())
    }
}

impl MatchClassifier {
    pub fn new(stop_words: StopWords, close_threshold: f64, partial_threshold: f64) -> Self {
        Self {
            stop_words,
            close_threshold,
            partial_threshold,
        }
    }

    pub fn from_config(config: &RitualConfig) -> Self {
        Self::new(
            StopWords::new(&config.stop_words),
            config.close_threshold,
            config.partial_threshold,
        )
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    /// Classify an attempt; the first matching tier wins
    pub fn classify(&self, input: &str, target: &str) -> MatchVerdict {
        let input_norm = normalize(input);
        let target_norm = normalize(target);

        if input_norm == target_norm {
            return MatchVerdict::Exact;
        }

        // Ratio is over the target length only
        let distance = levenshtein(&input_norm, &target_norm);
        let target_len = target_norm.chars().count().max(1);
        if distance as f64 / target_len as f64 <= self.close_threshold {
            return MatchVerdict::Close;
        }

        if keyword_overlap(&input_norm, &target_norm, &self.stop_words) >= self.partial_threshold {
            return MatchVerdict::Partial;
        }

        MatchVerdict::Wrong
    }
}
