//! Bloom ordering and phrase selection

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::blooms::Bloom;

/// Ritual order: blooms with a wake order first (ascending), then the rest by
/// resonance (descending). Ties break on id, so the result is deterministic.
pub fn order_blooms(blooms: Vec<Bloom>) -> Vec<Bloom> {
    let (mut ordered, mut unordered): (Vec<Bloom>, Vec<Bloom>) =
        blooms.into_iter().partition(|b| b.wake_order.is_some());

    ordered.sort_by(|a, b| a.wake_order.cmp(&b.wake_order).then_with(|| a.id.cmp(&b.id)));
    unordered.sort_by(|a, b| by_resonance_desc(a, b).then_with(|| a.id.cmp(&b.id)));

    ordered.extend(unordered);
    ordered
}

fn by_resonance_desc(a: &Bloom, b: &Bloom) -> Ordering {
    b.resonance.total_cmp(&a.resonance)
}

/// A phrase chosen for one ritual pass over a bloom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPhrase {
    /// Position in the bloom's phrase list
    pub index: usize,
    pub text: String,
}

/// Picks the phrase to test, uniformly among the bloom's non-blank phrases
pub struct PhraseResolver<R: Rng> {
    rng: R,
}

impl PhraseResolver<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> PhraseResolver<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn resolve(&mut self, bloom: &Bloom) -> Option<ResolvedPhrase> {
        let candidates: Vec<usize> = bloom
            .wake_phrases
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.trim().is_empty())
            .map(|(i, _)| i)
            .collect();

        if candidates.is_empty() {
            return None;
        }

        let index = candidates[self.rng.gen_range(0..candidates.len())];
        Some(ResolvedPhrase {
            index,
            text: bloom.wake_phrases[index].clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn bloom(id: &str, order: Option<i32>, resonance: f32) -> Bloom {
        Bloom::new(id.to_uppercase(), String::new(), resonance)
            .with_id(id)
            .with_wake_order(order)
    }

    fn ids(blooms: &[Bloom]) -> Vec<&str> {
        blooms.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_wake_order_before_resonance() {
        let blooms = vec![
            bloom("a", Some(50), 0.2),
            bloom("b", Some(10), 0.1),
            bloom("c", None, 0.9),
            bloom("d", None, 0.5),
        ];
        assert_eq!(ids(&order_blooms(blooms)), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_ties_break_on_id() {
        let blooms = vec![
            bloom("z", None, 0.5),
            bloom("m", Some(1), 0.0),
            bloom("k", None, 0.5),
            bloom("c", Some(1), 0.9),
        ];
        assert_eq!(ids(&order_blooms(blooms)), vec!["c", "m", "k", "z"]);
    }

    #[test]
    fn test_order_is_independent_of_input_order() {
        let forward = vec![bloom("a", None, 0.3), bloom("b", Some(2), 0.3), bloom("c", None, 0.7)];
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(ids(&order_blooms(forward)), ids(&order_blooms(reversed)));
    }

    #[test]
    fn test_negative_wake_order_sorts_first() {
        let blooms = vec![bloom("a", Some(0), 0.0), bloom("b", Some(-5), 0.0)];
        assert_eq!(ids(&order_blooms(blooms)), vec!["b", "a"]);
    }

    #[test]
    fn test_resolve_none_without_phrases() {
        let mut resolver = PhraseResolver::seeded(7);
        assert_eq!(resolver.resolve(&bloom("a", None, 0.5)), None);

        let blank = bloom("b", None, 0.5).with_phrases(["", "   "]);
        assert_eq!(resolver.resolve(&blank), None);
    }

    #[test]
    fn test_resolve_skips_blank_phrases() {
        let mut resolver = PhraseResolver::seeded(1);
        let b = bloom("a", None, 0.5).with_phrases(["", "only one", " "]);
        for _ in 0..10 {
            let resolved = resolver.resolve(&b).unwrap();
            assert_eq!(resolved.index, 1);
            assert_eq!(resolved.text, "only one");
        }
    }

    #[test]
    fn test_same_seed_same_choice() {
        let b = bloom("a", None, 0.5).with_phrases(["one", "two", "three", "four"]);
        let mut first = PhraseResolver::seeded(42);
        let mut second = PhraseResolver::seeded(42);
        for _ in 0..20 {
            assert_eq!(first.resolve(&b), second.resolve(&b));
        }
    }

    #[test]
    fn test_every_phrase_reachable() {
        let b = bloom("a", None, 0.5).with_phrases(["one", "two", "three"]);
        let mut resolver = PhraseResolver::seeded(3);
        let seen: HashSet<usize> = (0..200).filter_map(|_| resolver.resolve(&b)).map(|p| p.index).collect();
        assert_eq!(seen.len(), 3);
    }
}
