//! Progressive hints
//!
//! No hint before the first attempt. Attempt 2 reveals the first word,
//! normalized. Attempt 3 shows the target's own first and last word and
//! blanks everything between.

use super::matching::normalize;

/// Marker standing in for each hidden word
pub const BLANK: &str = "\u{25AF}";

const ELLIPSIS: char = '\u{2026}';

/// Hint shown before `attempt` (1-based). `None` for the first attempt.
pub fn hint(target: &str, attempt: u8) -> Option<String> {
    let normalized = normalize(target);
    let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();

    match attempt {
        0 | 1 => None,
        2 => Some(first_word_hint(&words)),
        _ => {
            let raw: Vec<&str> = target.split_whitespace().collect();
            Some(blanked_hint(&raw).unwrap_or_else(|| first_word_hint(&words)))
        }
    }
}

fn first_word_hint(words: &[&str]) -> String {
    format!("starts with '{}{}'", words.first().copied().unwrap_or(""), ELLIPSIS)
}

/// First and last word kept, interior words blanked. `None` when there is no interior.
fn blanked_hint(words: &[&str]) -> Option<String> {
    if words.len() < 3 {
        return None;
    }

    let last = words.len() - 1;
    let shown: Vec<&str> = words
        .iter()
        .enumerate()
        .map(|(i, w)| if i == 0 || i == last { *w } else { BLANK })
        .collect();
    Some(shown.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_hint_on_first_attempt() {
        assert_eq!(hint("every movement is awareness", 1), None);
    }

    #[test]
    fn test_second_attempt_reveals_first_word() {
        assert_eq!(
            hint("every movement is awareness", 2).unwrap(),
            "starts with 'every\u{2026}'"
        );
        assert_eq!(hint("  Every Movement ", 2).unwrap(), "starts with 'every\u{2026}'");
    }

    #[test]
    fn test_third_attempt_blanks_interior() {
        assert_eq!(
            hint("every movement is awareness", 3).unwrap(),
            "every \u{25AF} \u{25AF} awareness"
        );
        assert_eq!(hint("one two three four five", 3).unwrap(), "one ▯ ▯ ▯ five");
        assert_eq!(hint("a b c", 3).unwrap(), "a ▯ c");
    }

    #[test]
    fn test_third_attempt_keeps_target_casing() {
        assert_eq!(hint("River Stone Flows", 3).unwrap(), "River ▯ Flows");
        assert_eq!(hint("  Salt,  and MOON ", 3).unwrap(), "Salt, ▯ MOON");
        assert_eq!(hint("River Stone Flows", 2).unwrap(), "starts with 'river…'");
    }

    #[test]
    fn test_short_phrases_fall_back_to_first_word() {
        assert_eq!(hint("river stone", 3).unwrap(), "starts with 'river…'");
        assert_eq!(hint("river", 3).unwrap(), "starts with 'river…'");
    }

    #[test]
    fn test_word_count_preserved() {
        let phrase = "we carry the weight of water";
        let blanked = hint(phrase, 3).unwrap();
        assert_eq!(blanked.split(' ').count(), phrase.split(' ').count());
    }
}
