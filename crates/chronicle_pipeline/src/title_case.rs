//! Title casing and candidate deduplication.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d+[.)]|[-*\u{2022}])\s+").expect("Valid list marker regex")
});

/// Words kept lowercase unless first or last.
const MINOR_WORDS: &[&str] = &[
    "a", "an", "the", "and", "but", "or", "nor", "for", "so", "yet", "as", "at", "by", "in", "of",
    "off", "on", "per", "to", "up", "via", "with", "from", "into",
];

fn capitalize(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut done = false;
    for ch in word.chars() {
        if !done && ch.is_alphabetic() {
            out.extend(ch.to_uppercase());
            done = true;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// All letters uppercase, and more than one of them.
fn is_acronym(word: &str) -> bool {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() > 1 && letters.iter().all(|c| c.is_uppercase())
}

fn bare(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Title-case a phrase with the fixed minor-word list.
///
/// The first and last words are always capitalized. Hyphenated parts are
/// capitalized individually and the rest of each word is lowercased.
/// All-caps words survive only when the phrase also has lowercase letters;
/// a phrase written entirely in capitals is recased.
///
/// # Examples
///
/// ```
/// use chronicle_pipeline::title_case;
///
/// assert_eq!(title_case("the shadow of the city"), "The Shadow of the City");
/// assert_eq!(title_case("what the tide brought in"), "What the Tide Brought In");
/// assert_eq!(title_case("THE SHADOW OF THE CITY"), "The Shadow of the City");
/// assert_eq!(title_case("tales of the IRON guild"), "Tales of the IRON Guild");
/// ```
pub fn title_case(phrase: &str) -> String {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    let last = words.len().saturating_sub(1);
    let shouting = !phrase.chars().any(char::is_lowercase);
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let key = bare(word);
            if i != 0 && i != last && MINOR_WORDS.contains(&key.as_str()) {
                word.to_lowercase()
            } else if !shouting && is_acronym(word) {
                word.to_string()
            } else {
                word.split('-').map(capitalize).collect::<Vec<_>>().join("-")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize candidates: trim wrapping punctuation, title-case, drop empties,
/// and remove case-insensitive duplicates keeping the first occurrence.
///
/// # Examples
///
/// ```
/// use chronicle_pipeline::normalize_titles;
///
/// let titles = normalize_titles(vec!["salt and iron".into(), "\"Salt And Iron\"".into(), "Ash".into()]);
/// assert_eq!(titles, vec!["Salt and Iron".to_string(), "Ash".to_string()]);
/// ```
pub fn normalize_titles(candidates: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .map(|c| {
            let unlisted = LIST_MARKER.replace(&c, "");
            let trimmed = unlisted
                .trim()
                .trim_matches(|ch| matches!(ch, '"' | '\'' | '\u{201C}' | '\u{201D}' | '*'))
                .trim()
                .to_string();
            title_case(&trimmed)
        })
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_and_last_minor_words_are_capitalized() {
        assert_eq!(title_case("of ships and salt"), "Of Ships and Salt");
        assert_eq!(title_case("what they came for"), "What They Came For");
    }

    #[test]
    fn hyphenated_words_capitalize_each_part() {
        assert_eq!(title_case("the iron-bound ledger"), "The Iron-Bound Ledger");
    }

    #[test]
    fn words_are_recased_after_the_first_letter() {
        assert_eq!(title_case("the sHADOW of tHE city"), "The Shadow of the City");
        assert_eq!(title_case("A WINTER-BOUND PORT"), "A Winter-Bound Port");
    }

    #[test]
    fn all_caps_input_is_recased_but_acronyms_in_mixed_input_survive() {
        let titles = normalize_titles(vec!["THE SHADOW OF THE CITY".into()]);
        assert_eq!(titles, vec!["The Shadow of the City".to_string()]);
        assert_eq!(title_case("tales of the IRON guild"), "Tales of the IRON Guild");
    }

    #[test]
    fn normalization_strips_list_markers() {
        let titles = normalize_titles(vec![
            "1. the last harbor".into(),
            "- The Last Harbor".into(),
            "  ".into(),
        ]);
        assert_eq!(titles, vec!["The Last Harbor".to_string()]);
    }

    #[test]
    fn no_case_insensitive_duplicates() {
        let titles = normalize_titles(vec![
            "Bright Water".into(),
            "bright water".into(),
            "BRIGHT WATER".into(),
            "Dark Water".into(),
        ]);
        let lowered: HashSet<String> = titles.iter().map(|t| t.to_lowercase()).collect();
        assert_eq!(lowered.len(), titles.len());
        assert_eq!(titles.len(), 2);
    }
}
