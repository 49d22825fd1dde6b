//! Local scan for proper-noun-like phrases that are not anchored to known names.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static CAPITALIZED_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\p{Lu}[\p{L}\p{M}'\u{2019}-]*(?:[ \t]+(?:(?:of|the|de|du|van|von)[ \t]+)?\p{Lu}[\p{L}\p{M}'\u{2019}-]*)*")
        .expect("Valid capitalized run regex")
});

/// Lowercase words the run pattern allows between capitalized words.
const CONNECTORS: &[&str] = &["of", "the", "de", "du", "van", "von"];

/// Capitalized words that are ordinary English at the start of a phrase.
const COMMON_CAPITALIZED: &[&str] = &[
    "i", "a", "an", "the", "and", "but", "or", "he", "she", "it", "they", "we", "you", "his",
    "her", "their", "our", "my", "in", "on", "at", "of", "to", "for", "with", "by", "from",
    "when", "then", "there", "here", "this", "that", "these", "those", "as", "if", "so", "yet",
    "no", "not", "all", "some", "one", "two", "three", "after", "before", "while", "god",
    "gods", "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

/// A phrase found by the local scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The phrase as written
    pub phrase: String,
    /// Surrounding text
    pub context: String,
}

/// Lowercased word tokens.
pub fn name_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '\u{2019}'))
        .filter(|t| !t.is_empty())
        .map(|t| {
            let t = t
                .strip_suffix("'s")
                .or_else(|| t.strip_suffix("\u{2019}s"))
                .unwrap_or(t);
            t.trim_matches(['\'', '\u{2019}']).to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

fn contains_run(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty()
        && needle.len() <= haystack.len()
        && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Whether a phrase names something already known.
///
/// A phrase is known when it equals a known name, is a contiguous token run
/// inside one ("Vale" in "Mira Vale"), or contains one ("Captain Mira Vale").
///
/// # Examples
///
/// ```
/// use chronicle_pipeline::is_known_name;
///
/// let known = vec!["Mira Vale".to_string()];
/// assert!(is_known_name("Vale", &known));
/// assert!(is_known_name("Captain Mira Vale", &known));
/// assert!(!is_known_name("Oren Tesk", &known));
/// ```
pub fn is_known_name(phrase: &str, known: &[String]) -> bool {
    let phrase_tokens = name_tokens(phrase);
    if phrase_tokens.is_empty() {
        return true;
    }
    known.iter().any(|name| {
        let name_tokens = name_tokens(name);
        contains_run(&name_tokens, &phrase_tokens) || contains_run(&phrase_tokens, &name_tokens)
    })
}

fn context_around(content: &str, start: usize, end: usize) -> String {
    let from = content[..start]
        .char_indices()
        .rev()
        .nth(40)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let to = content[end..]
        .char_indices()
        .nth(40)
        .map(|(i, _)| end + i)
        .unwrap_or(content.len());
    content[from..to].split_whitespace().collect::<Vec<_>>().join(" ")
}

fn at_sentence_start(content: &str, start: usize) -> bool {
    match content[..start].trim_end().chars().last() {
        None => true,
        Some(c) => matches!(
            c,
            '.' | '!' | '?' | ':' | '"' | '\u{201C}' | '\u{2014}' | '(' | '[' | '#' | '*' | '>'
        ),
    }
}

/// Find capitalized phrases that do not match any known name.
///
/// Sentence-initial words are dropped from the front of a phrase since their
/// capital letter carries no signal. Results are unique and capped at `limit`.
///
/// # Examples
///
/// ```
/// use chronicle_pipeline::scan_candidates;
///
/// let known = vec!["Mira Vale".to_string()];
/// let found = scan_candidates("Mira Vale met Oren Tesk at the gate.", &known, 10);
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].phrase, "Oren Tesk");
/// ```
pub fn scan_candidates(content: &str, known: &[String], limit: usize) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for m in CAPITALIZED_RUN.find_iter(content) {
        let mut words: Vec<&str> = m.as_str().split_whitespace().collect();
        if at_sentence_start(content, m.start()) {
            words.remove(0);
        }
        while words.first().is_some_and(|w| {
            COMMON_CAPITALIZED.contains(&w.to_lowercase().as_str())
                || w.chars().next().is_some_and(char::is_lowercase)
        }) {
            words.remove(0);
        }
        if words.is_empty() {
            continue;
        }

        let phrase = words.join(" ");
        // A run joined across connectors may pair a known name with an unknown one
        let phrases = if is_known_name(&phrase, known) {
            words
                .split(|w| CONNECTORS.contains(w))
                .filter(|part| !part.is_empty())
                .map(|part| part.join(" "))
                .filter(|part| *part != phrase)
                .collect()
        } else {
            vec![phrase]
        };

        for phrase in phrases {
            let key = phrase.to_lowercase();
            if seen.contains(&key) || is_known_name(&phrase, known) {
                continue;
            }
            seen.insert(key);
            found.push(Candidate {
                context: context_around(content, m.start(), m.end()),
                phrase,
            });
            if found.len() >= limit {
                return found;
            }
        }
    }

    found
}
