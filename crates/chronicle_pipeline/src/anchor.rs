//! Anchor resolution: locating a placement phrase inside content.

use std::collections::HashMap;
use std::ops::Range;

/// A normalized token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    start: usize,
}

/// Lowercased alphanumeric tokens with their byte offsets.
fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        if ch.is_alphanumeric() {
            if current.is_empty() {
                start = i;
            }
            current.extend(ch.to_lowercase());
        } else if ch == '\'' || ch == '\u{2019}' {
            // Apostrophes stay inside words
            continue;
        } else if !current.is_empty() {
            tokens.push(Token {
                text: std::mem::take(&mut current),
                start,
            });
        }
    }
    if !current.is_empty() {
        tokens.push(Token {
            text: current,
            start,
        });
    }
    tokens
}

/// Fraction of anchor tokens present in a window, counted as multisets.
fn overlap(window: &[Token], anchor: &[String]) -> f64 {
    let mut available: HashMap<&str, usize> = HashMap::new();
    for token in window {
        *available.entry(token.text.as_str()).or_default() += 1;
    }
    let matched = anchor
        .iter()
        .filter(|t| match available.get_mut(t.as_str()) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        })
        .count();
    matched as f64 / anchor.len() as f64
}

/// Resolve an anchor phrase to a byte offset in `content`.
///
/// An exact substring match wins, preferring one inside `preferred`.
/// Otherwise a window of normalized tokens the size of the anchor slides
/// over the content and the best overlap at or above `threshold` wins; ties
/// go to windows inside `preferred`, then to the earliest. A fuzzy match
/// resolves to the first matching token of its window.
///
/// # Examples
///
/// ```
/// use chronicle_pipeline::resolve_anchor;
///
/// let content = "At dusk the fleet of Varro burned on the water.";
/// assert_eq!(resolve_anchor(content, "fleet of Varro", None, 0.6), Some(12));
/// assert_eq!(resolve_anchor(content, "The fleet of varro", None, 0.6), Some(8));
/// assert_eq!(resolve_anchor(content, "a quiet morning", None, 0.6), None);
/// ```
pub fn resolve_anchor(
    content: &str,
    anchor: &str,
    preferred: Option<Range<usize>>,
    threshold: f64,
) -> Option<usize> {
    let anchor = anchor.trim();
    if anchor.is_empty() {
        return None;
    }

    let exact: Vec<usize> = content.match_indices(anchor).map(|(i, _)| i).collect();
    if !exact.is_empty() {
        let inside = preferred
            .as_ref()
            .and_then(|range| exact.iter().find(|i| range.contains(i)));
        return inside.or(exact.first()).copied();
    }

    let anchor_tokens: Vec<String> = tokenize(anchor).into_iter().map(|t| t.text).collect();
    if anchor_tokens.is_empty() {
        return None;
    }
    let content_tokens = tokenize(content);
    if content_tokens.is_empty() {
        return None;
    }

    let size = anchor_tokens.len().min(content_tokens.len());
    let mut best: Option<(f64, bool, usize)> = None;
    for window in content_tokens.windows(size) {
        let score = overlap(window, &anchor_tokens);
        if score < threshold {
            continue;
        }
        // Anchor at the first token that actually matches
        let start = window
            .iter()
            .find(|t| anchor_tokens.contains(&t.text))
            .map(|t| t.start)
            .unwrap_or(window[0].start);
        let in_range = preferred.as_ref().is_some_and(|r| r.contains(&start));
        let better = match best {
            None => true,
            Some((best_score, best_in_range, _)) => {
                score > best_score + f64::EPSILON
                    || ((score - best_score).abs() <= f64::EPSILON && in_range && !best_in_range)
            }
        };
        if better {
            best = Some((score, in_range, start));
        }
    }
    best.map(|(_, _, start)| start)
}

/// Convert a byte offset in `content` to a character offset.
///
/// Offsets past the end, or inside a multi-byte character, clamp to the
/// character count.
///
/// # Examples
///
/// ```
/// use chronicle_pipeline::char_offset;
///
/// assert_eq!(char_offset("Ćesar walked", 7), 6);
/// ```
pub fn char_offset(content: &str, byte: usize) -> usize {
    content
        .get(..byte)
        .map(|prefix| prefix.chars().count())
        .unwrap_or_else(|| content.chars().count())
}

/// Convert a character offset in `content` back to a byte offset.
pub fn byte_offset(content: &str, chars: usize) -> usize {
    content
        .char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(content.len())
}
