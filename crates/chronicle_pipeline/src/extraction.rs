//! Utilities for extracting structured data from model responses.
//!
//! Responses often wrap JSON in markdown fences or surround it with prose.
//! These helpers find the payload and turn failures into step parse errors
//! that carry the raw response for diagnostics.

use chronicle_error::{ChronicleResult, StepError, StepErrorKind};
use serde::de::DeserializeOwned;

/// Extract a JSON object or array from a response that may contain markdown or extra text.
///
/// Strategies, in order: a fenced code block, then the first balanced
/// object or array (whichever opens first).
///
/// # Examples
///
/// ```
/// use chronicle_pipeline::extract_json;
///
/// let response = "Here you go:\n```json\n{\"summary\": \"Ships burn.\"}\n```";
/// assert_eq!(extract_json(response).as_deref(), Some("{\"summary\": \"Ships burn.\"}"));
/// ```
pub fn extract_json(response: &str) -> Option<String> {
    if let Some(block) = extract_from_code_block(response)
        && (block.starts_with('{') || block.starts_with('['))
    {
        return Some(block);
    }

    let bracket_pos = response.find('[');
    let brace_pos = response.find('{');
    match (bracket_pos, brace_pos) {
        (Some(b), Some(c)) if b < c => extract_balanced(response, '[', ']')
            .or_else(|| extract_balanced(response, '{', '}')),
        (Some(_), None) => extract_balanced(response, '[', ']'),
        _ => extract_balanced(response, '{', '}')
            .or_else(|| extract_balanced(response, '[', ']')),
    }
}

/// Extract and deserialize a JSON payload.
///
/// # Errors
///
/// Returns a [`StepErrorKind::Parse`] error naming `what` and carrying the
/// raw response when no JSON is found or it does not match `T`.
pub fn parse_response<T>(response: &str, what: &str) -> ChronicleResult<T>
where
    T: DeserializeOwned,
{
    let Some(json) = extract_json(response) else {
        tracing::error!(what, response_length = response.len(), "No JSON found in response");
        return Err(parse_error(what, "no JSON found in response", response));
    };

    serde_json::from_str(&json).map_err(|e| {
        let preview = json.chars().take(100).collect::<String>();
        tracing::error!(what, error = %e, json_preview = %preview, "JSON parsing failed");
        parse_error(what, &e.to_string(), response)
    })
}

/// Build a parse error carrying the raw response.
#[track_caller]
pub fn parse_error(what: &str, message: &str, raw: &str) -> chronicle_error::ChronicleError {
    StepError::new(StepErrorKind::Parse {
        what: what.to_string(),
        message: message.to_string(),
        raw: Some(raw.to_string()),
    })
    .into()
}

/// Labels a model tends to prefix plain answers with.
const ANSWER_LABELS: &[&str] = &[
    "summary",
    "title",
    "answer",
    "response",
    "scene",
    "scene description",
    "description",
];

/// Strip formatting a model commonly wraps around plain answers.
///
/// Removes code fences, a leading markdown heading or `Label:` prefix,
/// bold markers, and surrounding quotes.
///
/// # Examples
///
/// ```
/// use chronicle_pipeline::strip_wrapper;
///
/// assert_eq!(strip_wrapper("**Summary:** \"A quiet war.\""), "A quiet war.");
/// assert_eq!(strip_wrapper("```\nPlain text\n```"), "Plain text");
/// ```
pub fn strip_wrapper(text: &str) -> String {
    let mut body = extract_from_code_block(text).unwrap_or_else(|| text.trim().to_string());

    body = body.replace("**", "");

    let lines: Vec<&str> = body.lines().collect();
    if lines.len() > 1 && lines[0].trim_start().starts_with('#') {
        body = lines[1..].join("\n");
    }

    let trimmed = body.trim();
    let without_label = match trimmed.split_once(':') {
        Some((label, rest)) if ANSWER_LABELS.contains(&label.trim().to_lowercase().as_str()) => {
            rest
        }
        _ => trimmed,
    };

    without_label
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\u{201C}' | '\u{201D}'))
        .trim()
        .to_string()
}

/// Extract content from the first fenced code block, with or without a language tag.
fn extract_from_code_block(response: &str) -> Option<String> {
    let start = response.find("```")?;
    let content_start = start + 3;
    // Skip the language specifier line
    let skip_to = response[content_start..]
        .find('\n')
        .map(|n| content_start + n + 1)
        .unwrap_or(content_start);

    match response[skip_to..].find("```") {
        Some(end) => Some(response[skip_to..skip_to + end].trim().to_string()),
        // No closing fence: truncated response
        None => Some(response[skip_to..].trim().to_string()),
    }
}

/// Extract content between balanced delimiters, ignoring delimiters inside strings.
fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(response[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }

    None
}
