//! Recovers typed, bounded payloads from free-form model output.
//!
//! The provider enforces no schema, so replies may arrive wrapped in
//! Markdown fences or chatter. `normalize` peels those off, parses the
//! JSON into the target type and lets the type clamp itself.

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("model output was empty")]
    Empty,

    #[error("model output contained no JSON value")]
    NoJson,

    #[error("model output did not match the expected shape: {0}")]
    Malformed(#[from] serde_json::Error),
}

const MAX_JSON_CANDIDATES: usize = 16;

/// A payload that can trim itself to safe sizes after parsing.
pub trait Bounded: DeserializeOwned {
    fn bound(self) -> Self;
}

impl<T: Bounded> Bounded for Vec<T> {
    fn bound(self) -> Self {
        self.into_iter().map(Bounded::bound).collect()
    }
}

/// Parses `raw` as `T`, tolerating fences and surrounding prose.
///
/// Each opening brace or bracket is tried in order as the start of the
/// value, so prose such as "your [10] questions" before the payload is
/// skipped. The first candidate that parses wins.
pub fn normalize<T: Bounded>(raw: &str) -> Result<T, ParseError> {
    let stripped = strip_code_fences(raw);
    if stripped.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut first_error = None;
    for candidate in json_candidates(stripped).take(MAX_JSON_CANDIDATES) {
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => return Ok(value.bound()),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    Err(first_error.map_or(ParseError::NoJson, ParseError::Malformed))
}

/// Strips ``` fences, with or without an info string such as `json`.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    let tag_len = body
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(body.len());
    let body = body[tag_len..].trim_start();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Candidate JSON spans: one per opening brace/bracket, in order, each
/// running to the last matching closer in `text`.
pub fn json_candidates(text: &str) -> impl Iterator<Item = &str> {
    text.char_indices().filter_map(move |(start, c)| {
        let closer = match c {
            '{' => '}',
            '[' => ']',
            _ => return None,
        };
        let end = text.rfind(closer)?;
        (end > start).then(|| &text[start..=end])
    })
}

/// Truncates to at most `max_chars` characters.
pub fn clamp_str(s: String, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s,
    }
}

/// Keeps the first `max_len` non-blank entries, each clamped to `max_chars`.
pub fn cap_strings(list: Vec<String>, max_len: usize, max_chars: usize) -> Vec<String> {
    list.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(max_len)
        .map(|s| clamp_str(s, max_chars))
        .collect()
}

pub fn non_negative(n: f64) -> f64 {
    if n.is_finite() && n > 0.0 {
        n
    } else {
        0.0
    }
}
