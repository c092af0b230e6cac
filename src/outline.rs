//! Outline parsing
//!
//! Models are asked for a bare JSON object but regularly wrap it in a
//! ```` ```json ```` fence. [`parse_outline`] strips the first such fence when
//! present and decodes the rest as an [`Outline`].

use crate::error::{Error, Result};
use crate::types::Outline;
use regex::Regex;
use serde_json::error::Category;
use std::sync::LazyLock;

static JSON_FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```json[ \t]*\r?\n(.*?)\r?\n[ \t]*```").ok());

/// Return the contents of the first ```` ```json ```` fence, if any
pub fn extract_fenced_json(raw: &str) -> Option<&str> {
    let fence = JSON_FENCE.as_ref()?;
    fence
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Decode a model response into an accepted [`Outline`]
///
/// Fails with [`Error::Parse`] when the text is not valid JSON, when `title`
/// or `outline` are missing, or when the decoded outline breaks an outline
/// invariant (blank title, no sections, duplicate headings). The raw response
/// and decoder detail are logged on failure. The returned error carries at
/// most a position, never text taken from the response.
pub fn parse_outline(raw: &str) -> Result<Outline> {
    let trimmed = raw.trim();
    let body = extract_fenced_json(trimmed).unwrap_or(trimmed);

    let outline: Outline = serde_json::from_str(body).map_err(|e| {
        tracing::error!(error = %e, raw = %raw, "model response is not a valid outline document");
        Error::Parse(decode_failure(&e))
    })?;

    if let Err(e) = outline.validate() {
        tracing::error!(error = %e, raw = %raw, "model returned an unusable outline");
        return Err(Error::Parse(unusable_reason(&outline).to_string()));
    }

    Ok(outline)
}

fn decode_failure(e: &serde_json::Error) -> String {
    let what = match e.classify() {
        Category::Data => "response does not have the outline shape",
        Category::Syntax | Category::Eof => "response is not valid JSON",
        Category::Io => "response could not be read",
    };
    format!("{what} (line {}, column {})", e.line(), e.column())
}

// Outline::validate names the offending heading, which came from the model
fn unusable_reason(outline: &Outline) -> &'static str {
    if outline.title.trim().is_empty() {
        "outline title is empty"
    } else if outline.sections.is_empty() {
        "outline has no sections"
    } else {
        "outline repeats a section heading"
    }
}
