//! Decoding XNAT response bodies.
//!
//! XNAT answers some failed logins with an HTML page and a 200 status, so a
//! decode failure carries a short preview of the body alongside the status.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

const PREVIEW_LIMIT: usize = 200;

/// A body that was not the JSON the caller expected.
#[derive(Debug, Error)]
#[error("could not decode XNAT response ({status}): {source}. body: {preview}")]
pub struct JsonParseError {
    status: String,
    #[source]
    source: serde_json::Error,
    preview: String,
}

impl JsonParseError {
    pub fn body_preview(&self) -> &str {
        &self.preview
    }
}

/// Decode `text` as `T`, keeping the status and a body preview on failure.
pub fn parse_response_json_strict<T: DeserializeOwned>(text: &str, status: Option<StatusCode>) -> Result<T, JsonParseError> {
    serde_json::from_str(text).map_err(|source| JsonParseError {
        status: status.map_or_else(|| "no status".to_string(), |code| format!("status {code}")),
        source,
        preview: body_preview(text, PREVIEW_LIMIT),
    })
}

/// Body text on one line, cut after `limit` bytes.
pub fn body_preview(text: &str, limit: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return "<empty>".into();
    }
    if collapsed.len() <= limit {
        return collapsed;
    }
    let mut end = limit;
    while !collapsed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &collapsed[..end])
}
