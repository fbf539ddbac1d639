//! Pulls a JSON object out of decorated model output.
//!
//! Models wrap their answer in code fences, echo the prompt before an
//! end-of-sequence marker, prepend reasoning, append prose, or stop mid-object.
//! Extraction is pure and synchronous so every one of those shapes can be
//! pinned by a plain string test.

use serde_json::Value;
use tracing::debug;

use crate::error::{ItineraryError, Result};

/// End-of-sequence markers some models emit between an echoed prompt and the answer
const END_OF_SEQUENCE_MARKERS: [&str; 4] = ["</s>", "<|im_end|>", "<|eot_id|>", "<|end|>"];

/// Extracted payload: the JSON text and its parsed form
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedJson {
    pub text: String,
    pub value: Value,
}

/// Extract the JSON object text from raw model output
pub fn extract(raw: &str) -> Result<String> {
    extract_json(raw).map(|extracted| extracted.text)
}

/// Extract and parse the JSON object from raw model output
pub fn extract_json(raw: &str) -> Result<ExtractedJson> {
    let unfenced = strip_code_fences(raw.trim());
    let answer = after_last_marker(unfenced);

    let start = answer.find('{').ok_or(ItineraryError::NoJsonObjectFound)?;
    if let Ok(Value::Array(_)) = serde_json::from_str::<Value>(answer) {
        return Err(ItineraryError::UnparsableJson(
            "top-level JSON value is an array, not an object".to_string(),
        ));
    }
    let candidate = answer[start..].trim_end();

    match parse_object(candidate) {
        Ok(value) => Ok(ExtractedJson {
            text: candidate.to_string(),
            value,
        }),
        Err(first_error) => {
            debug!(
                target: "tinytrip::extract",
                error = %first_error,
                "first parse failed, attempting salvage"
            );
            salvage(candidate, first_error)
        }
    }
}

/// Truncate to the last well-formed closing brace and try exactly once more.
///
/// The brace closing the root object is preferred, so trailing prose that
/// itself contains braces is cut off; when the root never closes the last
/// `}` in the text is used.
fn salvage(candidate: &str, first_error: String) -> Result<ExtractedJson> {
    let end = root_object_end(candidate)
        .or_else(|| candidate.rfind('}'))
        .ok_or_else(|| ItineraryError::UnparsableJson(first_error.clone()))?;
    let truncated = &candidate[..=end];

    parse_object(truncated)
        .map(|value| ExtractedJson {
            text: truncated.to_string(),
            value,
        })
        .map_err(|salvage_error| {
            ItineraryError::UnparsableJson(format!(
                "{}; salvage attempt: {}",
                first_error, salvage_error
            ))
        })
}

/// Byte index of the `}` that closes the object opening at index 0
fn root_object_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, byte) in text.bytes().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return (byte == b'}').then_some(idx);
                }
            }
            _ => {}
        }
    }

    None
}

fn parse_object(text: &str) -> std::result::Result<Value, String> {
    let value: Value = serde_json::from_str(text).map_err(|err| err.to_string())?;
    if value.is_object() {
        Ok(value)
    } else {
        Err("top-level JSON value is not an object".to_string())
    }
}

fn strip_code_fences(text: &str) -> &str {
    let mut stripped = text;

    if let Some(rest) = stripped.strip_prefix("```") {
        // Drop the info string (```json, ```JSON, ...) up to the end of the line
        stripped = match rest.find('\n') {
            Some(newline) if !rest[..newline].contains('{') => &rest[newline + 1..],
            _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }

    let trimmed = stripped.trim_end();
    if let Some(rest) = trimmed.strip_suffix("```") {
        stripped = rest;
    }

    stripped.trim()
}

/// Keep the last non-blank segment between end-of-sequence markers.
///
/// Blank tails (the model closed its answer with a marker) are skipped, but a
/// non-blank tail is final even without a `{`: anything before it is an echoed
/// prompt, which carries its own example JSON.
fn after_last_marker(text: &str) -> &str {
    let mut segments = vec![text];
    for marker in END_OF_SEQUENCE_MARKERS {
        segments = segments
            .into_iter()
            .flat_map(|segment| segment.split(marker))
            .collect();
    }

    if segments.len() == 1 {
        return text;
    }

    segments
        .iter()
        .rev()
        .map(|segment| segment.trim())
        .find(|segment| !segment.is_empty())
        .unwrap_or("")
}
