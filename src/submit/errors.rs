//! Human-readable messages from transaction service error bodies

use lazy_static::lazy_static;
use regex::Regex;

/// Shown when the service gave us nothing to work with
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

lazy_static! {
    // "400 Bad Request - Invalid password"
    static ref STATUS_LINE: Regex = Regex::new(r"^\d{3}(?: [^-]*)? - (?s)(.+)$").unwrap();
}

/// Extract the message a user should see from a raw error body.
///
/// Handles JSON envelopes (`{"error":{"message":..}}` or `{"error":".."}`) and
/// plain-text `"<code> <reason> - <message>"` bodies. Anything else is shown as is.
pub fn parse_response_message(body: &str) -> String {
    let body = body.trim();

    if body.is_empty() {
        return UNKNOWN_ERROR_MESSAGE.to_string();
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let message = value
            .pointer("/error/message")
            .and_then(|m| m.as_str())
            .or_else(|| value.get("error").and_then(|m| m.as_str()))
            .or_else(|| value.get("message").and_then(|m| m.as_str()));

        if let Some(message) = message {
            return parse_response_message(message);
        }
    }

    if let Some(captures) = STATUS_LINE.captures(body) {
        return capitalize(captures[1].trim());
    }

    capitalize(body)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => UNKNOWN_ERROR_MESSAGE.to_string(),
    }
}
