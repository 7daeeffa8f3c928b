//! Structural classification of webhook response bodies

use axum::http::StatusCode;
use serde_json::Value;

use super::{EnvelopeMode, ProxyReply};
use crate::NO_RESULTS_SENTINEL;

/// The shapes an automation webhook is known to answer with
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// A JSON array of record-like objects
    Records(Vec<Value>),
    /// `{ value: [...], Count: n }` from the list-output mode
    Wrapped(Vec<Value>),
    /// A `{ message, error }` object, possibly smuggled as the first `value` entry
    Failure { message: String },
    /// The "zero results" sentinel
    NoResults,
    /// Any other JSON value, usually a single record object
    Single(Value),
}

impl Envelope {
    /// Classify a parsed body by structure alone
    pub fn detect(value: Value) -> Self {
        if is_sentinel(&value) {
            return Envelope::NoResults;
        }

        match value {
            Value::Array(items) => Envelope::Records(items),
            Value::Object(mut map) => match map.remove("value") {
                Some(Value::Array(items)) => match items.first().and_then(error_message) {
                    Some(message) => Envelope::Failure { message },
                    None => Envelope::Wrapped(items),
                },
                Some(other) => {
                    map.insert("value".to_string(), other);
                    Envelope::Single(Value::Object(map))
                }
                None => match error_message(&Value::Object(map.clone())) {
                    Some(message) => Envelope::Failure { message },
                    None => Envelope::Single(Value::Object(map)),
                },
            },
            other => Envelope::Single(other),
        }
    }
}

fn is_sentinel(value: &Value) -> bool {
    value.get("message").and_then(Value::as_str) == Some(NO_RESULTS_SENTINEL)
}

/// `{ message, error }` is how the automation tool reports a failed node
fn error_message(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    if !(map.contains_key("message") && map.contains_key("error")) {
        return None;
    }
    Some(match &map["message"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Map an upstream status and raw body text onto the proxy reply contract
pub fn classify_response(mode: EnvelopeMode, status: StatusCode, text: &str) -> ProxyReply {
    if !status.is_success() {
        return match serde_json::from_str::<Value>(text) {
            Ok(parsed) if is_sentinel(&parsed) => ProxyReply::empty(),
            Ok(parsed) => ProxyReply {
                status,
                body: parsed,
            },
            Err(_) => ProxyReply::error_with_details(
                status,
                "Upstream webhook returned non-JSON response",
                text,
            ),
        };
    }

    if text.trim().is_empty() {
        return ProxyReply::empty();
    }

    let parsed: Value = match serde_json::from_str(text) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!(error = %e, body = %text, "Webhook success body is not valid JSON");
            return ProxyReply::internal();
        }
    };

    // Zero results is an empty list whichever envelope the upstream uses
    if is_sentinel(&parsed) {
        return ProxyReply::empty();
    }

    if mode == EnvelopeMode::Standard {
        return ProxyReply::ok(parsed);
    }

    match Envelope::detect(parsed.clone()) {
        Envelope::Wrapped(items) => ProxyReply::ok(Value::Array(items)),
        Envelope::NoResults => ProxyReply::empty(),
        Envelope::Failure { message } if is_wrapped(&parsed) => {
            tracing::warn!(error = %message, "Webhook reported an error inside its value envelope");
            ProxyReply::error(StatusCode::BAD_GATEWAY, message)
        }
        _ => ProxyReply::ok(parsed),
    }
}

fn is_wrapped(value: &Value) -> bool {
    matches!(value.get("value"), Some(Value::Array(_)))
}
