//! Messages exchanged between the popup and the script running in a tab.
//!
//! Requests go out as `{"type": "GENERATE_EMAIL", "context": "..."}`, or as
//! `{"type": "IMPROVE_EMAIL", "email": "...", "context": "..."}` to rework the
//! current draft. Replies come back as loose JSON: `{"email": ...}`, `{"error": ...}`, or anything
//! else, which is treated as malformed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DraftError, TransportError};

/// Shown when the peer replied with neither `email` nor `error`.
pub const MALFORMED_RESPONSE: &str =
    "Failed to generate email. No response or unexpected format from content script.";

/// User supplied context, trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(String);

impl Context {
    /// Trims whitespace and byte order marks from both ends.
    pub fn parse(raw: &str) -> Result<Self, DraftError> {
        let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
        if trimmed.is_empty() {
            return Err(DraftError::EmptyContext);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Outbound message addressed to a tab's script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PeerRequest {
    #[serde(rename = "GENERATE_EMAIL")]
    GenerateEmail { context: Context },

    /// Rework an existing draft following the instructions in `context`.
    #[serde(rename = "IMPROVE_EMAIL")]
    ImproveEmail { email: String, context: Context },
}

impl PeerRequest {
    pub fn generate(context: Context) -> Self {
        PeerRequest::GenerateEmail { context }
    }

    pub fn improve(email: impl Into<String>, instructions: Context) -> Self {
        PeerRequest::ImproveEmail {
            email: email.into(),
            context: instructions,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PeerRequest::GenerateEmail { .. } => "GENERATE_EMAIL",
            PeerRequest::ImproveEmail { .. } => "IMPROVE_EMAIL",
        }
    }

    pub fn to_value(&self) -> Value {
        // Serializing a tagged enum of strings cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Outcome of one round trip, as seen by the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Success { email: String },
    ApplicationError { message: String },
    TransportError { message: String },
    Malformed,
}

impl Response {
    /// Classify a raw reply. `error` wins over `email` when both are set, and
    /// empty or null fields count as absent.
    pub fn from_reply(reply: Result<Value, TransportError>) -> Self {
        let value = match reply {
            Ok(value) => value,
            Err(err) => {
                return Response::TransportError {
                    message: err.message,
                }
            }
        };

        if let Some(message) = value.get("error").and_then(field_text) {
            return Response::ApplicationError { message };
        }
        if let Some(email) = value.get("email").and_then(field_text) {
            return Response::Success { email };
        }
        Response::Malformed
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Response::Success { .. })
    }

    /// The text the popup shows for this outcome.
    pub fn draft_text(&self) -> String {
        match self {
            Response::Success { email } => email.clone(),
            Response::ApplicationError { message } => format!("Error: {}", message),
            Response::TransportError { message } => format!("Error: {}. Check console.", message),
            Response::Malformed => MALFORMED_RESPONSE.to_string(),
        }
    }
}

/// Text of a reply field, or `None` when the value is falsy: null, false,
/// zero or the empty string.
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Reply sent by a tab's script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PeerReply {
    Email { email: String },
    Error { error: String },
}

impl PeerReply {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
