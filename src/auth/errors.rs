use derive_more::Display;
use reqwest::StatusCode;
use serde_json::Value;

/// Failure reported by the hosted auth service, or by the transport used to
/// reach it. `message` is what the user gets to see.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display(fmt = "{}", message)]
pub struct AuthError {
    pub message: String,
    pub status: Option<u16>,
}

impl AuthError {
    pub fn new<T: Into<String>>(message: T) -> Self {
        AuthError {
            message: message.into(),
            status: None,
        }
    }

    /// Build the error for a non-2xx response
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = error_message_from_body(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

        AuthError {
            message,
            status: Some(status.as_u16()),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        AuthError {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self {
        AuthError::new(format!("Invalid response from auth server: {}", e))
    }
}

/// Pulls the human readable message out of an auth server error body.
///
/// Keys are tried in the order `msg`, `message`, `error_description`, `error`;
/// anything else falls back to the raw body. Returns `None` for an empty body.
pub fn error_message_from_body(body: &str) -> Option<String> {
    let body = body.trim();

    if body.is_empty() {
        return None;
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(Value::String(message)) = map.get(key) {
                if !message.is_empty() {
                    return Some(message.to_owned());
                }
            }
        }
    }

    Some(body.to_string())
}
