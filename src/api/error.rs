//! Error types for API calls.
//!
//! Every logical call makes at most two attempts. Each attempt fails with an
//! [`AttemptError`]; when both fail, the more specific of the two is turned
//! into the caller-facing [`ApiError`].

use std::time::Duration;
use thiserror::Error;

/// Failure of a single transport attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The server answered 2xx but the body could not be decoded.
    #[error("malformed response body (HTTP {status}): {message}")]
    Decode { status: u16, message: String },

    /// No response was received (connect error, reset, invalid request).
    #[error("transport error: {0}")]
    Transport(String),

    /// The attempt exceeded its deadline.
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),
}

impl AttemptError {
    /// HTTP status carried by this failure, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Decode { status, .. } => Some(*status),
            Self::Transport(_) | Self::Timeout(_) => None,
        }
    }

    fn specificity(&self) -> u8 {
        match self {
            Self::Status { .. } => 2,
            Self::Decode { .. } => 1,
            Self::Transport(_) | Self::Timeout(_) => 0,
        }
    }

    /// Pick the failure that carries the most diagnostic information.
    ///
    /// Status-bearing failures beat malformed bodies, which beat
    /// transport-only failures. Ties go to the secondary (most recent) one.
    pub fn most_specific(primary: AttemptError, secondary: AttemptError) -> AttemptError {
        if primary.specificity() > secondary.specificity() {
            primary
        } else {
            secondary
        }
    }

    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Decode { .. } => "decode",
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
        }
    }
}

impl From<reqwest::Error> for AttemptError {
    fn from(err: reqwest::Error) -> Self {
        AttemptError::Transport(err.to_string())
    }
}

/// Caller-facing error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Bad input rejected by the server (4xx other than 401/403/404).
    #[error("validation error (HTTP {status}): {detail}")]
    Validation { status: u16, detail: String },

    /// Missing, invalid or expired credentials (401/403).
    #[error("authentication error (HTTP {status}): {detail}")]
    Auth { status: u16, detail: String },

    /// The resource does not exist (404).
    #[error("not found: {detail}")]
    NotFound { detail: String },

    /// Neither attempt received a response.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Anything else: 5xx, unexpected status, malformed body.
    #[error("unexpected error: {message}")]
    Unknown { status: Option<u16>, message: String },
}

impl ApiError {
    /// Build the error for a non-2xx response.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = extract_detail(status, body);
        match status {
            401 | 403 => ApiError::Auth { status, detail },
            404 => ApiError::NotFound { detail },
            400..=499 => ApiError::Validation { status, detail },
            _ => ApiError::Unknown {
                status: Some(status),
                message: detail,
            },
        }
    }

    /// HTTP status of the failing response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Validation { status, .. } | Self::Auth { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::ServiceUnavailable(_) => None,
            Self::Unknown { status, .. } => *status,
        }
    }

    /// Human-readable message suitable for inline display.
    pub fn detail(&self) -> String {
        match self {
            Self::Validation { detail, .. } | Self::Auth { detail, .. } | Self::NotFound { detail } => {
                detail.clone()
            }
            Self::ServiceUnavailable(message) | Self::Unknown { message, .. } => message.clone(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

impl From<AttemptError> for ApiError {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::Status { status, body } => ApiError::from_status(status, &body),
            AttemptError::Decode { status, message } => ApiError::Unknown {
                status: Some(status),
                message,
            },
            AttemptError::Transport(message) => ApiError::ServiceUnavailable(message),
            AttemptError::Timeout(after) => {
                ApiError::ServiceUnavailable(format!("no response within {after:?}"))
            }
        }
    }
}

/// Errors raised while building an [`ApiClient`](crate::api::ApiClient).
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("HTTP client construction failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Pull the human-readable message out of an error body.
///
/// Understands `{"detail": "..."}` and the list form
/// `{"detail": [{"msg": "..."}]}`; otherwise falls back to the raw body.
pub fn extract_detail(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        match value.get("detail") {
            Some(serde_json::Value::String(detail)) if !detail.is_empty() => {
                return detail.clone();
            }
            Some(serde_json::Value::Array(items)) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if !messages.is_empty() {
                    return messages.join("; ");
                }
            }
            _ => {}
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.starts_with('{') {
        format!("Request failed with status {status}")
    } else {
        trimmed.to_string()
    }
}
