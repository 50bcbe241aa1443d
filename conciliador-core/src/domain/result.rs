//! Result and error types for the core library

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    /// Local selection rule broken (empty list, mixed directions, unknown id)
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown origin '{0}' (expected 'banco' or 'auxiliar')")]
    UnknownOrigin(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("A reconciliation request is already in flight")]
    SubmissionInFlight,

    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx answer from the reconciliation API
    #[error("{message}")]
    Api { status: u16, message: String },

    /// 401 from the API. The stored token has already been removed.
    #[error("Your session has expired. Please log in again.")]
    Unauthorized,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid transition error
    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Message suitable for showing to the user as-is.
    ///
    /// Validation, transport and API errors carry their own text; the prefix added by
    /// `Display` is dropped so server messages come through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(msg) | Error::Transport(msg) => msg.clone(),
            Error::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Success body returned by the reconciliation API (`{"message": ...}`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    /// Extra payload some endpoints attach (e.g. `resultado`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resultado: Option<serde_json::Value>,
}

impl ApiMessage {
    /// A body counts as success when the server filled in `message`
    pub fn is_success(&self) -> bool {
        self.message.as_deref().map_or(false, |m| !m.is_empty())
    }

    /// Server-provided failure text, in the order the API fills it in
    pub fn failure_text(&self) -> Option<&str> {
        self.detail
            .as_deref()
            .or(self.error.as_deref())
            .filter(|s| !s.is_empty())
    }
}
