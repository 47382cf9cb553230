//! ScaleDown client error types.
//!
//! Errors form a closed set. Callers usually only need two questions answered:
//!
//! - **Authentication**: was the key missing or rejected? ([`ScaleDownError::is_authentication`])
//! - **API failure**: did the request fail on the wire or at the service?
//!   ([`ScaleDownError::is_api_error`])
//!
//! HTTP statuses are mapped onto error kinds in exactly one place,
//! [`ScaleDownError::from_status`].

use thiserror::Error;

/// ScaleDown client errors.
#[derive(Error, Debug)]
pub enum ScaleDownError {
    /// No API key was available, or the service rejected it (401/403).
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The service answered with a non-success status.
    #[error("API error (status {status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The request never produced an HTTP response (connect, timeout, task failure).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered 2xx but the body was not the expected JSON shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Caller supplied inputs that cannot be dispatched.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// One or more requests of a collect-all batch failed.
    #[error("Batch failed: {} of {total} requests failed", .failures.len())]
    BatchFailed {
        /// Number of requests in the batch.
        total: usize,
        /// Failures ordered by input index.
        failures: Vec<BatchFailure>,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single failed request inside a batch.
#[derive(Debug)]
pub struct BatchFailure {
    /// Position of the failed pair in the caller's input.
    pub index: usize,
    /// Why it failed.
    pub error: ScaleDownError,
}

/// Result type alias for ScaleDown operations
pub type Result<T> = std::result::Result<T, ScaleDownError>;

impl ScaleDownError {
    /// Map a non-success HTTP status and its body onto an error kind.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => ScaleDownError::Authentication(format!(
                "service rejected API key (status {status}): {body}"
            )),
            _ => ScaleDownError::Api { status, body },
        }
    }

    /// Missing-key error raised before any request is sent.
    pub(crate) fn missing_api_key() -> Self {
        ScaleDownError::Authentication(format!(
            "no API key configured; pass one to the compressor, call set_api_key, or set {}",
            crate::config::API_KEY_ENV
        ))
    }

    /// True for missing or rejected credentials.
    pub fn is_authentication(&self) -> bool {
        matches!(self, ScaleDownError::Authentication(_))
    }

    /// True for failures talking to the service: bad status, transport, undecodable body.
    pub fn is_api_error(&self) -> bool {
        matches!(
            self,
            ScaleDownError::Api { .. }
                | ScaleDownError::Transport(_)
                | ScaleDownError::MalformedResponse(_)
        )
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ScaleDownError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ScaleDownError {
    fn from(err: reqwest::Error) -> Self {
        ScaleDownError::Transport(err.to_string())
    }
}

impl From<toml::de::Error> for ScaleDownError {
    fn from(err: toml::de::Error) -> Self {
        ScaleDownError::Config(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ScaleDownError {
    fn from(err: tokio::task::JoinError) -> Self {
        ScaleDownError::Transport(format!("request task failed: {err}"))
    }
}
