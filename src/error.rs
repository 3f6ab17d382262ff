//! Error types for the job tracker client
//!
//! Every public API returns `Result<T, Error>`. Failures of calls against the
//! backend are normalized into an [`ApiError`] descriptor before they reach
//! the caller, whatever their origin (transport fault, timeout, non-2xx body).

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Longest raw response body kept as an error message
const MAX_MESSAGE_LEN: usize = 512;

/// The main error type for the client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // API Errors
    // ============================================================================
    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Session Errors
    // ============================================================================
    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Not logged in")]
    NotLoggedIn,

    // ============================================================================
    // Recording Errors
    // ============================================================================
    #[error("Upload rejected: {message}")]
    Upload { message: String },

    #[error("Invalid recording file name: '{name}'")]
    InvalidFileName { name: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a session error
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Create an upload error
    pub fn upload(message: impl Into<String>) -> Self {
        Self::Upload {
            message: message.into(),
        }
    }

    /// The normalized API error, if this error came from a backend call
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }

    /// HTTP status of the failed call, if any
    pub fn status(&self) -> Option<u16> {
        self.api().and_then(|e| e.status)
    }

    /// Check if the session was rejected by the backend
    pub fn is_unauthorized(&self) -> bool {
        self.api().is_some_and(|e| e.kind == ErrorKind::Unauthorized)
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api(err) => err.is_retryable(),
            _ => false,
        }
    }
}

/// Classification of a failed backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transport failure, no response received
    Network,
    /// Local per-attempt timeout or HTTP 408
    Timeout,
    /// HTTP 401, session is invalid
    Unauthorized,
    /// 4xx other than 401, 408 and 429
    Client,
    /// HTTP 429
    RateLimited,
    /// 5xx
    Server,
    /// Successful response with an undecodable body
    Decode,
}

impl ErrorKind {
    /// Classify an HTTP status code
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorKind::Unauthorized,
            408 => ErrorKind::Timeout,
            429 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Client,
        }
    }

    /// Whether failures of this kind are expected to clear up on retry
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::Timeout | ErrorKind::RateLimited | ErrorKind::Server
        )
    }
}

/// Normalized description of a failed backend call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Failure classification
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
    /// HTTP status, absent for transport failures and local timeouts
    pub status: Option<u16>,
    /// Machine-readable code reported by the backend (e.g. `NOT_FOUND`)
    pub code: Option<String>,
    /// Raw details payload reported by the backend
    pub details: Option<Value>,
    /// Number of attempts made before giving up
    #[serde(default)]
    pub attempts: u32,
}

impl ApiError {
    /// Transport-level failure without a response
    pub fn network(message: impl Into<String>) -> Self {
        Self::without_status(ErrorKind::Network, message)
    }

    /// Per-attempt timeout elapsed
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::without_status(ErrorKind::Timeout, message)
    }

    /// Response body could not be decoded
    pub fn decode(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Decode,
            message: message.into(),
            status: Some(status),
            code: None,
            details: None,
            attempts: 0,
        }
    }

    fn without_status(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            code: None,
            details: None,
            attempts: 0,
        }
    }

    /// Build from a transport error raised by reqwest
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(format!("Request timed out: {err}"))
        } else {
            Self::network(format!("Network error: {err}"))
        }
    }

    /// Build from a non-2xx response status and its body text
    ///
    /// Bodies shaped like `{"error": CODE, "message": TEXT, "details": ...}`
    /// contribute message, code and details. Anything else becomes the message
    /// verbatim, falling back to the status reason phrase when empty.
    pub fn from_response(status: u16, body: &str) -> Self {
        let mut err = Self {
            kind: ErrorKind::from_status(status),
            message: String::new(),
            status: Some(status),
            code: None,
            details: None,
            attempts: 0,
        };

        if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(body) {
            let text = |key: &str| obj.get(key).and_then(Value::as_str).map(ToString::to_string);
            err.code = text("error").or_else(|| text("code"));
            err.message = text("message").or_else(|| err.code.clone()).unwrap_or_default();
            err.details = obj.get("details").filter(|v| !v.is_null()).cloned();
        } else {
            err.message = truncate(body.trim(), MAX_MESSAGE_LEN);
        }

        if err.message.is_empty() {
            err.message = StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Request failed")
                .to_string();
        }

        err
    }

    /// Record how many attempts were made
    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Check if this failure is retryable
    pub fn is_retryable(&self) -> bool {
        self.kind.is_transient()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {status}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ApiError {}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Result type alias for the client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
