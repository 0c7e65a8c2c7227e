//! Error types for the fetch crate.

use std::fmt;

use thiserror::Error;

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the backend.
#[derive(Error, Debug)]
pub enum Error {
    /// Connectivity failure. Safe to retry at the caller's discretion.
    #[error("network error: {reason}")]
    Network { reason: String },

    /// Request timed out.
    #[error("request timed out: {reason}")]
    Timeout { reason: String },

    /// Token renewal failed; the whole session has been cleared.
    #[error("session invalid: {reason}")]
    SessionInvalid { reason: String },

    /// Backend answered with a non-2xx status.
    #[error("server rejected request ({status}): {message}")]
    ServerRejected { status: u16, message: String },

    /// Response body could not be interpreted.
    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },

    /// Configuration error.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// HTTP error from reqwest that is neither a timeout nor a connect error.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// URL parse error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] gridwire_core::Error),
}

/// Coarse classification used by callers deciding how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection refused, DNS failure, reset.
    Network,
    /// Deadline exceeded.
    Timeout,
    /// Session torn down; every view must treat itself as logged out.
    Session,
    /// 5xx.
    Server,
    /// 4xx and local misuse (bad config, bad body).
    Client,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Timeout => write!(f, "timeout"),
            Self::Session => write!(f, "session"),
            Self::Server => write!(f, "server"),
            Self::Client => write!(f, "client"),
        }
    }
}

impl Error {
    /// Create a network error.
    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(reason: impl Into<String>) -> Self {
        Self::Timeout {
            reason: reason.into(),
        }
    }

    /// Create a session invalid error.
    pub fn session_invalid(reason: impl Into<String>) -> Self {
        Self::SessionInvalid {
            reason: reason.into(),
        }
    }

    /// Create a server rejected error.
    pub fn server_rejected(status: u16, message: impl Into<String>) -> Self {
        Self::ServerRejected {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Create a config error.
    pub fn config_error(reason: impl Into<String>) -> Self {
        Self::ConfigError {
            reason: reason.into(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Network { .. } | Self::Http(_) => ErrorCategory::Network,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::SessionInvalid { .. } => ErrorCategory::Session,
            Self::ServerRejected { status, .. } if *status >= 500 => ErrorCategory::Server,
            Self::ServerRejected { .. }
            | Self::InvalidResponse { .. }
            | Self::ConfigError { .. }
            | Self::UrlParse(_)
            | Self::Json(_)
            | Self::Io(_)
            | Self::Core(_) => ErrorCategory::Client,
        }
    }

    /// Check if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Timeout | ErrorCategory::Server
        )
    }

    /// Whether this error tore down the session.
    #[must_use]
    pub const fn is_session_invalid(&self) -> bool {
        matches!(self, Self::SessionInvalid { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(err.to_string())
        } else if err.is_connect() {
            Self::network(err.to_string())
        } else if err.is_decode() {
            Self::invalid_response(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}
