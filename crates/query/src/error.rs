//! Error types for the query crate.

use std::sync::Arc;

use gridwire_core::ViewId;
use thiserror::Error;

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while managing view state or executing queries.
///
/// `Clone` so that a single failed load can be handed to every caller
/// waiting on it.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// No state registered under this view id.
    #[error("unknown view '{view_id}'")]
    UnknownView { view_id: String },

    /// The view's endpoint or parameters cannot form a request.
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// A response body did not have a list shape.
    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },

    /// A background task did not complete.
    #[error("task failed: {reason}")]
    TaskFailed { reason: String },

    /// Transport failure.
    #[error("fetch error: {0}")]
    Fetch(#[source] Arc<gridwire_fetch::Error>),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] gridwire_core::Error),

    /// URL parse error.
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[source] Arc<serde_json::Error>),
}

impl Error {
    /// Create an unknown view error.
    pub fn unknown_view(view_id: &ViewId) -> Self {
        Self::UnknownView {
            view_id: view_id.to_string(),
        }
    }

    /// Create an invalid query error.
    pub fn invalid_query(reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            reason: reason.into(),
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Create a task failed error.
    pub fn task_failed(reason: impl Into<String>) -> Self {
        Self::TaskFailed {
            reason: reason.into(),
        }
    }

    /// Whether the session was torn down underneath this query.
    #[must_use]
    pub fn is_session_invalid(&self) -> bool {
        matches!(self, Self::Fetch(e) if e.is_session_invalid())
    }

    /// Check if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_retryable(),
            Self::TaskFailed { .. } => true,
            _ => false,
        }
    }
}

impl From<gridwire_fetch::Error> for Error {
    fn from(err: gridwire_fetch::Error) -> Self {
        Self::Fetch(Arc::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(Arc::new(err))
    }
}
