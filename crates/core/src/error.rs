//! Core error types for gridwire operations.
//!
//! All errors are explicit, typed, and recoverable - no panics allowed.

use thiserror::Error;

/// Core error type for gridwire domain values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // Pagination
    #[error("page size must be greater than zero")]
    InvalidPageSize,

    #[error("page offset overflow: page {page_index} of size {page_size}")]
    PageOffsetOverflow { page_index: u64, page_size: u64 },

    // Field and filter errors
    #[error("unknown field '{field_id}'")]
    UnknownField { field_id: String },

    #[error("invalid value for field '{field_id}': {reason}")]
    InvalidFilterValue { field_id: String, reason: String },

    // Parsing errors
    #[error("JSON parse error: {reason}")]
    JsonParseFailed { reason: String },

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl Error {
    /// Create an unknown field error.
    pub fn unknown_field(field_id: impl Into<String>) -> Self {
        Self::UnknownField {
            field_id: field_id.into(),
        }
    }

    /// Create an invalid filter value error.
    pub fn invalid_filter_value(field_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilterValue {
            field_id: field_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a JSON parse error.
    pub fn json_parse_failed(reason: impl Into<String>) -> Self {
        Self::JsonParseFailed {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::json_parse_failed(err.to_string())
    }
}
