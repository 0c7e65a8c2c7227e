//! Result type definition and extension traits.
//!
//! Provides logging combinators for Result types so call sites that
//! deliberately drop an error still leave a trace.

use std::fmt::Display;

use crate::error::Error;

/// The standard Result type for gridwire core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait providing logged fallbacks for any `Result` whose error
/// can be displayed.
pub trait ResultExt<T> {
    /// Convert a Result to an Option, logging the error if present.
    fn into_option_logged(self, context: &str) -> Option<T>;

    /// Get the value or a default, logging the error if present.
    fn or_default_logged(self, context: &str, default: T) -> T;
}

impl<T, E: Display> ResultExt<T> for std::result::Result<T, E> {
    fn into_option_logged(self, context: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(context, error = %e, "Operation failed");
                None
            }
        }
    }

    fn or_default_logged(self, context: &str, default: T) -> T {
        match self {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(context, error = %e, "Operation failed, using default");
                default
            }
        }
    }
}

/// Extension trait for Option types.
pub trait OptionExt<T> {
    /// Convert Option to Result with a lazy error.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `err` when the option is `None`.
    fn ok_or_else_lazy<E, F: FnOnce() -> E>(self, err: F) -> std::result::Result<T, E>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_else_lazy<E, F: FnOnce() -> E>(self, err: F) -> std::result::Result<T, E> {
        self.ok_or_else(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_into_option_ok() {
        let result: Result<i32> = Ok(42);
        assert_eq!(result.into_option_logged("test"), Some(42));
    }

    #[test]
    fn test_result_into_option_err() {
        let result: Result<i32> = Err(Error::Unknown("test".into()));
        assert_eq!(result.into_option_logged("test"), None);
    }

    #[test]
    fn test_result_or_default_logged_err() {
        let result: std::result::Result<i32, &str> = Err("boom");
        assert_eq!(result.or_default_logged("test", 99), 99);
    }

    #[test]
    fn test_ok_or_else_lazy() {
        let opt: Option<i32> = None;
        let result = opt.ok_or_else_lazy(|| "missing value");
        assert_eq!(result, Err("missing value"));
    }
}
