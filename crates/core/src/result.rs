//! Result type definition and extension traits for Railway-Oriented Programming.
//!
//! Provides functional combinators for Result types, enabling clean error handling
//! without unwrap/expect/panic.

use crate::error::Error;

/// The standard Result type for document operations.
///
/// Use the `?` operator, `match`, or combinator methods to handle results.
pub type Result<T> = std::result::Result<T, Error>;

/// Generic extension trait for any Result type (not just `metakube_core::Result`).
///
/// Provides tap-style combinators for side effects such as logging.
pub trait GenericResultExt<T, E> {
    /// Perform a side effect on Ok value without consuming the Result.
    #[must_use]
    fn tap_ok<F: FnOnce(&T)>(self, f: F) -> Self;

    /// Perform a side effect on Err value without consuming the Result.
    #[must_use]
    fn tap_err<F: FnOnce(&E)>(self, f: F) -> Self;
}

impl<T, E> GenericResultExt<T, E> for std::result::Result<T, E> {
    fn tap_ok<F: FnOnce(&T)>(self, f: F) -> Self {
        if let Ok(ref v) = self {
            f(v);
        }
        self
    }

    fn tap_err<F: FnOnce(&E)>(self, f: F) -> Self {
        if let Err(ref e) = self {
            f(e);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tap_ok_runs_on_ok_only() {
        let mut seen = Vec::new();
        let ok: std::result::Result<i32, String> = Ok(7);
        let err: std::result::Result<i32, String> = Err("boom".to_string());

        let _ = ok.tap_ok(|v| seen.push(*v));
        let _ = err.tap_ok(|v| seen.push(*v));

        assert_eq!(seen, vec![7]);
    }

    #[test]
    fn test_tap_err_preserves_error() {
        let mut logged = String::new();
        let err: std::result::Result<i32, String> = Err("boom".to_string());

        let result = err.tap_err(|e| logged.push_str(e));

        assert_eq!(logged, "boom");
        assert_eq!(result, Err("boom".to_string()));
    }
}
