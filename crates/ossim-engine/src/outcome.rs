//! Success/failure envelope returned to callers.

use ossim_common::{Error, Result};
use serde::Serialize;

/// Machine-readable error attached to a failed [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    /// Stable error code, e.g. `NO_FIT_FOUND`.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl From<&Error> for ErrorInfo {
    fn from(error: &Error) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
        }
    }
}

/// Either a payload or an error, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    /// True if the command took effect.
    pub success: bool,
    /// Result of a successful command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<T>,
    /// Reason for a failed command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl<T> Outcome<T> {
    /// Wraps a successful payload.
    pub fn ok(payload: T) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    /// Wraps an error.
    pub fn err(error: &Error) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(error.into()),
        }
    }

    /// Returns the error code of a failed outcome.
    pub fn error_code(&self) -> Option<&'static str> {
        self.error.as_ref().map(|e| e.code)
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(payload) => Self::ok(payload),
            Err(error) => Self::err(&error),
        }
    }
}
