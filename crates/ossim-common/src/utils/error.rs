//! Error types for ossim.
//!
//! Every failure a command can report is a variant of [`Error`]. All of them
//! are recoverable: a command that returns an error has left its component
//! exactly as it found it.

use thiserror::Error;

use crate::types::{PageId, ProcessId, ReplacementPolicy};

/// Result type alias using the ossim error.
pub type Result<T> = std::result::Result<T, Error>;

/// Error raised by a simulation command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No free block can hold the request under the active fit strategy.
    #[error("no free block can hold {requested} units")]
    NoFitFound {
        /// Requested size.
        requested: u64,
    },

    /// No free hole in the segmented space is large enough.
    #[error("out of memory: no hole can hold {requested} units (largest hole is {largest_free})")]
    OutOfMemory {
        /// Requested segment size.
        requested: u64,
        /// Size of the largest free hole at the time of the request.
        largest_free: u64,
    },

    /// The process already owns an allocated block.
    #[error("process {0} already holds a block")]
    DuplicateProcessId(ProcessId),

    /// No allocated block or queued process has this id.
    #[error("process not found: {0}")]
    ProcessNotFound(ProcessId),

    /// No occupied segment has this name.
    #[error("segment not found: {0}")]
    SegmentNotFound(String),

    /// The page is outside the current page table.
    #[error("page not found: {0}")]
    PageNotFound(PageId),

    /// A policy or strategy name was not recognised.
    #[error("unknown policy '{name}', expected one of: {expected}")]
    UnknownPolicy {
        /// The name that was given.
        name: String,
        /// The accepted names.
        expected: &'static str,
    },

    /// The replacement policy needs the future reference string, which a
    /// single step-by-step access cannot provide.
    #[error("{0} replacement needs the full reference string; run a batch simulation instead")]
    LookaheadRequired(ReplacementPolicy),

    /// A size, quantum, ratio or identifier is out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Returns a stable machine-readable code for the error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoFitFound { .. } => "NO_FIT_FOUND",
            Self::OutOfMemory { .. } => "OUT_OF_MEMORY",
            Self::DuplicateProcessId(_) => "DUPLICATE_PROCESS_ID",
            Self::ProcessNotFound(_) => "PROCESS_NOT_FOUND",
            Self::SegmentNotFound(_) => "SEGMENT_NOT_FOUND",
            Self::PageNotFound(_) => "PAGE_NOT_FOUND",
            Self::UnknownPolicy { .. } => "UNKNOWN_POLICY",
            Self::LookaheadRequired(_) => "LOOKAHEAD_REQUIRED",
            Self::InvalidInput(_) => "INVALID_INPUT",
        }
    }

    /// Shorthand for [`Error::InvalidInput`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Fails with [`Error::InvalidInput`] unless `value` is positive.
pub fn ensure_positive(what: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(Error::invalid(format!("{what} must be greater than zero")));
    }
    Ok(())
}

/// Fails with [`Error::InvalidInput`] unless `value` lies in `[0, 1]`.
pub fn ensure_ratio(what: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::invalid(format!("{what} must be between 0 and 1, got {value}")));
    }
    Ok(())
}

/// Narrows a page or frame count to `u32`, failing with
/// [`Error::InvalidInput`] if it does not fit.
pub fn ensure_u32(what: &str, value: u64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::invalid(format!("{what} {value} exceeds the limit of {}", u32::MAX)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = Error::NoFitFound { requested: 120 };
        assert_eq!(err.to_string(), "no free block can hold 120 units");

        let err = Error::ProcessNotFound(ProcessId::new("P9"));
        assert_eq!(err.to_string(), "process not found: P9");
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            Error::NoFitFound { requested: 1 },
            Error::OutOfMemory {
                requested: 1,
                largest_free: 0,
            },
            Error::DuplicateProcessId(ProcessId::new("P1")),
            Error::ProcessNotFound(ProcessId::new("P1")),
            Error::SegmentNotFound("code".to_string()),
            Error::PageNotFound(PageId::new(0)),
            Error::UnknownPolicy {
                name: "x".to_string(),
                expected: "y",
            },
            Error::LookaheadRequired(ReplacementPolicy::Optimal),
            Error::invalid("bad"),
        ];
        let mut codes: Vec<_> = errors.iter().map(Error::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_ensure_helpers() {
        assert!(ensure_positive("size", 1).is_ok());
        assert_eq!(ensure_positive("size", 0).unwrap_err().code(), "INVALID_INPUT");
        assert!(ensure_ratio("ratio", 0.0).is_ok());
        assert!(ensure_ratio("ratio", 1.0).is_ok());
        assert!(ensure_ratio("ratio", 1.5).is_err());
        assert!(ensure_ratio("ratio", f64::NAN).is_err());
    }

    #[test]
    fn test_ensure_u32() {
        assert_eq!(ensure_u32("frame count", 4), Ok(4));
        assert_eq!(ensure_u32("frame count", u64::from(u32::MAX)), Ok(u32::MAX));
        let err = ensure_u32("frame count", 1 << 32).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }
}
