//! Extraction Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The string is not a canonical `LETTERS-DIGITS` code.
    #[display("not a canonical code: {_0}")]
    InvalidCode(#[error(not(source))] String),
    /// The page is an age-verification interstitial rather than a detail page.
    #[display("age verification page returned instead of details")]
    AgeGate,
    /// A URL found in the document could not be resolved.
    #[display("invalid URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A different cookie or proxy may get past the gate; everything else
        // is a property of the input.
        matches!(self, Self::AgeGate)
    }
}
