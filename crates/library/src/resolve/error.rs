//! Error types for [metadata sources](super::MetadataSource).
//!
//! None of these ever escape [`MetadataResolver::resolve`](super::MetadataResolver::resolve):
//! every failure is logged and answered with the next source or the fallback
//! table. They exist so sources can say *why* they gave up.

use derive_more::{Display, Error};

/// A metadata source error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for metadata source operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network failure, timeout or an unexpected response status.
    #[display("source unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
    /// The source has no record of the code.
    #[display("code not found at source")]
    NotFound,
    /// The source answered with an interstitial (age gate, captcha, ...).
    #[display("source blocked the request")]
    Blocked,
    /// The source answered but nothing usable could be extracted.
    #[display("source returned no studio or title")]
    Rejected,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Blocked)
    }
}
