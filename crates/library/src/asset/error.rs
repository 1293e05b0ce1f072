//! Error types for [asset fetchers](super::AssetFetcher).

use derive_more::{Display, Error};

/// An asset fetch error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for asset fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("invalid asset url: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// Network failure, timeout or a non-success status.
    #[display("asset unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
    #[display("asset response was empty")]
    Empty,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
