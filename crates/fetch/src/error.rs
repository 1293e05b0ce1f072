//! Error types for building the HTTP client.
//!
//! Request-time failures are reported through the library's source and asset
//! error kinds instead; only a misconfigured client is fatal.

use derive_more::{Display, Error};

/// A client construction error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for client construction.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("invalid base url: {_0}")]
    InvalidBaseUrl(#[error(not(source))] String),
    #[display("invalid proxy url: {_0}")]
    InvalidProxy(#[error(not(source))] String),
    /// A configured header value contains characters HTTP does not allow.
    #[display("invalid value for header '{_0}'")]
    InvalidHeader(#[error(not(source))] &'static str),
    #[display("http client could not be built")]
    Client,
}
