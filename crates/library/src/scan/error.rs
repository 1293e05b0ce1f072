//! Error types for the [`scan`](super) module.

use derive_more::{Display, Error};

/// A scan error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for scan operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Only failures that make the whole scan meaningless surface as errors;
/// a single unreadable directory is reported as
/// [`Inaccessible`](super::Classification::Inaccessible) instead.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The library root itself could not be listed.
    #[display("library root is unavailable")]
    RootUnavailable,
    /// A storage operation other than listing the root failed.
    #[display("storage operation failed during scan")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
