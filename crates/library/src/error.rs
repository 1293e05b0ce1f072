//! Library Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Module-level errors ([`scan`](crate::scan::error),
//! [`organize`](crate::organize::error), [`resolve`](crate::resolve::error))
//! are raised into these kinds at the crate boundary.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("issue with path generation from template")]
    Template,
    #[display("library could not be scanned")]
    Scan,
    #[display("library could not be organized")]
    Organize,
    #[display("library audit failed")]
    Audit,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
