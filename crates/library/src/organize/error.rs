//! Error types for the [`organize`](super) module.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.
//! Per-item errors never leave the module: they are turned into a
//! [`QuarantineRecord`](super::QuarantineRecord) by the caller, with
//! [`ErrorKind::reason`] deciding what gets recorded.

use super::QuarantineReason;
use derive_more::{Display, Error};

/// An organize error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for organize operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of an organize failure.
///
/// ### Quarantining Errors
/// Each is recorded under the [`QuarantineReason`] returned by
/// [`ErrorKind::reason`]:
/// - [`ErrorKind::CodeNotFound`] as `code_not_found`
/// - [`ErrorKind::MoveFailed`] as `move_failed`
/// - [`ErrorKind::Template`] as `invalid_destination`
/// - [`ErrorKind::Storage`] as `move_failed`, since the item's own files
///   could not be inspected or claimed
///
/// ### Fatal Errors
/// - [`ErrorKind::Scan`]
///
/// ### Warnings
/// - [`ErrorKind::Sidecar`]
/// - [`ErrorKind::Asset`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No code could be extracted from the item's name.
    #[display("no code found in '{_0}'")]
    CodeNotFound(#[error(not(source))] String),
    /// The item could not be moved into place.
    #[display("item could not be moved")]
    MoveFailed,
    /// The [`PathBuilder`](crate::PathBuilder) could not render a path.
    #[display("destination path could not be generated")]
    Template,
    /// A storage lookup needed to plan the move failed.
    #[display("storage operation failed")]
    Storage,
    /// The work list could not be discovered.
    #[display("items to organize could not be discovered")]
    Scan,
    /// The sidecar could not be serialized or written.
    #[display("sidecar could not be written")]
    Sidecar,
    /// The poster could not be downloaded or stored.
    #[display("poster could not be fetched")]
    Asset,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::MoveFailed | Self::Storage | Self::Asset)
    }

    /// What a quarantine caused by this error is recorded as.
    pub fn reason(&self) -> QuarantineReason {
        match self {
            Self::CodeNotFound(_) => QuarantineReason::CodeNotFound,
            Self::Template => QuarantineReason::InvalidDestination,
            Self::MoveFailed | Self::Storage | Self::Scan | Self::Sidecar | Self::Asset => QuarantineReason::MoveFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::CodeNotFound("holiday.mp4".into()), "code_not_found")]
    #[case(ErrorKind::MoveFailed, "move_failed")]
    #[case(ErrorKind::Storage, "move_failed")]
    #[case(ErrorKind::Template, "invalid_destination")]
    fn test_reason(#[case] kind: ErrorKind, #[case] expected: &str) {
        assert_eq!(kind.reason().to_string(), expected);
    }
}
