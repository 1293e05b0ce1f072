use derive_more::{Display, Error};
use std::path::PathBuf;

/// A fatal run error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that stops a run before or instead of producing a summary.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration could not be loaded")]
    Config,
    #[display("library root is unavailable: {}", _0.display())]
    Root(#[error(not(source))] PathBuf),
    #[display("'{}' is not an item inside the library", _0.display())]
    Item(#[error(not(source))] PathBuf),
    #[display("metadata source could not be set up")]
    Fetch,
    #[display("library run failed")]
    Library,
}
