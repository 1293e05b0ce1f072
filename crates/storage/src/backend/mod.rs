//! Storage backend trait and implementations.
//!
//! This module defines the [`StorageBackend`] trait, the only way the library
//! engine touches the disk. Keeping every filesystem call behind it lets the
//! organizer be exercised against decorated backends (fault injection, dry
//! runs) without changing a line of the engine.

mod local;

pub use self::local::LocalBackend;
use crate::Entry;
use crate::error::Result;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

pub type EntryStream<'a> = Pin<Box<dyn Stream<Item = Result<Entry>> + Send + 'a>>;

/// Unified interface for library storage.
///
/// # Path Handling
/// All paths are relative to the library root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations
/// enforce this validation, so a path can never escape the root.
///
/// # Ordering
/// Listings are sorted by name. The organizer relies on this: collision
/// suffixes are only deterministic if items are visited in the same order
/// on every run.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use kura_storage::{backend::StorageBackend, error::Result};
///
/// async fn count_videos(backend: &dyn StorageBackend) -> Result<usize> {
///     let files = backend.list(Some(Path::new("s1"))).await?;
///     Ok(files.iter().filter(|f| f.extension().as_deref() == Some("mp4")).count())
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend (used for logging only).
    fn name(&self) -> &str;

    /// List all files (recursively) under an optional directory prefix.
    ///
    /// Default implementation collects [`list_stream()`](Self::list_stream)
    /// into a [`Vec`].
    async fn list(&self, prefix: Option<&Path>) -> Result<Vec<Entry>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Stream every regular file beneath an optional directory prefix.
    ///
    /// Only files are yielded; directories are descended into. A prefix that
    /// does not exist yields an empty stream rather than an error. Listing
    /// errors for individual directories are yielded as `Err` items without
    /// terminating the walk.
    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> EntryStream<'a>;

    /// List the immediate children (files and directories) of `dir`, or of
    /// the library root when `None`, sorted by name.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the
    /// directory does not exist.
    async fn list_dir(&self, dir: Option<&Path>) -> Result<Vec<Entry>>;

    /// Check if a file or directory exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Kind and size of a single path.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if nothing
    /// exists there.
    async fn stat(&self, path: &Path) -> Result<Entry>;

    /// Write file contents, creating parent directories as needed and
    /// overwriting any existing file.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Move a file or a whole directory within the library.
    ///
    /// Parent directories of the destination are created as needed. Unlike a
    /// raw `rename(2)`, an existing destination is never overwritten:
    /// [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists) is returned
    /// instead.
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Create a directory and all of its missing parents.
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Remove an empty directory.
    ///
    /// Returns [`NotEmpty`](crate::error::ErrorKind::NotEmpty) if the
    /// directory still has children.
    async fn remove_dir(&self, path: &Path) -> Result<()>;

    /// Remove a directory and everything beneath it.
    async fn remove_dir_all(&self, path: &Path) -> Result<()>;
}
