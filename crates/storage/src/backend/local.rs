//! Local filesystem storage backend.
//!
//! Paths are resolved against a configured library root and accessed via
//! `tokio::fs` for async I/O.

use crate::backend::EntryStream;
use crate::error::ErrorKind;
use crate::{Entry, EntryKind, StorageBackend, error::Result, path::validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem storage backend.
///
/// # Examples
///
/// ```no_run
/// use kura_storage::backend::LocalBackend;
///
/// # fn example() -> kura_storage::error::Result<()> {
/// let backend = LocalBackend::new("library", "/srv/media/library")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct LocalBackend {
    name: String,
    /// Root directory for the library
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPath`](ErrorKind::InvalidPath) if the path is not
    /// absolute or is not a directory, and [`NotFound`](ErrorKind::NotFound)
    /// if it does not exist. A missing library root aborts the whole run, so
    /// it is never created implicitly.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        // Non-async: happens once at startup, not worth an async constructor.
        let metadata = std::fs::metadata(&root).map_err(|e| Self::map_io_error(e, &root))?;
        if !metadata.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        Ok(Self { name: name.into(), root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validates the path and joins it with the root directory.
    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    /// Absolute path of an optional directory, where `None` means the root.
    fn absolute_dir(&self, dir: Option<&Path>) -> Result<PathBuf> {
        match dir {
            Some(dir) => self.absolute_path(dir),
            None => Ok(self.root.clone()),
        }
    }

    /// Convert an absolute path found while walking back to a root-relative one.
    fn relative_path(&self, absolute: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = absolute.as_ref();
        let relative = absolute.strip_prefix(&self.root).or_raise(|| ErrorKind::OutsideRoot(absolute.to_path_buf()))?;
        Ok(validate_path(relative)?)
    }

    fn entry(relative: PathBuf, metadata: &Metadata) -> Entry {
        match metadata.is_dir() {
            true => Entry::new(relative, EntryKind::Dir, 0),
            false => Entry::new(relative, EntryKind::File, metadata.len()),
        }
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists(path.to_path_buf()),
            std::io::ErrorKind::DirectoryNotEmpty => ErrorKind::NotEmpty(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Immediate children of an absolute directory, sorted by name. Entries
    /// that are neither files nor directories (most likely broken symlinks)
    /// are silently dropped.
    async fn read_sorted(&self, absolute: &Path) -> Result<Vec<Entry>> {
        let mut entries = fs::read_dir(absolute).await.map_err(|e| Self::map_io_error(e, absolute))?;
        let mut children = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| Self::map_io_error(e, absolute))? {
            let path = entry.path();
            // Follow symlinks so a linked video counts as a video.
            let metadata = match fs::metadata(&path).await {
                Ok(m) => m,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => exn::bail!(Self::map_io_error(e, &path)),
            };
            if !metadata.is_dir() && !metadata.is_file() {
                continue;
            }
            children.push(Self::entry(self.relative_path(&path)?, &metadata));
        }
        children.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(children)
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> EntryStream<'a> {
        let start_dir = match self.absolute_dir(prefix) {
            Ok(dir) => dir,
            Err(e) => return Box::pin(futures::stream::once(async { Result::Err(e) })),
        };
        let mut stack = vec![start_dir];

        Box::pin(stream! {
            'dirs: while let Some(current) = stack.pop() {
                let children = match self.read_sorted(&current).await {
                    Ok(children) => children,
                    // Asking for the contents of a directory that doesn't
                    // exist results in an empty list, not an error.
                    Err(e) if matches!(&*e, ErrorKind::NotFound(_)) => continue 'dirs,
                    Err(e) => {
                        yield Err(e);
                        continue 'dirs;
                    },
                };
                let mut descend = Vec::new();
                for child in children {
                    match child.kind {
                        EntryKind::File => yield Ok(child),
                        EntryKind::Dir => descend.push(self.root.join(&child.path)),
                    }
                }
                // Reversed so that popping visits subdirectories alphabetically.
                stack.extend(descend.into_iter().rev());
            }
        })
    }

    async fn list_dir(&self, dir: Option<&Path>) -> Result<Vec<Entry>> {
        let absolute = self.absolute_dir(dir)?;
        self.read_sorted(&absolute).await
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::try_exists(&abs_path).await.map_err(ErrorKind::Io)?)
    }

    async fn stat(&self, path: &Path) -> Result<Entry> {
        let abs_path = self.absolute_path(path)?;
        let metadata = fs::metadata(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?;
        Ok(Self::entry(validate_path(path)?, &metadata))
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, path))?;
        }
        Ok(fs::write(&abs_path, data).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from_path = self.absolute_path(from)?;
        let to_path = self.absolute_path(to)?;
        if !fs::try_exists(&from_path).await.map_err(ErrorKind::Io)? {
            exn::bail!(ErrorKind::NotFound(from.to_path_buf()));
        }
        if fs::try_exists(&to_path).await.map_err(ErrorKind::Io)? {
            exn::bail!(ErrorKind::AlreadyExists(to.to_path_buf()));
        }
        if let Some(parent) = to_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, to))?;
        }
        Ok(fs::rename(&from_path, &to_path).await.map_err(|e| Self::map_io_error(e, from))?)
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::create_dir_all(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn remove_dir(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::remove_dir(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::remove_dir_all(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> (tempfile::TempDir, LocalBackend) {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("test", temp_dir.path()).unwrap();
        (temp_dir, backend)
    }

    #[test]
    fn test_new_requires_existing_absolute_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("name", temp_dir.path()).is_ok());
        assert!(LocalBackend::new("name", "relative/path").is_err());
        let missing = LocalBackend::new("name", temp_dir.path().join("missing")).unwrap_err();
        assert!(matches!(&*missing, ErrorKind::NotFound(_)));
        std::fs::write(temp_dir.path().join("file"), b"x").unwrap();
        let not_dir = LocalBackend::new("name", temp_dir.path().join("file")).unwrap_err();
        assert!(matches!(&*not_dir, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_absolute_and_relative_paths() {
        let (temp_dir, backend) = backend();
        let expected = temp_dir.path().join("s1/Unknown/video.mp4");
        assert_eq!(backend.absolute_path(Path::new("s1/Unknown/video.mp4")).unwrap(), expected);
        assert_eq!(backend.relative_path(&expected).unwrap(), Path::new("s1/Unknown/video.mp4"));
        assert!(backend.absolute_path(Path::new("../etc/passwd")).is_err());
        assert!(backend.relative_path(Path::new("/other/file.mp4")).is_err());
    }

    #[tokio::test]
    async fn test_write_and_stat() {
        let (temp_dir, backend) = backend();
        backend.write(Path::new("a/b/metadata.json"), b"{}").await.unwrap();
        assert_eq!(std::fs::read(temp_dir.path().join("a/b/metadata.json")).unwrap(), b"{}");
        let file = backend.stat(Path::new("a/b/metadata.json")).await.unwrap();
        assert_eq!(file, Entry::new("a/b/metadata.json", EntryKind::File, 2));
        let dir = backend.stat(Path::new("a/b")).await.unwrap();
        assert!(dir.is_dir());
        let missing = backend.stat(Path::new("a/b/cover.jpg")).await.unwrap_err();
        assert!(matches!(&*missing, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_stream_is_recursive_and_sorted() {
        let (_temp_dir, backend) = backend();
        for path in ["b/2.mp4", "a/z/3.mp4", "a/1.mp4", "root.mkv"] {
            backend.write(Path::new(path), b"data").await.unwrap();
        }
        let files = backend.list(None).await.unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.to_string_lossy().into_owned()).collect();
        assert_eq!(paths, vec!["root.mkv", "a/1.mp4", "a/z/3.mp4", "b/2.mp4"]);
        let scoped = backend.list(Some(Path::new("a"))).await.unwrap();
        assert_eq!(scoped.len(), 2);
        assert!(backend.list(Some(Path::new("missing"))).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_dir_returns_immediate_children() {
        let (_temp_dir, backend) = backend();
        backend.write(Path::new("s1/Unknown/[SSIS-001] T/SSIS-001.mp4"), b"v").await.unwrap();
        backend.write(Path::new("loose.mp4"), b"v").await.unwrap();
        let root = backend.list_dir(None).await.unwrap();
        assert_eq!(root, vec![Entry::new("loose.mp4", EntryKind::File, 1), Entry::new("s1", EntryKind::Dir, 0)]);
        let studio = backend.list_dir(Some(Path::new("s1"))).await.unwrap();
        assert_eq!(studio, vec![Entry::new("s1/Unknown", EntryKind::Dir, 0)]);
        let missing = backend.list_dir(Some(Path::new("nope"))).await.unwrap_err();
        assert!(matches!(&*missing, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rename_moves_directories_and_refuses_overwrite() {
        let (_temp_dir, backend) = backend();
        backend.write(Path::new("incoming/SSIS-001/video.mp4"), b"v").await.unwrap();
        backend.write(Path::new("taken/video.mp4"), b"v").await.unwrap();
        backend.rename(Path::new("incoming/SSIS-001"), Path::new("s1/Unknown/[SSIS-001] T")).await.unwrap();
        assert!(backend.exists(Path::new("s1/Unknown/[SSIS-001] T/video.mp4")).await.unwrap());
        assert!(!backend.exists(Path::new("incoming/SSIS-001")).await.unwrap());

        let err = backend.rename(Path::new("s1/Unknown/[SSIS-001] T"), Path::new("taken")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
        let err = backend.rename(Path::new("ghost.mp4"), Path::new("elsewhere.mp4")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_dir_requires_empty() {
        let (_temp_dir, backend) = backend();
        backend.write(Path::new("s1/Unknown/cover.jpg"), b"x").await.unwrap();
        let err = backend.remove_dir(Path::new("s1/Unknown")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotEmpty(_)));
        backend.remove_dir_all(Path::new("s1/Unknown")).await.unwrap();
        backend.remove_dir(Path::new("s1")).await.unwrap();
        assert!(!backend.exists(Path::new("s1")).await.unwrap());
    }

    #[tokio::test]
    async fn test_path_security() {
        let (_temp_dir, backend) = backend();
        assert!(backend.stat(Path::new("../etc/passwd")).await.is_err());
        assert!(backend.write(Path::new("../escape"), b"data").await.is_err());
        assert!(backend.remove_dir_all(Path::new("a/../..")).await.is_err());
        assert!(backend.rename(Path::new("x"), Path::new("../y")).await.is_err());
    }
}
