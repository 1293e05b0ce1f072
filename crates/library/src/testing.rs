//! Scratch libraries for unit tests.

use crate::Context;
use kura_config::Config;
use kura_storage::BackendHandle;
use kura_storage::backend::LocalBackend;
use std::sync::Arc;
use tempfile::TempDir;

/// Creates a temporary library. Paths ending in `/` become empty
/// directories; everything else becomes a file containing its own path.
pub(crate) fn library(paths: &[&str]) -> (TempDir, BackendHandle) {
    let dir = tempfile::tempdir().unwrap();
    for path in paths {
        let absolute = dir.path().join(path);
        if path.ends_with('/') {
            std::fs::create_dir_all(&absolute).unwrap();
        } else {
            std::fs::create_dir_all(absolute.parent().unwrap()).unwrap();
            std::fs::write(&absolute, path.as_bytes()).unwrap();
        }
    }
    let backend = LocalBackend::new("test", dir.path()).unwrap();
    (dir, Arc::new(backend))
}

/// A context without any metadata source or asset fetcher.
pub(crate) fn context(config: Config) -> Context {
    Context::new(&config, vec![], None).unwrap()
}
