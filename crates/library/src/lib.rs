//! The resolution-and-organization engine.
//!
//! A run looks like this:
//!
//! 1. [`scan`] walks the library behind a [`StorageBackend`](kura_storage::StorageBackend)
//!    and classifies what it finds into [`LibraryItem`](scan::LibraryItem)s.
//! 2. [`organize`] takes each item in turn: code extraction, [metadata
//!    resolution](resolve::MetadataResolver), [studio normalization](StudioNormalizer),
//!    [path construction](PathBuilder), then the move itself plus the poster
//!    and sidecar. Anything that cannot be placed is quarantined.
//! 3. [`audit`] ties both together for repair runs and prunes directories
//!    left empty.
//!
//! Everything an item needs is bundled in a [`Context`] built once per run.

pub mod asset;
pub mod audit;
pub mod error;
mod normalize;
pub mod organize;
mod path;
pub mod resolve;
pub mod scan;
#[cfg(test)]
mod testing;

pub use crate::normalize::{OTHERS, StudioNormalizer, slug};
pub use crate::path::{
    COVER_STEM, DEFAULT_TEMPLATE_FLAT, DEFAULT_TEMPLATE_FOLDER, Destination, PathBuilder, SIDECAR_NAME,
    UNKNOWN_ACTRESS, free_path, is_canonical_name, sanitize, suffix_of, with_suffix,
};
use crate::asset::AssetHandle;
use crate::error::Result;
use crate::resolve::{MetadataResolver, SourceHandle};
use kura_config::{Config, Layout};
use kura_storage::extension_of;
use std::path::{Path, PathBuf};

/// Per-run settings and collaborators shared by scanning, organizing and
/// auditing.
pub struct Context {
    pub paths: PathBuilder,
    pub normalizer: StudioNormalizer,
    pub resolver: MetadataResolver,
    /// Poster downloads are skipped entirely when `None`.
    pub assets: Option<AssetHandle>,
    /// Relative to the library root; a single directory name.
    pub quarantine: PathBuf,
    /// Lowercase, without the leading dot.
    pub video_extensions: Vec<String>,
    /// Plan only: nothing on disk is touched and no poster is downloaded.
    pub dry_run: bool,
    /// Stop after this many items.
    pub limit: Option<usize>,
}
impl Context {
    pub fn new(config: &Config, sources: Vec<SourceHandle>, assets: Option<AssetHandle>) -> Result<Self> {
        Ok(Self {
            paths: PathBuilder::new(config.layout, config.template.as_deref())?,
            normalizer: StudioNormalizer::new(&config.tables.aliases),
            resolver: MetadataResolver::new(sources, config.tables.clone()),
            assets,
            quarantine: PathBuf::from(&config.quarantine_dir),
            video_extensions: config.video_extensions.clone(),
            dry_run: false,
            limit: None,
        })
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn layout(&self) -> Layout {
        self.paths.layout()
    }

    /// Whether the path carries one of the configured video extensions
    /// (case-insensitively).
    pub fn is_video(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.video_extensions.contains(&ext))
    }

    /// Whether `path` is the quarantine directory itself.
    pub fn is_quarantine(&self, path: &Path) -> bool {
        path == self.quarantine
    }

    /// Whether `path` sits directly inside the quarantine directory.
    pub fn in_quarantine(&self, path: &Path) -> bool {
        path.parent().is_some_and(|parent| self.is_quarantine(parent))
    }
}
impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("paths", &self.paths)
            .field("quarantine", &self.quarantine)
            .field("dry_run", &self.dry_run)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}
