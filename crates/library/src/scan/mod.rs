//! Library classification.
//!
//! Three views of the same tree:
//!
//! - [`survey`] walks the structured `studio/actress/entry` levels and
//!   classifies every entry directory (see [`Classification`]).
//! - [`misplaced_videos`] is the deep scan: every video anywhere in the tree
//!   that is not in a [standard location](in_standard_location).
//! - [`intake`] and [`quarantined`] build the work lists for a plain run and
//!   for a retry of previously failed items.
//!
//! Listings are sorted by name, so every view is deterministic.

pub mod error;

use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::path::{SIDECAR_NAME, is_canonical_name};
use crate::scan::error::{ErrorKind as ScanErrorKind, Result as ScanResult};
use crate::{Context, slug};
use derive_more::Display;
use exn::ResultExt;
use futures::StreamExt;
use kura_config::Layout;
use kura_extract::extract_code;
use kura_storage::error::ErrorKind as StorageErrorKind;
use kura_storage::{BackendHandle, Entry};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Bracketed name and at least one video.
    #[display("standard")]
    Standard,
    /// No video anywhere beneath it; safe to delete.
    #[display("empty")]
    Empty,
    /// Holds a video but is not named like an organized item.
    #[display("non-standard")]
    NonStandard,
    /// Could not be listed; skipped.
    #[display("inaccessible")]
    Inaccessible,
}

/// One unit of work (or of reporting) produced by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryItem {
    /// Relative to the library root.
    pub path: PathBuf,
    /// A folder item is moved whole; a file item is moved on its own.
    pub is_folder: bool,
    pub classification: Classification,
}
impl LibraryItem {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), is_folder: false, classification: Classification::NonStandard }
    }

    pub fn folder(path: impl Into<PathBuf>, classification: Classification) -> Self {
        Self { path: path.into(), is_folder: true, classification }
    }

    pub fn name(&self) -> String {
        self.path.file_name().map(OsStr::to_string_lossy).unwrap_or_default().into_owned()
    }
}

/// Whether a video already sits where an organized item keeps it.
///
/// - Folder layout: the parent directory has a bracketed name and holds a
///   `metadata.json`.
/// - Flat layout: the file stem is bracketed and a `<stem>.json` sits beside it.
///
/// `present` is the set of every file path in the listing the video came from.
pub fn in_standard_location(layout: Layout, video: &Path, present: &HashSet<&Path>) -> bool {
    match layout {
        Layout::Folder => video.parent().is_some_and(|dir| {
            dir.file_name().and_then(OsStr::to_str).is_some_and(is_canonical_name)
                && present.contains(dir.join(SIDECAR_NAME).as_path())
        }),
        Layout::Flat => video.file_stem().and_then(OsStr::to_str).is_some_and(|stem| {
            is_canonical_name(stem) && present.contains(video.with_file_name(format!("{stem}.json")).as_path())
        }),
    }
}

/// Classifies every entry directory under `<studio>/<actress>/`.
///
/// Studio and actress directories without any children are reported as
/// [`Empty`](Classification::Empty) themselves. The quarantine directory is
/// never descended into.
///
/// # Errors
/// Fails only if the library root cannot be listed.
#[instrument(skip_all)]
pub async fn survey(backend: &BackendHandle, ctx: &Context) -> LibraryResult<Vec<LibraryItem>> {
    survey_inner(backend, ctx).await.or_raise(|| LibraryErrorKind::Scan)
}

async fn survey_inner(backend: &BackendHandle, ctx: &Context) -> ScanResult<Vec<LibraryItem>> {
    let studios = backend.list_dir(None).await.or_raise(|| ScanErrorKind::RootUnavailable)?;
    let mut items = Vec::new();
    for studio in studios.into_iter().filter(|e| e.is_dir() && !ctx.is_quarantine(&e.path)) {
        let Some(actresses) = descend(backend, &studio.path, &mut items).await else {
            continue;
        };
        for actress in actresses.into_iter().filter(Entry::is_dir) {
            let Some(entries) = descend(backend, &actress.path, &mut items).await else {
                continue;
            };
            for entry in entries.into_iter().filter(Entry::is_dir) {
                let classification = classify(backend, ctx, &entry.path).await;
                items.push(LibraryItem::folder(entry.path, classification));
            }
        }
    }
    debug!(count = items.len(), "survey complete");
    Ok(items)
}

/// Lists the children of `dir`, or records `dir` itself when there is
/// nothing to descend into.
async fn descend(backend: &BackendHandle, dir: &Path, items: &mut Vec<LibraryItem>) -> Option<Vec<Entry>> {
    match backend.list_dir(Some(dir)).await {
        Ok(children) if children.is_empty() => {
            items.push(LibraryItem::folder(dir, Classification::Empty));
            None
        },
        Ok(children) => Some(children),
        Err(e) => {
            warn!(path = %dir.display(), error = ?e, "directory is inaccessible");
            items.push(LibraryItem::folder(dir, Classification::Inaccessible));
            None
        },
    }
}

/// Classifies a single directory. Videos are looked for recursively, so a
/// directory is only ever [`Empty`](Classification::Empty) if deleting it
/// cannot lose a video.
pub async fn classify(backend: &BackendHandle, ctx: &Context, dir: &Path) -> Classification {
    match backend.list(Some(dir)).await {
        Err(e) => {
            warn!(path = %dir.display(), error = ?e, "directory is inaccessible");
            Classification::Inaccessible
        },
        Ok(files) if !files.iter().any(|f| ctx.is_video(&f.path)) => Classification::Empty,
        Ok(_) if dir.file_name().and_then(OsStr::to_str).is_some_and(is_canonical_name) => Classification::Standard,
        Ok(_) => Classification::NonStandard,
    }
}

/// Every video in the library, at any depth, that is not in a [standard
/// location](in_standard_location). The quarantine directory is included.
///
/// Directories that cannot be listed are logged and skipped.
#[instrument(skip_all)]
pub async fn misplaced_videos(backend: &BackendHandle, ctx: &Context) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stream = backend.list_stream(None);
    while let Some(entry) = stream.next().await {
        match entry {
            Ok(entry) => files.push(entry.path),
            Err(e) => warn!(error = ?e, "skipping unreadable directory"),
        }
    }
    let present: HashSet<&Path> = files.iter().map(PathBuf::as_path).collect();
    let misplaced: Vec<PathBuf> = files
        .iter()
        .filter(|path| ctx.is_video(path) && !in_standard_location(ctx.layout(), path, &present))
        .cloned()
        .collect();
    debug!(count = misplaced.len(), "deep scan complete");
    misplaced
}

/// Work items for a plain run: loose videos at the top level of the library,
/// plus top-level directories that look like downloads rather than studio
/// folders (their name carries a code, or is not already a slug).
///
/// # Errors
/// Fails only if the library root cannot be listed.
#[instrument(skip_all)]
pub async fn intake(backend: &BackendHandle, ctx: &Context) -> LibraryResult<Vec<LibraryItem>> {
    intake_inner(backend, ctx).await.or_raise(|| LibraryErrorKind::Scan)
}

async fn intake_inner(backend: &BackendHandle, ctx: &Context) -> ScanResult<Vec<LibraryItem>> {
    let entries = backend.list_dir(None).await.or_raise(|| ScanErrorKind::RootUnavailable)?;
    let mut items = Vec::new();
    for entry in entries {
        if entry.is_file() {
            if ctx.is_video(&entry.path) {
                items.push(LibraryItem::file(entry.path));
            }
            continue;
        }
        if ctx.is_quarantine(&entry.path) || !is_download_dir(&entry.name()) {
            continue;
        }
        items.extend(items_for_dir(backend, ctx, &entry.path, Classification::NonStandard).await);
    }
    Ok(items)
}

fn is_download_dir(name: &str) -> bool {
    extract_code(name).is_some() || slug(name) != name
}

/// Work items for a retry pass: everything directly inside the quarantine
/// directory. A missing quarantine directory means there is nothing to retry.
#[instrument(skip_all)]
pub async fn quarantined(backend: &BackendHandle, ctx: &Context) -> LibraryResult<Vec<LibraryItem>> {
    quarantined_inner(backend, ctx).await.or_raise(|| LibraryErrorKind::Scan)
}

async fn quarantined_inner(backend: &BackendHandle, ctx: &Context) -> ScanResult<Vec<LibraryItem>> {
    let entries = match backend.list_dir(Some(&ctx.quarantine)).await {
        Ok(entries) => entries,
        Err(e) if matches!(&*e, StorageErrorKind::NotFound(_)) => return Ok(Vec::new()),
        Err(e) => return Err(e).or_raise(|| ScanErrorKind::Storage),
    };
    let mut items = Vec::new();
    for entry in entries {
        if entry.is_dir() {
            items.extend(items_for_dir(backend, ctx, &entry.path, Classification::NonStandard).await);
        } else if ctx.is_video(&entry.path) {
            items.push(LibraryItem::file(entry.path));
        }
    }
    Ok(items)
}

/// Turns a directory into work items: the directory itself when its only
/// video is misplaced, otherwise one file item per misplaced video.
pub(crate) async fn items_for_dir(
    backend: &BackendHandle,
    ctx: &Context,
    dir: &Path,
    classification: Classification,
) -> Vec<LibraryItem> {
    let files: Vec<PathBuf> = match backend.list(Some(dir)).await {
        Ok(files) => files.into_iter().map(|f| f.path).collect(),
        Err(e) => {
            warn!(path = %dir.display(), error = ?e, "directory is inaccessible");
            return Vec::new();
        },
    };
    let present: HashSet<&Path> = files.iter().map(PathBuf::as_path).collect();
    let videos: Vec<&Path> = files.iter().map(PathBuf::as_path).filter(|p| ctx.is_video(p)).collect();
    let misplaced: Vec<&Path> =
        videos.iter().copied().filter(|p| !in_standard_location(ctx.layout(), p, &present)).collect();
    match (videos.len(), misplaced.len()) {
        (1, 1) => vec![LibraryItem::folder(dir, classification)],
        _ => misplaced.into_iter().map(LibraryItem::file).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, library};
    use kura_config::Config;

    #[tokio::test]
    async fn test_survey_classifies_entries() {
        let (_dir, backend) = library(&[
            "s1/Yua Mikami/[SSIS-001] Title/[SSIS-001] Title.mp4",
            "s1/Yua Mikami/[SSIS-001] Title/metadata.json",
            "s1/Yua Mikami/leftovers/cover.jpg",
            "s1/Yua Mikami/download/ssis002.mkv",
            "s1/Empty Actress/",
            "empty-studio/",
            "others/randomfile.mp4",
            "others/nothing/",
        ]);
        let ctx = context(Config::default());
        let items = survey(&backend, &ctx).await.unwrap();
        let found: Vec<(&str, Classification)> =
            items.iter().map(|i| (i.path.to_str().unwrap(), i.classification)).collect();
        assert_eq!(found, vec![
            ("empty-studio", Classification::Empty),
            ("s1/Empty Actress", Classification::Empty),
            ("s1/Yua Mikami/[SSIS-001] Title", Classification::Standard),
            ("s1/Yua Mikami/download", Classification::NonStandard),
            ("s1/Yua Mikami/leftovers", Classification::Empty),
        ]);
        assert!(items.iter().all(|i| i.is_folder));
    }

    #[tokio::test]
    async fn test_nested_video_is_not_empty() {
        let (_dir, backend) = library(&["s1/Rei/extras/deep/down/clip.mp4"]);
        let ctx = context(Config::default());
        assert_eq!(classify(&backend, &ctx, Path::new("s1/Rei/extras")).await, Classification::NonStandard);
    }

    #[tokio::test]
    async fn test_missing_root_is_fatal() {
        let (dir, backend) = library(&[]);
        std::fs::remove_dir(dir.path()).unwrap();
        let ctx = context(Config::default());
        assert!(survey(&backend, &ctx).await.is_err());
        assert!(intake(&backend, &ctx).await.is_err());
    }

    #[tokio::test]
    async fn test_deep_scan_folder_layout() {
        let (_dir, backend) = library(&[
            "s1/Yua Mikami/[SSIS-001] Title/[SSIS-001] Title.mp4",
            "s1/Yua Mikami/[SSIS-001] Title/metadata.json",
            "s1/Yua Mikami/[SSIS-002] No Sidecar/[SSIS-002] No Sidecar.mp4",
            "s1/Yua Mikami/loose.mkv",
            "s1/Yua Mikami/loose.nfo",
            "others/randomfile.mp4",
        ]);
        let ctx = context(Config::default());
        let found = misplaced_videos(&backend, &ctx).await;
        assert_eq!(found, vec![
            PathBuf::from("others/randomfile.mp4"),
            PathBuf::from("s1/Yua Mikami/loose.mkv"),
            PathBuf::from("s1/Yua Mikami/[SSIS-002] No Sidecar/[SSIS-002] No Sidecar.mp4"),
        ]);
    }

    #[tokio::test]
    async fn test_deep_scan_flat_layout() {
        let (_dir, backend) = library(&[
            "s1/[SSIS-001]-[Title].mp4",
            "s1/[SSIS-001]-[Title].json",
            "s1/[SSIS-002]-[Title].mp4",
            "s1/random.mp4",
        ]);
        let ctx = context(Config { layout: Layout::Flat, ..Default::default() });
        let found = misplaced_videos(&backend, &ctx).await;
        assert_eq!(found, vec![PathBuf::from("s1/[SSIS-002]-[Title].mp4"), PathBuf::from("s1/random.mp4")]);
    }

    #[tokio::test]
    async fn test_intake() {
        let (_dir, backend) = library(&[
            "SSIS-001.mp4",
            "notes.txt",
            "IPX-123 uncut/ipx123.mkv",
            "IPX-123 uncut/sample.jpg",
            "Batch Download/a.mp4",
            "Batch Download/b.mp4",
            "Batch Download/b.nfo",
            "no-videos-here/readme.txt",
            "others/randomfile.mp4",
            "s1/Yua Mikami/loose.mp4",
        ]);
        let ctx = context(Config::default());
        let items = intake(&backend, &ctx).await.unwrap();
        assert_eq!(items, vec![
            LibraryItem::file("Batch Download/a.mp4"),
            LibraryItem::file("Batch Download/b.mp4"),
            LibraryItem::folder("IPX-123 uncut", Classification::NonStandard),
            LibraryItem::file("SSIS-001.mp4"),
        ]);
    }

    #[tokio::test]
    async fn test_quarantined() {
        let (_dir, backend) = library(&[
            "others/randomfile.mp4",
            "others/readme.txt",
            "others/ABP-001 folder/abp001.avi",
            "others/Unknown/[ZZZTEST-999] ZZZTEST-999/[ZZZTEST-999] ZZZTEST-999.mp4",
            "others/Unknown/[ZZZTEST-999] ZZZTEST-999/metadata.json",
        ]);
        let ctx = context(Config::default());
        let items = quarantined(&backend, &ctx).await.unwrap();
        assert_eq!(items, vec![
            LibraryItem::folder("others/ABP-001 folder", Classification::NonStandard),
            LibraryItem::file("others/randomfile.mp4"),
        ]);
    }

    #[tokio::test]
    async fn test_missing_quarantine_is_empty() {
        let (_dir, backend) = library(&["SSIS-001.mp4"]);
        let ctx = context(Config::default());
        assert!(quarantined(&backend, &ctx).await.unwrap().is_empty());
    }
}
