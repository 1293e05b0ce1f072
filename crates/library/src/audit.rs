//! Consistency audit and repair.
//!
//! [`repair`] surveys the structured levels of the library, deletes empty
//! directories bottom-up, and (unless only cleaning) feeds every misplaced
//! video back through [`organize`](crate::organize::organize). Directories a
//! relocation leaves behind are pruned the same way.
//!
//! Pruning walks upwards one level at a time, re-checking emptiness after
//! each deletion. It stops below the library root and never removes the
//! quarantine directory. In a dry run deletions are only simulated: a
//! directory counts as empty once all of its children would have been
//! removed.

use crate::Context;
use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::organize::{Intake, OrganizeEvent, Outcome, Summary, organize};
use crate::scan::{self, Classification, LibraryItem};
use exn::ResultExt;
use futures::{StreamExt, pin_mut};
use kura_storage::BackendHandle;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// What a [`repair`] run found and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// Item folders that already conform.
    pub standard: u64,
    /// Directories deleted (or, in a dry run, that would have been).
    pub pruned: Vec<PathBuf>,
    /// Directories that could not be listed and were skipped.
    pub inaccessible: Vec<PathBuf>,
    pub summary: Summary,
}

/// Audits the library and repairs what does not conform.
///
/// With `clean_only` only empty directories are pruned; nothing is moved.
///
/// # Errors
/// Fails only if the library root cannot be listed.
#[instrument(skip_all, fields(clean_only = clean_only, dry_run = ctx.dry_run))]
pub async fn repair(backend: &BackendHandle, ctx: &Context, clean_only: bool) -> LibraryResult<AuditReport> {
    let entries = scan::survey(backend, ctx).await.or_raise(|| LibraryErrorKind::Audit)?;
    let mut report = AuditReport::default();
    let mut pruner = Pruner::new(backend, ctx);
    let mut non_standard = Vec::new();
    for entry in entries {
        match entry.classification {
            Classification::Standard => report.standard += 1,
            Classification::Inaccessible => report.inaccessible.push(entry.path),
            Classification::Empty => {
                if pruner.remove_tree(&entry.path).await {
                    pruner.prune_upwards(entry.path.parent()).await;
                }
            },
            Classification::NonStandard => non_standard.push(entry.path),
        }
    }

    if !clean_only {
        let work = work_list(backend, ctx, &non_standard).await;
        info!(count = work.len(), "reorganizing misplaced items");
        let events = organize(backend, ctx, Intake::Items(work));
        pin_mut!(events);
        while let Some(event) = events.next().await {
            let OrganizeEvent::Organized(outcome) = event.or_raise(|| LibraryErrorKind::Audit)? else {
                continue;
            };
            if let Outcome::Relocated(relocation) = &outcome {
                pruner.prune_upwards(relocation.from.parent()).await;
            }
            report.summary.record(&outcome);
        }
    }

    report.pruned = pruner.pruned;
    Ok(report)
}

/// Non-standard folders first (as folder items where possible), then every
/// other misplaced video in the library.
async fn work_list(backend: &BackendHandle, ctx: &Context, non_standard: &[PathBuf]) -> Vec<LibraryItem> {
    let mut work = Vec::new();
    for dir in non_standard {
        work.extend(scan::items_for_dir(backend, ctx, dir, Classification::NonStandard).await);
    }
    let loose = scan::misplaced_videos(backend, ctx)
        .await
        .into_iter()
        .filter(|video| !non_standard.iter().any(|dir| video.starts_with(dir)))
        .map(LibraryItem::file);
    work.extend(loose);
    work
}

struct Pruner<'a> {
    backend: &'a BackendHandle,
    ctx: &'a Context,
    /// Everything deleted so far, consulted in dry runs.
    removed: HashSet<PathBuf>,
    pruned: Vec<PathBuf>,
}
impl<'a> Pruner<'a> {
    fn new(backend: &'a BackendHandle, ctx: &'a Context) -> Self {
        Self { backend, ctx, removed: HashSet::new(), pruned: Vec::new() }
    }

    fn mark(&mut self, dir: &Path) {
        info!(path = %dir.display(), dry_run = self.ctx.dry_run, "pruned empty directory");
        self.removed.insert(dir.to_path_buf());
        self.pruned.push(dir.to_path_buf());
    }

    /// Deletes a directory holding no video, with whatever else it contains.
    async fn remove_tree(&mut self, dir: &Path) -> bool {
        if !self.ctx.dry_run
            && let Err(e) = self.backend.remove_dir_all(dir).await
        {
            warn!(path = %dir.display(), error = ?e, "empty directory could not be removed");
            return false;
        }
        self.mark(dir);
        true
    }

    /// Removes `dir`, then its parent, and so on while they are empty.
    async fn prune_upwards(&mut self, dir: Option<&Path>) {
        let mut current = dir.map(Path::to_path_buf);
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() || self.ctx.is_quarantine(&dir) || !self.is_empty(&dir).await {
                break;
            }
            if !self.ctx.dry_run
                && let Err(e) = self.backend.remove_dir(&dir).await
            {
                debug!(path = %dir.display(), error = ?e, "stopped pruning");
                break;
            }
            self.mark(&dir);
            current = dir.parent().map(Path::to_path_buf);
        }
    }

    async fn is_empty(&self, dir: &Path) -> bool {
        match self.backend.list_dir(Some(dir)).await {
            Ok(children) => children.iter().all(|child| self.removed.contains(&child.path)),
            Err(_) => false,
        }
    }
}
