use crate::organize::error::{ErrorKind as OrganizeErrorKind, Result as OrganizeResult};
use crate::organize::{QuarantineReason, QuarantineRecord};
use crate::scan::LibraryItem;
use crate::{Context, free_path};
use exn::{OptionExt, ResultExt};
use kura_storage::BackendHandle;
use std::path::PathBuf;
use time::UtcDateTime;
use tracing::{error, info, instrument};

/// Moves an item into the quarantine directory under its original name
/// (suffixed on collision) and records why.
///
/// Items already sitting directly in the quarantine directory stay where they
/// are, so repeated retries do not pile up `_1` suffixes. In a dry run
/// nothing is moved. A failed move is logged and recorded without a
/// destination; it never aborts the run.
#[instrument(skip_all, fields(path = %item.path.display(), %reason))]
pub async fn quarantine(
    backend: &BackendHandle,
    ctx: &Context,
    item: &LibraryItem,
    reason: QuarantineReason,
) -> QuarantineRecord {
    let destination = if ctx.in_quarantine(&item.path) {
        Some(item.path.clone())
    } else if ctx.dry_run {
        None
    } else {
        match move_into_quarantine(backend, ctx, item).await {
            Ok(path) => {
                info!(destination = %path.display(), "item quarantined");
                Some(path)
            },
            Err(e) => {
                error!(error = ?e, "item could not be moved into quarantine");
                None
            },
        }
    };
    QuarantineRecord { original_path: item.path.clone(), destination, reason, quarantined_at: UtcDateTime::now() }
}

async fn move_into_quarantine(backend: &BackendHandle, ctx: &Context, item: &LibraryItem) -> OrganizeResult<PathBuf> {
    let name = item.path.file_name().ok_or_raise(|| OrganizeErrorKind::MoveFailed)?;
    let target = free_path(&**backend, &ctx.quarantine.join(name), !item.is_folder)
        .await
        .or_raise(|| OrganizeErrorKind::Storage)?;
    backend.rename(&item.path, &target).await.or_raise(|| OrganizeErrorKind::MoveFailed)?;
    Ok(target)
}
