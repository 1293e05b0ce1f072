use crate::Context;
use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::organize::error::{ErrorKind as OrganizeErrorKind, Result as OrganizeResult};
use crate::organize::{Outcome, Summary, organize_item};
use crate::scan::{self, LibraryItem};
use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, StreamExt, pin_mut};
use kura_storage::BackendHandle;
use tracing::{debug, instrument};

/// Where the items to organize come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intake {
    /// Loose videos and download folders at the top of the library
    /// ([`scan::intake`]).
    Root,
    /// Previously failed items ([`scan::quarantined`]).
    Quarantine,
    /// An explicit work list, used as given.
    Items(Vec<LibraryItem>),
}

/// Progress events emitted by [`organize`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete): exactly once, with the
///    number of items about to be organized.
/// 3. [`Organized`](Self::Organized): once per item, in discovery order.
/// 4. [`Complete`](Self::Complete): exactly once, signalling the stream is
///    finished.
///
/// Only a discovery failure ends the stream early, in which case
/// [`Complete`](Self::Complete) is never emitted.
#[derive(Debug)]
pub enum OrganizeEvent {
    Started,
    DiscoveryComplete(u64),
    Organized(Outcome),
    Complete,
}

/// Streams [`OrganizeEvent`]s while organizing every item from `intake`.
///
/// Items are organized one at a time and in order: the next item is only
/// looked at once the previous one has been moved, so collision suffixes
/// are assigned deterministically. [`Context::limit`] caps how many items are
/// taken.
pub fn organize<'a>(
    backend: &'a BackendHandle,
    ctx: &'a Context,
    intake: Intake,
) -> impl Stream<Item = LibraryResult<OrganizeEvent>> + 'a {
    // `rustfmt` does not format macro-specific syntax such as
    // `for await` even using the parentheses trick.
    stream! {
        for await event in organize_inner(backend, ctx, intake) {
            yield event.or_raise(|| LibraryErrorKind::Organize);
        }
    }
}

fn organize_inner<'a>(
    backend: &'a BackendHandle,
    ctx: &'a Context,
    intake: Intake,
) -> impl Stream<Item = OrganizeResult<OrganizeEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(OrganizeEvent::Started);

        let items = match discover(backend, ctx, intake).await {
            Ok(items) => items,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
        yield Ok(OrganizeEvent::DiscoveryComplete(u64::try_from(items.len()).unwrap_or(0)));

        for item in &items {
            yield Ok(OrganizeEvent::Organized(organize_item(backend, ctx, item).await));
        }

        yield Ok(OrganizeEvent::Complete);
    })
}

async fn discover(backend: &BackendHandle, ctx: &Context, intake: Intake) -> OrganizeResult<Vec<LibraryItem>> {
    let mut items = match intake {
        Intake::Root => scan::intake(backend, ctx).await.or_raise(|| OrganizeErrorKind::Scan)?,
        Intake::Quarantine => scan::quarantined(backend, ctx).await.or_raise(|| OrganizeErrorKind::Scan)?,
        Intake::Items(items) => items,
    };
    if let Some(limit) = ctx.limit {
        items.truncate(limit);
    }
    debug!(count = items.len(), "items discovered");
    Ok(items)
}

/// Drives [`organize`] to completion and tallies the outcomes.
///
/// # Errors
/// Fails only if the items could not be discovered.
#[instrument(skip_all)]
pub async fn organize_all(backend: &BackendHandle, ctx: &Context, intake: Intake) -> LibraryResult<Summary> {
    let mut summary = Summary::default();
    let events = organize(backend, ctx, intake);
    pin_mut!(events);
    while let Some(event) = events.next().await {
        if let OrganizeEvent::Organized(outcome) = event? {
            summary.record(&outcome);
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, library};
    use futures::TryStreamExt;
    use kura_config::Config;

    #[tokio::test]
    async fn test_event_order() {
        let (_dir, backend) = library(&["SSIS-001.mp4", "randomfile.mp4"]);
        let ctx = context(Config::default());
        let events: Vec<OrganizeEvent> = organize(&backend, &ctx, Intake::Root).try_collect().await.unwrap();
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], OrganizeEvent::Started));
        assert!(matches!(events[1], OrganizeEvent::DiscoveryComplete(2)));
        assert!(matches!(events[2], OrganizeEvent::Organized(Outcome::Relocated(_))));
        assert!(matches!(events[3], OrganizeEvent::Organized(Outcome::Quarantined(_))));
        assert!(matches!(events[4], OrganizeEvent::Complete));
    }

    #[tokio::test]
    async fn test_limit_takes_first_items() {
        let (dir, backend) = library(&["ABP-001.mp4", "SSIS-001.mp4"]);
        let ctx = context(Config::default()).with_limit(Some(1));
        let summary = organize_all(&backend, &ctx, Intake::Root).await.unwrap();
        assert_eq!(summary.success, 1);
        assert!(!dir.path().join("ABP-001.mp4").exists());
        assert!(dir.path().join("SSIS-001.mp4").exists());
    }

    #[tokio::test]
    async fn test_retry_reprocesses_quarantine() {
        let (dir, backend) = library(&["others/SSIS-001.mp4", "others/randomfile.mp4"]);
        let ctx = context(Config::default());
        let summary = organize_all(&backend, &ctx, Intake::Quarantine).await.unwrap();
        assert_eq!(summary.success, 1);
        assert_eq!(summary.fallback, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.quarantined[0].destination.as_deref(), Some(std::path::Path::new("others/randomfile.mp4")));
        assert!(dir.path().join("s1/Unknown/[SSIS-001] SSIS-001/[SSIS-001] SSIS-001.mp4").is_file());
    }

    #[tokio::test]
    async fn test_discovery_failure_ends_stream() {
        let (dir, backend) = library(&[]);
        std::fs::remove_dir(dir.path()).unwrap();
        let ctx = context(Config::default());
        let events: Vec<_> = organize(&backend, &ctx, Intake::Root).collect().await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Ok(OrganizeEvent::Started)));
        assert!(events[1].is_err());
    }
}
