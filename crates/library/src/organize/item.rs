use crate::organize::error::{ErrorKind as OrganizeErrorKind, Result as OrganizeResult};
use crate::organize::quarantine::quarantine;
use crate::organize::sidecar::write_sidecar;
use crate::organize::{Outcome, Relocation};
use crate::scan::LibraryItem;
use crate::{Context, Destination, free_path, suffix_of};
use exn::ResultExt;
use kura_config::Layout;
use kura_extract::models::Metadata;
use kura_extract::{Code, extract_code};
use kura_storage::error::ErrorKind as StorageErrorKind;
use kura_storage::{BackendHandle, extension_of};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Cover extensions recognized when deciding whether a poster is already present.
const COVER_EXTENSIONS: [&str; 4] = ["jpg", "png", "webp", "gif"];

/// Organizes a single item, quarantining it if it cannot be placed.
///
/// Never fails: every error ends up in an
/// [`Outcome::Quarantined`] record.
#[instrument(skip_all, fields(path = %item.path.display()))]
pub async fn organize_item(backend: &BackendHandle, ctx: &Context, item: &LibraryItem) -> Outcome {
    match place(backend, ctx, item).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = ?e, "item could not be organized");
            Outcome::Quarantined(quarantine(backend, ctx, item, e.reason()).await)
        },
    }
}

/// What actually gets moved for an item.
struct Subject {
    /// The path that moves: the item's folder, or a single video.
    path: PathBuf,
    video: PathBuf,
    is_folder: bool,
    /// Names a code is looked for in, most specific first.
    names: Vec<String>,
}
impl Subject {
    async fn locate(backend: &BackendHandle, ctx: &Context, item: &LibraryItem) -> OrganizeResult<Self> {
        if !item.is_folder {
            return Ok(Self {
                path: item.path.clone(),
                video: item.path.clone(),
                is_folder: false,
                names: vec![item.name()],
            });
        }
        let files = backend.list(Some(&item.path)).await.or_raise(|| OrganizeErrorKind::Storage)?;
        let Some(video) = files.into_iter().map(|f| f.path).find(|p| ctx.is_video(p)) else {
            exn::bail!(OrganizeErrorKind::Storage);
        };
        let names = vec![item.name(), file_name(&video)];
        // A flat library has no item folders: the video is moved on its own.
        Ok(match ctx.layout() {
            Layout::Folder => Self { path: item.path.clone(), video, is_folder: true, names },
            Layout::Flat => Self { path: video.clone(), video, is_folder: false, names },
        })
    }

    fn code(&self) -> OrganizeResult<Code> {
        match self.names.iter().find_map(|name| extract_code(name)) {
            Some(code) => Ok(code),
            None => exn::bail!(OrganizeErrorKind::CodeNotFound(self.names.first().cloned().unwrap_or_default())),
        }
    }

    /// The destination the subject already occupies: the base itself or one
    /// of its `_N` collision siblings. Such an item must not be moved (and
    /// must not collide with itself).
    fn placed_at(&self, base: &Destination) -> Option<Destination> {
        let (occupied, is_file) = match base {
            Destination::Folder(_) if self.is_folder => (self.path.as_path(), false),
            Destination::Folder(_) => (self.video.parent()?, false),
            Destination::File(_) => (self.path.as_path(), true),
        };
        if occupied != base.path() && suffix_of(occupied, base.path(), is_file).is_none() {
            return None;
        }
        Some(match base {
            Destination::Folder(_) => Destination::Folder(occupied.to_path_buf()),
            Destination::File(_) => Destination::File(occupied.to_path_buf()),
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().map(OsStr::to_string_lossy).unwrap_or_default().into_owned()
}

async fn place(backend: &BackendHandle, ctx: &Context, item: &LibraryItem) -> OrganizeResult<Outcome> {
    let subject = Subject::locate(backend, ctx, item).await?;
    let code = subject.code()?;
    let metadata = ctx.resolver.resolve(&code).await;
    let studio = ctx.normalizer.normalize(&metadata.studio);
    let extension = extension_of(&subject.video);
    let base =
        ctx.paths.destination(&studio, &metadata, extension.as_deref()).or_raise(|| OrganizeErrorKind::Template)?;

    let placed = subject.placed_at(&base);
    let in_place = placed.is_some();
    let destination = match placed {
        Some(destination) => destination,
        None => {
            let is_file = matches!(base, Destination::File(_));
            let free = free_path(&**backend, base.path(), is_file).await.or_raise(|| OrganizeErrorKind::Storage)?;
            match base {
                Destination::Folder(_) => Destination::Folder(free),
                Destination::File(_) => Destination::File(free),
            }
        },
    };
    let mut relocation = Relocation {
        from: item.path.clone(),
        to: destination.path().to_path_buf(),
        code,
        source: metadata.source,
        poster: false,
        sidecar: false,
    };
    if ctx.dry_run {
        info!(destination = %relocation.to.display(), "would organize item");
        return Ok(Outcome::Planned(relocation));
    }

    move_subject(backend, &subject, &destination, extension.as_deref(), in_place).await?;

    relocation.poster = match fetch_poster(backend, ctx, &metadata, &destination).await {
        Ok(downloaded) => downloaded,
        Err(e) => {
            warn!(error = ?e, "poster could not be stored");
            false
        },
    };
    relocation.sidecar = match write_sidecar(backend, &metadata, &destination).await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = ?e, "sidecar could not be written");
            false
        },
    };
    Ok(match in_place {
        true => {
            debug!("item already in place");
            Outcome::AlreadyCorrect(relocation)
        },
        false => {
            info!(destination = %relocation.to.display(), source = %relocation.source, "item organized");
            Outcome::Relocated(relocation)
        },
    })
}

/// Moves the subject to its destination, then gives the video its canonical
/// name. Only the first step can fail the item.
async fn move_subject(
    backend: &BackendHandle,
    subject: &Subject,
    destination: &Destination,
    extension: Option<&str>,
    in_place: bool,
) -> OrganizeResult<()> {
    let video_target = destination.video(extension);
    match (destination, subject.is_folder) {
        (Destination::Folder(dir), true) => {
            if !in_place {
                backend.rename(&subject.path, dir).await.or_raise(|| OrganizeErrorKind::MoveFailed)?;
            }
            let inner = subject.video.strip_prefix(&subject.path).unwrap_or(&subject.video);
            let moved_video = dir.join(inner);
            if moved_video != video_target
                && let Err(e) = backend.rename(&moved_video, &video_target).await
            {
                warn!(error = ?e, video = %moved_video.display(), "video inside item folder could not be renamed");
            }
        },
        (Destination::Folder(_), false) if in_place => {
            // Only rename when the canonical name is free; a second video in
            // the same folder is left untouched.
            if subject.video != video_target
                && !backend.exists(&video_target).await.or_raise(|| OrganizeErrorKind::Storage)?
            {
                backend.rename(&subject.video, &video_target).await.or_raise(|| OrganizeErrorKind::MoveFailed)?;
            }
        },
        (Destination::Folder(_), false) => {
            backend.rename(&subject.video, &video_target).await.or_raise(|| OrganizeErrorKind::MoveFailed)?;
        },
        (Destination::File(file), _) => {
            if !in_place {
                backend.rename(&subject.path, file).await.or_raise(|| OrganizeErrorKind::MoveFailed)?;
            }
        },
    }
    Ok(())
}

/// Downloads the poster unless a non-empty one is already stored. Returns
/// whether a poster was written.
async fn fetch_poster(
    backend: &BackendHandle,
    ctx: &Context,
    metadata: &Metadata,
    destination: &Destination,
) -> OrganizeResult<bool> {
    let (Some(url), Some(assets)) = (metadata.poster_url.as_deref(), ctx.assets.as_ref()) else {
        return Ok(false);
    };
    for extension in COVER_EXTENSIONS {
        match backend.stat(&destination.cover(extension)).await {
            Ok(entry) if entry.is_file() && entry.size > 0 => {
                debug!(path = %entry.path.display(), "poster already present");
                return Ok(false);
            },
            // An empty cover is what an interrupted download leaves behind.
            Ok(_) => {},
            Err(e) if matches!(&*e, StorageErrorKind::NotFound(_)) => {},
            Err(e) => return Err(e).or_raise(|| OrganizeErrorKind::Asset),
        }
    }
    let asset = assets.fetch(url).await.or_raise(|| OrganizeErrorKind::Asset)?;
    let path = destination.cover(asset.extension());
    backend.write(&path, &asset.bytes).await.or_raise(|| OrganizeErrorKind::Asset)?;
    debug!(path = %path.display(), "poster stored");
    Ok(true)
}
