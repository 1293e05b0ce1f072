//! `kura`: organize a media library into `studio/actress/[CODE] Title`.
//!
//! Without a mode flag the top of the library is processed: loose videos and
//! download folders are moved into place. `--retry-failed` reprocesses the
//! quarantine directory, `--reorganize` audits the whole tree and
//! `--clean-only` only prunes empty directories.
//!
//! Exits with `1` on a fatal error and `2` when any item was quarantined.

mod error;

use crate::error::{ErrorKind, Result};
use clap::{ArgAction, Parser, ValueHint};
use exn::ResultExt;
use kura_config::{Config, Layout};
use kura_library::Context;
use kura_library::asset::AssetHandle;
use kura_library::audit::{AuditReport, repair};
use kura_library::organize::{Intake, Summary, organize_all};
use kura_library::resolve::SourceHandle;
use kura_library::scan::{Classification, LibraryItem};
use kura_storage::BackendHandle;
use kura_storage::backend::LocalBackend;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "kura", version, about = "Organize a media library into a canonical studio/actress layout")]
struct Args {
    /// Library root directory
    #[arg(value_hint = ValueHint::DirPath)]
    root: PathBuf,

    /// Report what would happen without moving or deleting anything
    #[arg(long)]
    dry_run: bool,

    /// Stop after the first item
    #[arg(long)]
    first_only: bool,

    /// Process a single file or folder (absolute, or relative to the root)
    #[arg(long, value_name = "PATH", value_hint = ValueHint::AnyPath)]
    #[arg(conflicts_with_all = ["retry_failed", "reorganize", "clean_only"])]
    file: Option<PathBuf>,

    /// Reprocess everything in the quarantine directory
    #[arg(long, conflicts_with_all = ["reorganize", "clean_only"])]
    retry_failed: bool,

    /// Audit the whole library, moving every misplaced video and pruning empty directories
    #[arg(long, conflicts_with = "clean_only")]
    reorganize: bool,

    /// Only prune empty directories
    #[arg(long)]
    clean_only: bool,

    /// HTTP(S) proxy for metadata and poster requests
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// Destination layout, overriding the configuration file
    #[arg(long, value_name = "folder|flat")]
    layout: Option<Layout>,

    /// Configuration file (toml, yaml or json)
    #[arg(long, value_name = "FILE", env = "KURA_CONFIG", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// More output; repeat for even more
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only warnings and errors
    #[arg(short, long)]
    quiet: bool,
}
impl Args {
    fn level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }

    fn mode(&self, root: &Path) -> Result<Mode> {
        Ok(if self.clean_only {
            Mode::Repair { clean_only: true }
        } else if self.reorganize {
            Mode::Repair { clean_only: false }
        } else if self.retry_failed {
            Mode::Organize(Intake::Quarantine)
        } else if let Some(file) = &self.file {
            Mode::Organize(Intake::Items(vec![item_for(root, file)?]))
        } else {
            Mode::Organize(Intake::Root)
        })
    }

    /// Command-line flags take precedence over every configuration source.
    fn apply(&self, config: &mut Config) {
        if let Some(proxy) = &self.proxy {
            config.source.proxy = Some(proxy.clone());
        }
        if let Some(layout) = self.layout {
            config.layout = layout;
        }
    }
}

#[derive(Debug)]
enum Mode {
    Organize(Intake),
    Repair { clean_only: bool },
}

fn main() -> ExitCode {
    let args = Args::parse();
    // RUST_LOG wins over the verbosity flags.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,kura={}", args.level())));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "async runtime could not be started");
            return ExitCode::FAILURE;
        },
    };
    match runtime.block_on(run(&args)) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(2),
        Err(e) => {
            error!(error = ?e, "run aborted");
            ExitCode::FAILURE
        },
    }
}

/// Returns whether any item ended up quarantined.
async fn run(args: &Args) -> Result<bool> {
    let mut config = Config::load(args.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    args.apply(&mut config);

    // Non-async: happens once at startup.
    let root = std::fs::canonicalize(&args.root).or_raise(|| ErrorKind::Root(args.root.clone()))?;
    let backend: BackendHandle =
        Arc::new(LocalBackend::new("library", &root).or_raise(|| ErrorKind::Root(root.clone()))?);

    let (sources, assets) = if config.source.enabled {
        let (source, assets) = kura_fetch::connect(&config.source).or_raise(|| ErrorKind::Fetch)?;
        (vec![Arc::new(source) as SourceHandle], Some(Arc::new(assets) as AssetHandle))
    } else {
        warn!("metadata source disabled, every item will use fallback metadata");
        (Vec::new(), None)
    };
    let ctx = Context::new(&config, sources, assets)
        .or_raise(|| ErrorKind::Library)?
        .with_dry_run(args.dry_run)
        .with_limit(args.first_only.then_some(1));
    let mode = args.mode(&root)?;
    info!(root = %root.display(), layout = %ctx.layout(), dry_run = args.dry_run, ?mode, "starting");

    let summary = match mode {
        Mode::Organize(intake) => organize_all(&backend, &ctx, intake).await.or_raise(|| ErrorKind::Library)?,
        Mode::Repair { clean_only } => {
            let report = repair(&backend, &ctx, clean_only).await.or_raise(|| ErrorKind::Library)?;
            report_audit(&report);
            report.summary
        },
    };
    report_summary(&summary, args.dry_run);
    Ok(!summary.quarantined.is_empty())
}

/// Resolves `--file` to a root-relative item.
fn item_for(root: &Path, file: &Path) -> Result<LibraryItem> {
    let joined = if file.is_absolute() { file.to_path_buf() } else { root.join(file) };
    let absolute = std::fs::canonicalize(&joined).or_raise(|| ErrorKind::Item(file.to_path_buf()))?;
    let relative = absolute.strip_prefix(root).or_raise(|| ErrorKind::Item(file.to_path_buf()))?;
    if relative.as_os_str().is_empty() {
        exn::bail!(ErrorKind::Item(file.to_path_buf()));
    }
    Ok(if absolute.is_dir() {
        LibraryItem::folder(relative, Classification::NonStandard)
    } else {
        LibraryItem::file(relative)
    })
}

fn report_audit(report: &AuditReport) {
    for dir in &report.inaccessible {
        warn!(path = %dir.display(), "directory could not be read");
    }
    info!(
        standard = report.standard,
        pruned = report.pruned.len(),
        inaccessible = report.inaccessible.len(),
        "audit complete"
    );
}

fn report_summary(summary: &Summary, dry_run: bool) {
    for record in &summary.quarantined {
        warn!(
            path = %record.original_path.display(),
            destination = ?record.destination,
            reason = %record.reason,
            "quarantined"
        );
    }
    if dry_run {
        info!(planned = summary.planned, failed = summary.failed, fallback = summary.fallback, "dry run complete");
    } else {
        info!(
            success = summary.success,
            moved = summary.moved,
            failed = summary.failed,
            fallback = summary.fallback,
            posters = summary.posters,
            "run complete"
        );
    }
}
