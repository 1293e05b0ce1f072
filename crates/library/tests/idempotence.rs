//! A full organize + repair cycle, run twice over the same library.

use async_trait::async_trait;
use kura_config::Config;
use kura_extract::Code;
use kura_extract::models::Candidate;
use kura_library::Context;
use kura_library::audit::repair;
use kura_library::organize::{Intake, organize_all};
use kura_library::resolve::error::{ErrorKind as SourceErrorKind, Result as SourceResult};
use kura_library::resolve::{MetadataSource, SourceHandle};
use kura_storage::BackendHandle;
use kura_storage::backend::LocalBackend;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Knows exactly one code; everything else is "offline".
struct OneTitle;
#[async_trait]
impl MetadataSource for OneTitle {
    fn name(&self) -> &str {
        "one-title"
    }

    async fn fetch(&self, code: &Code) -> SourceResult<Candidate> {
        match code.as_str() {
            "SSIS-001" => Ok(Candidate {
                studio: "エスワン ナンバーワンスタイル".into(),
                title: "Title: Part/One".into(),
                actresses: vec!["Yua Mikami".into()],
                poster_url: None,
            }),
            _ => exn::bail!(SourceErrorKind::Unavailable("offline".into())),
        }
    }
}

fn create(root: &Path, paths: &[&str]) {
    for path in paths {
        let absolute = root.join(path);
        if path.ends_with('/') {
            std::fs::create_dir_all(&absolute).unwrap();
        } else {
            std::fs::create_dir_all(absolute.parent().unwrap()).unwrap();
            std::fs::write(&absolute, path.as_bytes()).unwrap();
        }
    }
}

/// Every file and directory under `root`, relative and sorted.
fn snapshot(root: &Path) -> Vec<PathBuf> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            out.push(path.strip_prefix(root).unwrap().to_path_buf());
            if path.is_dir() {
                walk(root, &path, out);
            }
        }
    }
    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}

#[tokio::test]
async fn test_second_run_moves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    create(root, &[
        "SSIS-001.mp4",
        "randomfile.mp4",
        "IPX-123 uncut/ipx123.mkv",
        "IPX-123 uncut/sample.txt",
        "Batch Download/ABP-001.mp4",
        "Batch Download/ABP-002.mp4",
        "s1/Rei/stray/SSIS-002.mkv",
        "s1/Yua Mikami/leftovers/",
    ]);
    let backend: BackendHandle = Arc::new(LocalBackend::new("library", root).unwrap());
    let sources: Vec<SourceHandle> = vec![Arc::new(OneTitle)];
    let ctx = Context::new(&Config::default(), sources, None).unwrap();

    let first = organize_all(&backend, &ctx, Intake::Root).await.unwrap();
    assert_eq!(first.moved, 4);
    assert_eq!(first.failed, 1);
    assert_eq!(first.fallback, 3);
    let first_repair = repair(&backend, &ctx, false).await.unwrap();
    assert_eq!(first_repair.summary.moved, 1);
    assert!(first_repair.pruned.contains(&PathBuf::from("Batch Download")));
    assert!(first_repair.pruned.contains(&PathBuf::from("s1/Yua Mikami/leftovers")));
    assert!(first_repair.pruned.contains(&PathBuf::from("s1/Rei")));

    assert!(root.join("s1/Yua Mikami/[SSIS-001] Title PartOne/[SSIS-001] Title PartOne.mp4").is_file());
    assert!(root.join("s1/Yua Mikami/[SSIS-001] Title PartOne/metadata.json").is_file());
    assert!(root.join("s1/Unknown/[SSIS-002] SSIS-002/[SSIS-002] SSIS-002.mkv").is_file());
    assert!(root.join("ideapocket/Unknown/[IPX-123] IPX-123/sample.txt").is_file());
    assert!(root.join("others/randomfile.mp4").is_file());

    let before = snapshot(root);
    let second = organize_all(&backend, &ctx, Intake::Root).await.unwrap();
    let second_repair = repair(&backend, &ctx, false).await.unwrap();
    assert_eq!(second.moved, 0);
    assert_eq!(second_repair.summary.moved, 0);
    assert!(second_repair.pruned.is_empty());
    assert_eq!(snapshot(root), before);
}
