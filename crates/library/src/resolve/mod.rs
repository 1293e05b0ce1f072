//! Metadata resolution with source fallback.
//!
//! [`MetadataResolver::resolve`] asks each configured [`MetadataSource`] in
//! turn and accepts the first [`Candidate`] carrying a studio or a title.
//! When every source fails the code's letter prefix is looked up in the
//! studio prefix table instead, so resolution always produces something.

pub mod error;

use self::error::Result as SourceResult;
use async_trait::async_trait;
use kura_config::StudioTables;
use kura_extract::Code;
use kura_extract::models::{Candidate, Metadata};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Studio recorded when neither a source nor the prefix table knows the code.
pub const UNKNOWN_STUDIO: &str = "Unknown";

/// Anything that can look up details for a code.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Used for logging only.
    fn name(&self) -> &str;

    /// Fetches and extracts details for `code`.
    ///
    /// Implementations may return an empty [`Candidate`]; the resolver
    /// discards it the same way as an error.
    async fn fetch(&self, code: &Code) -> SourceResult<Candidate>;
}

pub type SourceHandle = Arc<dyn MetadataSource + Send + Sync>;

/// Resolves codes to [`Metadata`], memoizing results for the lifetime of the
/// resolver (one run).
pub struct MetadataResolver {
    sources: Vec<SourceHandle>,
    tables: StudioTables,
    cache: RwLock<HashMap<Code, Metadata>>,
}
impl MetadataResolver {
    pub fn new(sources: Vec<SourceHandle>, tables: StudioTables) -> Self {
        Self { sources, tables, cache: RwLock::new(HashMap::new()) }
    }

    /// Never fails: the worst case is [fallback](Metadata::fallback) metadata.
    #[instrument(skip(self), fields(%code))]
    pub async fn resolve(&self, code: &Code) -> Metadata {
        if let Some(cached) = self.cache.read().await.get(code) {
            debug!("metadata cache hit");
            return cached.clone();
        }
        let metadata = self.resolve_uncached(code).await;
        self.cache.write().await.insert(code.clone(), metadata.clone());
        metadata
    }

    async fn resolve_uncached(&self, code: &Code) -> Metadata {
        for source in &self.sources {
            match source.fetch(code).await {
                Ok(candidate) if candidate.is_acceptable() => {
                    debug!(source = source.name(), "metadata resolved");
                    return candidate.into_metadata(code.clone());
                },
                Ok(_) => warn!(source = source.name(), "source returned no studio or title"),
                Err(e) => warn!(source = source.name(), error = ?e, "source failed"),
            }
        }
        self.fallback(code)
    }

    /// Metadata derived from the code alone.
    pub fn fallback(&self, code: &Code) -> Metadata {
        let studio = self.tables.studio_for_prefix(code.prefix()).unwrap_or(UNKNOWN_STUDIO);
        info!(%code, studio, "using fallback metadata");
        Metadata::fallback(code.clone(), studio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::error::ErrorKind;
    use kura_extract::models::Provenance;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed answer and counts how often it was asked.
    struct Fixed {
        answer: std::result::Result<Candidate, ErrorKind>,
        calls: AtomicUsize,
    }
    impl Fixed {
        fn handle(answer: std::result::Result<Candidate, ErrorKind>) -> Arc<Self> {
            Arc::new(Self { answer, calls: AtomicUsize::new(0) })
        }
    }
    #[async_trait]
    impl MetadataSource for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch(&self, _code: &Code) -> SourceResult<Candidate> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.answer {
                Ok(candidate) => Ok(candidate.clone()),
                Err(kind) => exn::bail!(kind.clone()),
            }
        }
    }

    fn code(s: &str) -> Code {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_unreachable_source_falls_back_to_unknown() {
        let source = Fixed::handle(Err(ErrorKind::Unavailable("connection refused".into())));
        let resolver = MetadataResolver::new(vec![source], StudioTables::builtin());
        let metadata = resolver.resolve(&code("ZZZTEST-999")).await;
        assert_eq!(metadata.studio, "Unknown");
        assert_eq!(metadata.title, "ZZZTEST-999");
        assert!(metadata.actresses.is_empty());
        assert_eq!(metadata.source, Provenance::Fallback);
    }

    #[tokio::test]
    async fn test_fallback_uses_prefix_table() {
        let resolver = MetadataResolver::new(vec![], StudioTables::builtin());
        let metadata = resolver.resolve(&code("IPX-123")).await;
        assert_eq!(metadata.studio, "IdeaPocket");
        assert!(metadata.is_fallback());
    }

    #[tokio::test]
    async fn test_first_acceptable_source_wins() {
        let empty = Fixed::handle(Ok(Candidate::default()));
        let blocked = Fixed::handle(Err(ErrorKind::Blocked));
        let good = Fixed::handle(Ok(Candidate {
            studio: "エスワン ナンバーワンスタイル".into(),
            title: "Title".into(),
            actresses: vec!["Yua".into(), "Yua".into()],
            poster_url: Some("https://example.com/c.jpg".into()),
        }));
        let never = Fixed::handle(Ok(Candidate { title: "Other".into(), ..Default::default() }));
        let sources: Vec<SourceHandle> = vec![empty.clone(), blocked.clone(), good.clone(), never.clone()];
        let resolver = MetadataResolver::new(sources, StudioTables::builtin());
        let metadata = resolver.resolve(&code("SSIS-001")).await;
        assert_eq!(metadata.title, "Title");
        assert_eq!(metadata.actresses, vec!["Yua"]);
        assert_eq!(metadata.source, Provenance::Resolved);
        assert_eq!(never.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_results_are_memoized_per_code() {
        let source = Fixed::handle(Ok(Candidate { studio: "S1".into(), ..Default::default() }));
        let resolver = MetadataResolver::new(vec![source.clone()], StudioTables::empty());
        resolver.resolve(&code("SSIS-001")).await;
        resolver.resolve(&code("SSIS-001")).await;
        resolver.resolve(&code("SSIS-002")).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
