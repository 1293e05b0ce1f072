use crate::Throttle;
use async_trait::async_trait;
use exn::ResultExt;
use kura_extract::error::ErrorKind as ExtractErrorKind;
use kura_extract::models::Candidate;
use kura_extract::{Code, Document, Heuristics};
use kura_library::resolve::MetadataSource;
use kura_library::resolve::error::{ErrorKind as SourceErrorKind, Result as SourceResult};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

/// Looks codes up on a detail-page site at `<base>/<CODE>`.
#[derive(Debug)]
pub struct HttpSource {
    client: Client,
    base: Url,
    heuristics: Heuristics,
    throttle: Arc<Throttle>,
}
impl HttpSource {
    pub(crate) fn new(client: Client, base: Url, throttle: Arc<Throttle>) -> Self {
        Self { client, base, heuristics: Heuristics::default(), throttle }
    }

    pub fn with_heuristics(mut self, heuristics: Heuristics) -> Self {
        self.heuristics = heuristics;
        self
    }

    pub fn detail_url(&self, code: &Code) -> SourceResult<Url> {
        self.base.join(code.as_str()).or_raise(|| SourceErrorKind::Unavailable(code.to_string()))
    }
}

#[async_trait]
impl MetadataSource for HttpSource {
    fn name(&self) -> &str {
        self.base.host_str().unwrap_or("http")
    }

    #[instrument(skip(self), fields(%code))]
    async fn fetch(&self, code: &Code) -> SourceResult<Candidate> {
        let url = self.detail_url(code)?;
        self.throttle.wait().await;
        debug!(%url, "requesting detail page");
        let response =
            self.client.get(url.clone()).send().await.or_raise(|| SourceErrorKind::Unavailable(url.to_string()))?;
        match response.status() {
            StatusCode::NOT_FOUND => exn::bail!(SourceErrorKind::NotFound),
            status if !status.is_success() => exn::bail!(SourceErrorKind::Unavailable(status.to_string())),
            _ => {},
        }
        let body = response.text().await.or_raise(|| SourceErrorKind::Unavailable(url.to_string()))?;
        // The parsed document is not `Send`; keep it out of any await.
        extract(body, code, &self.heuristics, &url)
    }
}

fn extract(body: String, code: &Code, heuristics: &Heuristics, page: &Url) -> SourceResult<Candidate> {
    let candidate = match Document::parse(body).candidate(code, heuristics, page) {
        Ok(candidate) => candidate,
        Err(e) => {
            let kind = match &*e {
                ExtractErrorKind::AgeGate => SourceErrorKind::Blocked,
                _ => SourceErrorKind::Rejected,
            };
            return Err(e).or_raise(|| kind);
        },
    };
    if !candidate.is_acceptable() {
        exn::bail!(SourceErrorKind::Rejected);
    }
    Ok(candidate)
}
