use crate::Throttle;
use async_trait::async_trait;
use exn::ResultExt;
use kura_library::asset::error::{ErrorKind as AssetErrorKind, Result as AssetResult};
use kura_library::asset::{Asset, AssetFetcher};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

/// Downloads posters with the same client, headers and pacing as the
/// metadata source.
#[derive(Debug)]
pub struct HttpAssetFetcher {
    client: Client,
    throttle: Arc<Throttle>,
}
impl HttpAssetFetcher {
    pub(crate) fn new(client: Client, throttle: Arc<Throttle>) -> Self {
        Self { client, throttle }
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> AssetResult<Asset> {
        let parsed = Url::parse(url).or_raise(|| AssetErrorKind::InvalidUrl(url.to_string()))?;
        self.throttle.wait().await;
        let response = self.client.get(parsed).send().await.or_raise(|| AssetErrorKind::Unavailable(url.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(AssetErrorKind::Unavailable(status.to_string()));
        }
        let content_type =
            response.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok()).map(str::to_string);
        let bytes = response.bytes().await.or_raise(|| AssetErrorKind::Unavailable(url.to_string()))?;
        if bytes.is_empty() {
            exn::bail!(AssetErrorKind::Empty);
        }
        debug!(size = bytes.len(), content_type = content_type.as_deref(), "poster downloaded");
        Ok(Asset::new(bytes.to_vec(), content_type))
    }
}
