//! Poster downloads.
//!
//! The organizer only knows the [`AssetFetcher`] seam; the HTTP implementation
//! lives in `kura-fetch`. A failed download is never fatal for an item.

pub mod error;

use self::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Downloaded bytes plus whatever the server claimed they were.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}
impl Asset {
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self { bytes, content_type }
    }

    /// File extension for the stored image: `png`, `webp` and `gif` are kept,
    /// anything else (including no content type) is stored as `jpg`.
    pub fn extension(&self) -> &'static str {
        let essence = self
            .content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();
        match essence.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "jpg",
        }
    }
}

#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Asset>;
}

pub type AssetHandle = Arc<dyn AssetFetcher + Send + Sync>;
