use crate::Destination;
use crate::organize::error::{ErrorKind as OrganizeErrorKind, Result as OrganizeResult};
use exn::ResultExt;
use kura_extract::Code;
use kura_extract::models::Metadata;
use kura_storage::BackendHandle;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Contents of `metadata.json`.
///
/// Field names are part of the on-disk format. The studio is stored as
/// published, not as the normalized folder key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sidecar {
    pub code: Code,
    pub studio: String,
    pub title: String,
    pub actresses: Vec<String>,
    pub poster_url: Option<String>,
}
impl From<&Metadata> for Sidecar {
    fn from(metadata: &Metadata) -> Self {
        Self {
            code: metadata.code.clone(),
            studio: metadata.studio.clone(),
            title: metadata.title.clone(),
            actresses: metadata.actresses.clone(),
            poster_url: metadata.poster_url.clone(),
        }
    }
}
impl Sidecar {
    /// UTF-8 JSON with two-space indentation.
    pub fn to_json(&self) -> OrganizeResult<Vec<u8>> {
        serde_json::to_vec_pretty(self).or_raise(|| OrganizeErrorKind::Sidecar)
    }
}

/// Writes the sidecar beside the item, replacing any previous one.
pub(crate) async fn write_sidecar(
    backend: &BackendHandle,
    metadata: &Metadata,
    destination: &Destination,
) -> OrganizeResult<PathBuf> {
    let path = destination.sidecar();
    let json = Sidecar::from(metadata).to_json()?;
    backend.write(&path, &json).await.or_raise(|| OrganizeErrorKind::Sidecar)?;
    Ok(path)
}
