use super::{Metadata, Provenance, dedupe_names, squash};
use crate::Code;

/// Raw, unvalidated details a metadata source produced for a code.
///
/// A candidate only becomes [`Metadata`] once it [is
/// acceptable](Self::is_acceptable); an empty candidate is discarded and the
/// next source (or the fallback table) gets a turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub studio: String,
    pub title: String,
    /// Ordered as discovered; may still contain duplicates.
    pub actresses: Vec<String>,
    pub poster_url: Option<String>,
}
impl Candidate {
    /// At least one of studio or title carries something other than whitespace.
    pub fn is_acceptable(&self) -> bool {
        !self.studio.trim().is_empty() || !self.title.trim().is_empty()
    }

    /// Promotes the candidate to [`Metadata`] tagged as
    /// [`Provenance::Resolved`], tidying whitespace and de-duplicating
    /// actresses along the way.
    ///
    /// Callers are expected to have checked [`is_acceptable`](Self::is_acceptable).
    pub fn into_metadata(self, code: Code) -> Metadata {
        Metadata {
            code,
            studio: squash(self.studio),
            title: squash(self.title),
            actresses: dedupe_names(self.actresses),
            poster_url: self.poster_url.map(|url| url.trim().to_string()).filter(|url| !url.is_empty()),
            source: Provenance::Resolved,
        }
    }
}
