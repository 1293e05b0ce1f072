use crate::Code;
use derive_more::Display;

/// Where a [`Metadata`] record came from.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Provenance {
    /// An external source returned usable details.
    #[display("resolved")]
    Resolved,
    /// Every source failed; details were derived from the code alone.
    #[display("fallback")]
    Fallback,
}

/// Descriptive details for one code, as consumed by the organizer.
///
/// Once validated, at least one of `studio` and `title` is non-empty;
/// `actresses` preserves discovery order and holds no duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    pub code: Code,
    /// Studio label as published (not yet normalized)
    pub studio: String,
    pub title: String,
    pub actresses: Vec<String>,
    pub poster_url: Option<String>,
    pub source: Provenance,
}
impl Metadata {
    /// Deterministic details for a code no source could resolve: the title
    /// is the code itself and there are no actresses or poster.
    pub fn fallback(code: Code, studio: impl Into<String>) -> Self {
        Self {
            title: code.to_string(),
            code,
            studio: studio.into(),
            actresses: Vec::new(),
            poster_url: None,
            source: Provenance::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == Provenance::Fallback
    }
}
