//! Item relocation.
//!
//! Moves each [`LibraryItem`](crate::scan::LibraryItem) from wherever it was
//! found to the location a [`PathBuilder`](crate::PathBuilder) template
//! derives from its resolved metadata, then stores the poster and the
//! `metadata.json` sidecar beside it.
//!
//! Per item the steps are: extract the code, resolve metadata, normalize the
//! studio, build the destination (suffixing `_1`, `_2`, ... on collision),
//! move, fetch the poster, write the sidecar. Failing to extract a code or to
//! move the item sends it to the quarantine directory; poster and sidecar
//! failures are warnings only. Nothing is ever rolled back.
//!
//! The primary entry point is [`organize`], which streams one
//! [`Outcome`] per item. Items are handled strictly one after the other:
//! collision suffixes are only deterministic that way.

pub mod error;
mod item;
mod quarantine;
mod sidecar;
mod stream;

pub use self::item::organize_item;
pub use self::quarantine::quarantine;
pub use self::sidecar::Sidecar;
pub use self::stream::{Intake, OrganizeEvent, organize, organize_all};
use derive_more::Display;
use kura_extract::Code;
use kura_extract::models::Provenance;
use std::path::PathBuf;
use time::UtcDateTime;

/// Where an item went (or would go, in a dry run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub from: PathBuf,
    /// The item's final path: its folder, or the file itself in the flat layout.
    pub to: PathBuf,
    pub code: Code,
    pub source: Provenance,
    /// A poster was downloaded during this run.
    pub poster: bool,
    /// The sidecar was written during this run.
    pub sidecar: bool,
}

/// The result of organizing a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Moved into place.
    Relocated(Relocation),
    /// Already where it belongs; only its companions were refreshed.
    AlreadyCorrect(Relocation),
    /// Dry run: where the item would have gone.
    Planned(Relocation),
    Quarantined(QuarantineRecord),
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuarantineReason {
    #[display("code_not_found")]
    CodeNotFound,
    #[display("move_failed")]
    MoveFailed,
    /// The metadata could not be rendered into a usable destination path.
    #[display("invalid_destination")]
    InvalidDestination,
}

/// An item that could not be organized.
///
/// Quarantined items are only looked at again by an explicit retry or
/// reorganize pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarantineRecord {
    pub original_path: PathBuf,
    /// Where the item now sits, if it could be moved into quarantine (or was
    /// already there).
    pub destination: Option<PathBuf>,
    pub reason: QuarantineReason,
    pub quarantined_at: UtcDateTime,
}

/// Aggregated outcomes of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Items relocated or confirmed in place.
    pub success: u64,
    /// Items actually moved.
    pub moved: u64,
    pub failed: u64,
    /// Successful items that had to use fallback metadata.
    pub fallback: u64,
    pub posters: u64,
    pub planned: u64,
    pub quarantined: Vec<QuarantineRecord>,
}
impl Summary {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Relocated(relocation) | Outcome::AlreadyCorrect(relocation) => {
                self.success += 1;
                if matches!(outcome, Outcome::Relocated(_)) {
                    self.moved += 1;
                }
                if relocation.source == Provenance::Fallback {
                    self.fallback += 1;
                }
                if relocation.poster {
                    self.posters += 1;
                }
            },
            Outcome::Planned(relocation) => {
                self.planned += 1;
                if relocation.source == Provenance::Fallback {
                    self.fallback += 1;
                }
            },
            Outcome::Quarantined(record) => {
                self.failed += 1;
                self.quarantined.push(record.clone());
            },
        }
    }

    /// Folds another summary into this one.
    pub fn merge(&mut self, other: Summary) {
        self.success += other.success;
        self.moved += other.moved;
        self.failed += other.failed;
        self.fallback += other.fallback;
        self.posters += other.posters;
        self.planned += other.planned;
        self.quarantined.extend(other.quarantined);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relocation(source: Provenance, poster: bool) -> Relocation {
        Relocation {
            from: PathBuf::from("SSIS-001.mp4"),
            to: PathBuf::from("s1/Unknown/[SSIS-001] Title"),
            code: "SSIS-001".parse().unwrap(),
            source,
            poster,
            sidecar: true,
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = Summary::default();
        summary.record(&Outcome::Relocated(relocation(Provenance::Resolved, true)));
        summary.record(&Outcome::Relocated(relocation(Provenance::Fallback, false)));
        summary.record(&Outcome::AlreadyCorrect(relocation(Provenance::Resolved, false)));
        summary.record(&Outcome::Quarantined(QuarantineRecord {
            original_path: PathBuf::from("randomfile.mp4"),
            destination: Some(PathBuf::from("others/randomfile.mp4")),
            reason: QuarantineReason::CodeNotFound,
            quarantined_at: UtcDateTime::now(),
        }));
        assert_eq!(summary.success, 3);
        assert_eq!(summary.moved, 2);
        assert_eq!(summary.fallback, 1);
        assert_eq!(summary.posters, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.quarantined[0].reason.to_string(), "code_not_found");
    }

    #[test]
    fn test_planned_items_are_not_successes() {
        let mut summary = Summary::default();
        summary.record(&Outcome::Planned(relocation(Provenance::Fallback, false)));
        assert_eq!(summary.planned, 1);
        assert_eq!(summary.success, 0);
        assert_eq!(summary.fallback, 1);
    }
}
