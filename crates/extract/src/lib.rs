//! Identification and description of library items.
//!
//! - [`extract_code`] derives a canonical [`Code`] from a filename.
//! - [`Document`] applies ordered [`Heuristics`] to a detail page, producing
//!   a [`Candidate`](models::Candidate) that the resolver may promote to
//!   [`Metadata`](models::Metadata).

mod code;
mod consts;
mod document;
pub mod error;
pub mod models;

pub use crate::code::{Code, Matcher, extract as extract_code};
pub use crate::document::{Document, Heuristics, Probe};
