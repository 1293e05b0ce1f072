//! Canonical item codes and their extraction from filenames.

use crate::consts;
use crate::error::{Error, ErrorKind};
use derive_more::Display;
use regex::Regex;
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

/// A canonical identifier such as `SSIS-001`: 2–10 uppercase ASCII letters,
/// a hyphen, then 3–5 digits.
///
/// Immutable once constructed; the only ways in are [`FromStr`] (which
/// rejects anything non-canonical) and [`extract`].
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Code(String);
impl Code {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The letter run before the hyphen, used for studio fallback lookups.
    pub fn prefix(&self) -> &str {
        self.0.split_once('-').map(|(prefix, _)| prefix).unwrap_or(&self.0)
    }
}
impl FromStr for Code {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::try_from(s.to_string())?)
    }
}
impl TryFrom<String> for Code {
    type Error = ErrorKind;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match consts::CODE_CANONICAL_REGEX.is_match(&value) {
            true => Ok(Self(value)),
            false => Err(ErrorKind::InvalidCode(value)),
        }
    }
}
impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.0
    }
}
impl AsRef<str> for Code {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The code shapes recognized in filenames, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Letters, then a hyphen or whitespace, then digits: `SSIS-001`, `IPX 123`.
    Separated,
    /// Letters immediately followed by digits: `SSIS001`.
    Joined,
}
impl Matcher {
    /// Every matcher, highest priority first.
    pub const ALL: [Matcher; 2] = [Matcher::Separated, Matcher::Joined];

    fn regex(self) -> &'static Regex {
        match self {
            Self::Separated => &consts::CODE_SEPARATED_REGEX,
            Self::Joined => &consts::CODE_JOINED_REGEX,
        }
    }

    /// Leftmost occurrence of this shape in an already-cleaned string.
    pub fn find(self, cleaned: &str) -> Option<Code> {
        let captures = self.regex().captures(cleaned)?;
        let letters = captures.get(1)?.as_str();
        let digits = captures.get(2)?.as_str();
        Some(Code(format!("{letters}-{digits}")))
    }
}

/// Uppercases a filename and strips its extension and bracket decoration.
fn clean(name: &str) -> String {
    let stem = Path::new(name).file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    stem.chars().filter(|c| !matches!(c, '[' | ']')).collect::<String>().to_ascii_uppercase()
}

/// Derives the canonical code from a filename (or directory name).
///
/// The first [`Matcher`] (by priority) that matches wins, and within a
/// matcher the leftmost occurrence wins. Filenames containing more than one
/// plausible code only ever yield the first.
///
/// ```
/// use kura_extract::extract_code;
/// assert_eq!(extract_code("SSIS-001.mp4").unwrap().as_str(), "SSIS-001");
/// assert_eq!(extract_code("ssis001_1080p.mkv").unwrap().as_str(), "SSIS-001");
/// assert!(extract_code("randomfile.mp4").is_none());
/// ```
#[instrument(level = "trace")]
pub fn extract(name: &str) -> Option<Code> {
    let cleaned = clean(name);
    Matcher::ALL.iter().find_map(|matcher| matcher.find(&cleaned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("SSIS-001.mp4", Some("SSIS-001"))]
    #[case("ssis001_1080p.mkv", Some("SSIS-001"))]
    #[case("randomfile.mp4", None)]
    #[case("[IPX-123] Some Title.mkv", Some("IPX-123"))]
    #[case("ipx 123.avi", Some("IPX-123"))]
    #[case("[MIDV-456]", Some("MIDV-456"))]
    #[case("hhd800.com@SSIS-001.mp4", Some("SSIS-001"))]
    #[case("AB-12.mp4", None)]
    #[case("1080p.mp4", None)]
    fn test_extract(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(extract(name).as_ref().map(Code::as_str), expected);
    }

    #[test]
    fn test_separated_beats_joined_even_when_later() {
        // Joined would match "ABC123" first by position, but priority wins.
        assert_eq!(extract("ABC123 then IPX-456.mp4").unwrap().as_str(), "IPX-456");
    }

    #[test]
    fn test_leftmost_within_matcher() {
        assert_eq!(extract("SSIS-001 and SSIS-002.mp4").unwrap().as_str(), "SSIS-001");
    }

    #[rstest]
    #[case("SSIS-001", true)]
    #[case("ZZZTEST-999", true)]
    #[case("ssis-001", false)]
    #[case("SSIS001", false)]
    #[case("S-001", false)]
    #[case("SSIS-001 ", false)]
    fn test_from_str(#[case] input: &str, #[case] valid: bool) {
        assert_eq!(input.parse::<Code>().is_ok(), valid);
    }

    #[test]
    fn test_prefix() {
        let code: Code = "MIDV-456".parse().unwrap();
        assert_eq!(code.prefix(), "MIDV");
        assert_eq!(code.to_string(), "MIDV-456");
    }
}
