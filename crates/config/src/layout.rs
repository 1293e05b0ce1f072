use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// On-disk arrangement of organized items.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// `studio/actress/[CODE] Title/CODE title.ext` plus cover and sidecar.
    #[default]
    #[display("folder")]
    Folder,
    /// Legacy `studio/[CODE]-[Title].ext` with sibling sidecars.
    #[display("flat")]
    Flat,
}
impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "folder" => Ok(Self::Folder),
            "flat" => Ok(Self::Flat),
            other => Err(format!("unknown layout '{other}', expected 'folder' or 'flat'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("folder", Layout::Folder)]
    #[case("FLAT", Layout::Flat)]
    #[case(" Flat ", Layout::Flat)]
    fn test_from_str(#[case] input: &str, #[case] expected: Layout) {
        assert_eq!(input.parse::<Layout>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_layout() {
        assert!("nested".parse::<Layout>().is_err());
    }
}
