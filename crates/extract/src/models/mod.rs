mod candidate;
mod metadata;

pub use self::candidate::Candidate;
pub use self::metadata::{Metadata, Provenance};

/// Collapses internal whitespace runs and trims the ends.
fn squash(s: impl AsRef<str>) -> String {
    s.as_ref().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes duplicates (after whitespace squashing) keeping the first-seen
/// order, and drops names that are blank.
pub(crate) fn dedupe_names(names: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .into_iter()
        .map(squash)
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_names_keeps_first_seen_order() {
        let names = dedupe_names(["  Yua  Mikami ", "Rei", "Yua Mikami", "", "Rei", "Mei"]);
        assert_eq!(names, vec!["Yua Mikami", "Rei", "Mei"]);
    }
}
