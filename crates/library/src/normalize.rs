//! Studio label normalization.
//!
//! Published studio labels arrive in kanji, katakana, romanized and stylized
//! forms. [`StudioNormalizer`] folds them all into one lowercase hyphenated
//! folder key so that a studio never ends up split across directories.

use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use tracing::instrument;

/// Folder key for items whose studio is unknown or unusable.
pub const OTHERS: &str = "others";

static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static HYPHENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").unwrap());

/// Lowercases, drops everything but word characters, whitespace and hyphens,
/// turns whitespace runs into single hyphens and trims stray hyphens.
///
/// Word characters are Unicode-aware, so kanji and kana survive.
///
/// ```
/// use kura_library::slug;
/// assert_eq!(slug("S1 NO.1 STYLE"), "s1-no1-style");
/// assert_eq!(slug("  Wanz -- Factory "), "wanz-factory");
/// assert_eq!(slug("ダスッ！"), "ダスッ");
/// ```
pub fn slug(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let kept = DISALLOWED.replace_all(&lowered, "");
    let hyphenated = WHITESPACE.replace_all(kept.trim(), "-");
    HYPHENS.replace_all(&hyphenated, "-").trim_matches('-').to_string()
}

/// Maps free-text studio labels to stable folder keys.
///
/// Matching happens on [slugged](slug) forms of both the input and the
/// alias keys:
///
/// 1. an input that already is a canonical key is returned unchanged,
/// 2. an exact alias match returns its key,
/// 3. otherwise the longest alias contained in the input (or containing it)
///    wins, ties broken alphabetically,
/// 4. otherwise the slug itself is the key.
///
/// Canonical keys are themselves aliases of themselves, and `others` is
/// always canonical, which makes normalization idempotent.
#[derive(Debug, Clone)]
pub struct StudioNormalizer {
    /// Slugged alias to canonical key, ordered longest alias first.
    aliases: Vec<(String, String)>,
    canonical: HashSet<String>,
}
impl Default for StudioNormalizer {
    fn default() -> Self {
        Self::new(&BTreeMap::new())
    }
}
impl StudioNormalizer {
    pub fn new(table: &BTreeMap<String, String>) -> Self {
        let mut canonical: HashSet<String> =
            table.values().map(|key| slug(key)).filter(|key| !key.is_empty()).collect();
        canonical.insert(OTHERS.to_string());

        let mut aliases: BTreeMap<String, String> = BTreeMap::new();
        for key in &canonical {
            aliases.insert(key.clone(), key.clone());
        }
        for (alias, key) in table {
            let (alias, key) = (slug(alias), slug(key));
            if !alias.is_empty() && !key.is_empty() {
                aliases.insert(alias, key);
            }
        }
        let mut aliases: Vec<_> = aliases.into_iter().collect();
        // Stable sort keeps the alphabetical order among equal lengths.
        aliases.sort_by_key(|(alias, _)| std::cmp::Reverse(alias.chars().count()));
        Self { aliases, canonical }
    }

    #[instrument(level = "trace", skip(self), ret)]
    pub fn normalize(&self, raw: &str) -> String {
        let slugged = slug(raw);
        if slugged.is_empty() {
            return OTHERS.to_string();
        }
        if self.canonical.contains(&slugged) {
            return slugged;
        }
        if let Some((_, key)) = self.aliases.iter().find(|(alias, _)| *alias == slugged) {
            return key.clone();
        }
        let contained = self.aliases.iter().find(|(alias, _)| {
            let shorter = alias.chars().count().min(slugged.chars().count());
            shorter >= 2 && (slugged.contains(alias.as_str()) || alias.contains(slugged.as_str()))
        });
        match contained {
            Some((_, key)) => key.clone(),
            None => slugged,
        }
    }
}
