//! Versioned studio lookup tables.
//!
//! Two tables drive studio naming. `aliases` maps the many spellings a studio
//! is published under (kanji, katakana, romanized, stylized) to a single
//! folder key. `prefixes` maps a code's letter prefix to a studio name and is
//! only consulted when no metadata source could resolve a code.
//!
//! User tables are merged over the built-in ones key by key, so a config file
//! only needs to list additions and corrections.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bumped whenever the built-in tables change meaningfully.
pub const BUILTIN_TABLES_VERSION: u32 = 2;

const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("エスワン ナンバーワンスタイル", "s1"),
    ("エスワン", "s1"),
    ("S1 NO.1 STYLE", "s1"),
    ("S1 NO. 1 STYLE", "s1"),
    ("S1", "s1"),
    ("アイデアポケット", "ideapocket"),
    ("IDEA POCKET", "ideapocket"),
    ("IDEAPOCKET", "ideapocket"),
    ("ムーディーズ", "moodyz"),
    ("MOODY'S", "moodyz"),
    ("MOODYZ", "moodyz"),
    ("プレステージ", "prestige"),
    ("PRESTIGE", "prestige"),
    ("FALENO", "faleno"),
    ("FALENO STAR", "faleno-star"),
    ("E-BODY", "e-body"),
    ("EBODY", "e-body"),
    ("マドンナ", "madonna"),
    ("MADONNA", "madonna"),
    ("アタッカーズ", "attackers"),
    ("ATTACKERS", "attackers"),
    ("ダスッ！", "das"),
    ("DAS!", "das"),
    ("プレミアム", "premium"),
    ("PREMIUM", "premium"),
    ("SODクリエイト", "sod-create"),
    ("SOD CREATE", "sod-create"),
    ("本中", "hon-naka"),
    ("ワンズファクトリー", "wanz-factory"),
    ("WANZ", "wanz-factory"),
    ("JETビデオ", "jet-eizou"),
    ("JET映像", "jet-eizou"),
    ("溜池ゴロー", "tameike-goro"),
    ("グローリークエスト", "glory-quest"),
    ("GLORY QUEST", "glory-quest"),
    ("KM PRODUCE", "km-produce"),
    ("KMPRODUCE", "km-produce"),
    ("ケイ・エム・プロデュース", "km-produce"),
    ("KAWAII", "kawaii"),
    ("KAWAII*", "kawaii"),
    ("ROYAL", "royal"),
    ("DAHLIA", "dahlia"),
];

const BUILTIN_PREFIXES: &[(&str, &str)] = &[
    ("SSIS", "S1"),
    ("SSNI", "S1"),
    ("SONE", "S1"),
    ("IPX", "IdeaPocket"),
    ("IPZZ", "IdeaPocket"),
    ("MIDV", "MOODYZ"),
    ("MIAB", "MOODYZ"),
    ("MIDA", "MOODYZ"),
    ("MFYD", "MOODYZ"),
    ("PRED", "Premium"),
    ("JUR", "Madonna"),
    ("JUQ", "Madonna"),
    ("URE", "Madonna"),
    ("EBWH", "E-Body"),
    ("HMN", "Hon Naka"),
    ("ADN", "Attackers"),
    ("ATID", "Attackers"),
    ("MEYD", "Tameike Goro"),
    ("ROYD", "Royal"),
    ("DASS", "DAS!"),
    ("DLDSS", "DAHLIA"),
    ("START", "SOD Create"),
    ("WAAA", "Wanz Factory"),
    ("CAWD", "kawaii"),
    ("ABF", "Prestige"),
    ("FFT", "Faleno"),
    ("FNS", "Faleno Star"),
    ("FSDSS", "FALENO"),
    ("NGOD", "JET Eizou"),
    ("GVH", "Glory Quest"),
];

/// Alias and prefix tables, injected into the normalizer and resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioTables {
    pub version: u32,
    /// Published studio label to folder key.
    pub aliases: BTreeMap<String, String>,
    /// Code prefix (uppercase letters) to studio name.
    pub prefixes: BTreeMap<String, String>,
}
impl Default for StudioTables {
    fn default() -> Self {
        Self::builtin()
    }
}
impl StudioTables {
    pub fn builtin() -> Self {
        let collect = |pairs: &[(&str, &str)]| pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Self { version: BUILTIN_TABLES_VERSION, aliases: collect(BUILTIN_ALIASES), prefixes: collect(BUILTIN_PREFIXES) }
    }

    pub fn empty() -> Self {
        Self { version: 0, aliases: BTreeMap::new(), prefixes: BTreeMap::new() }
    }

    /// Studio name registered for a code prefix, compared case-insensitively.
    pub fn studio_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.prefixes
            .get(prefix)
            .or_else(|| self.prefixes.iter().find(|(k, _)| k.eq_ignore_ascii_case(prefix)).map(|(_, v)| v))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("SSIS", Some("S1"))]
    #[case("ipx", Some("IdeaPocket"))]
    #[case("ZZZTEST", None)]
    fn test_studio_for_prefix(#[case] prefix: &str, #[case] expected: Option<&str>) {
        assert_eq!(StudioTables::builtin().studio_for_prefix(prefix), expected);
    }

    #[test]
    fn test_builtin_tables_are_versioned() {
        let tables = StudioTables::default();
        assert_eq!(tables.version, BUILTIN_TABLES_VERSION);
        assert!(!tables.aliases.is_empty());
        assert!(StudioTables::empty().prefixes.is_empty());
    }
}
