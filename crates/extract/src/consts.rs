use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Code shapes, tried in this order against the cleaned, uppercased filename.
regex!(CODE_SEPARATED_REGEX, r"([A-Z]{2,10})[-\s](\d{3,5})");
regex!(CODE_JOINED_REGEX, r"([A-Z]{2,10})(\d{3,5})");
regex!(CODE_CANONICAL_REGEX, r"^[A-Z]{2,10}-\d{3,5}$");

// Detail page heuristics.
selector!(TITLE_SELECTOR, "h3");
selector!(STUDIO_SELECTOR, "a[href*='/studio/']");
selector!(ACTRESS_WATERFALL_SELECTOR, "#avatar-waterfall a.avatar-box span");
selector!(ACTRESS_IMAGE_SELECTOR, "img[src*='/pics/actress/']");
selector!(ACTRESS_STAR_NAME_SELECTOR, "div.star-name a");
selector!(ACTRESS_AVATAR_SELECTOR, "a.avatar-box");
selector!(POSTER_LINK_SELECTOR, "a.bigImage");
selector!(POSTER_IMAGE_SELECTOR, "img.bigImage");
regex!(POSTER_CDN_REGEX, r#"https?://pics\.dmm\.co\.jp/[^"'\s<>]+\.(?:jpe?g|png|webp)"#);
regex!(AGE_GATE_REGEX, r"Age Verification|driver-verify");
