//! Heuristic extraction of a [`Candidate`] from a metadata detail page.
//!
//! Pages from the same source differ wildly in markup, so each field is
//! described by an ordered list of [`Probe`]s. For single-valued fields the
//! first probe that yields something wins; for actresses every probe
//! contributes and the results are merged with first-seen de-duplication.

use crate::consts;
use crate::error::{ErrorKind, Result};
use crate::models::{Candidate, dedupe_names};
use crate::Code;
use exn::ResultExt;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::instrument;
use url::Url;

/// One way of pulling strings out of a page.
#[derive(Debug, Clone, Copy)]
pub enum Probe {
    /// Concatenated text content of every matching element.
    Text(&'static Selector),
    /// The named attribute of every matching element.
    Attr(&'static Selector, &'static str),
    /// Every match of a pattern against the raw page source. The first
    /// capture group is used when present, otherwise the whole match.
    Pattern(&'static Regex),
}

/// Ordered probes for every field of a [`Candidate`].
#[derive(Debug, Clone)]
pub struct Heuristics {
    pub title: Vec<Probe>,
    pub studio: Vec<Probe>,
    pub actresses: Vec<Probe>,
    pub poster: Vec<Probe>,
}
impl Default for Heuristics {
    fn default() -> Self {
        Self {
            title: vec![Probe::Text(&consts::TITLE_SELECTOR)],
            studio: vec![Probe::Text(&consts::STUDIO_SELECTOR)],
            actresses: vec![
                Probe::Text(&consts::ACTRESS_WATERFALL_SELECTOR),
                Probe::Attr(&consts::ACTRESS_IMAGE_SELECTOR, "title"),
                Probe::Attr(&consts::ACTRESS_STAR_NAME_SELECTOR, "title"),
                Probe::Attr(&consts::ACTRESS_AVATAR_SELECTOR, "title"),
            ],
            poster: vec![
                Probe::Attr(&consts::POSTER_LINK_SELECTOR, "href"),
                Probe::Attr(&consts::POSTER_IMAGE_SELECTOR, "src"),
                Probe::Pattern(&consts::POSTER_CDN_REGEX),
            ],
        }
    }
}

/// A parsed detail page.
pub struct Document {
    source: String,
    html: Html,
}
impl Document {
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let html = Html::parse_document(&source);
        Self { source, html }
    }

    /// Whether the page is an age-verification interstitial.
    pub fn is_age_gate(&self) -> bool {
        consts::AGE_GATE_REGEX.is_match(&self.source)
    }

    /// Every non-blank string a probe yields, in document order.
    pub fn all(&self, probe: Probe) -> Vec<String> {
        let found: Vec<String> = match probe {
            Probe::Text(selector) => {
                self.html.select(selector).map(|element| element.text().collect::<String>()).collect()
            },
            Probe::Attr(selector, attr) => {
                self.html.select(selector).filter_map(|element| element.value().attr(attr)).map(str::to_string).collect()
            },
            Probe::Pattern(regex) => regex
                .captures_iter(&self.source)
                .filter_map(|captures| captures.get(1).or_else(|| captures.get(0)))
                .map(|m| m.as_str().to_string())
                .collect(),
        };
        found.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
    }

    /// First non-blank string across an ordered list of probes.
    pub fn first(&self, probes: &[Probe]) -> Option<String> {
        probes.iter().find_map(|probe| self.all(*probe).into_iter().next())
    }

    /// Applies `heuristics` to the page.
    ///
    /// `base` resolves relative poster URLs (`/cover.jpg`,
    /// `//cdn/cover.jpg`). The returned candidate may be empty; whether that
    /// is acceptable is the resolver's decision.
    ///
    /// # Errors
    /// [`ErrorKind::AgeGate`] when the page is an interstitial, and
    /// [`ErrorKind::InvalidUrl`] when a poster URL cannot be resolved.
    #[instrument(level = "trace", skip_all, fields(%code))]
    pub fn candidate(&self, code: &Code, heuristics: &Heuristics, base: &Url) -> Result<Candidate> {
        if self.is_age_gate() {
            exn::bail!(ErrorKind::AgeGate);
        }
        let title = self.first(&heuristics.title).map(|title| strip_code(&title, code)).unwrap_or_default();
        let studio = self.first(&heuristics.studio).unwrap_or_default();
        let actresses = dedupe_names(
            heuristics.actresses.iter().flat_map(|probe| self.all(*probe)).filter(|name| is_plausible_name(name)),
        );
        let poster_url = match self.first(&heuristics.poster) {
            Some(raw) => Some(absolutize(base, &raw)?),
            None => None,
        };
        Ok(Candidate { studio, title, actresses, poster_url })
    }
}

/// Pages typically prefix the title with the code itself.
fn strip_code(title: &str, code: &Code) -> String {
    let trimmed = title.trim();
    match trimmed.get(..code.as_str().len()) {
        Some(head) if head.eq_ignore_ascii_case(code.as_str()) => trimmed[code.as_str().len()..].trim().to_string(),
        _ => trimmed.to_string(),
    }
}

/// Single characters and bare numbers are layout debris, not names.
fn is_plausible_name(name: &str) -> bool {
    name.chars().count() > 1 && !name.chars().all(|c| c.is_ascii_digit())
}

fn absolutize(base: &Url, raw: &str) -> Result<String> {
    let url = base.join(raw).or_raise(|| ErrorKind::InvalidUrl(raw.to_string()))?;
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL: &str = r#"<!DOCTYPE html>
<html><body>
  <h3>SSIS-001 A Very Long Title</h3>
  <a class="bigImage" href="/pics/cover/abc_b.jpg"><img src="/pics/cover/abc_b.jpg"></a>
  <p><span>Studio:</span> <a href="https://www.example.com/studio/7q">エスワン ナンバーワンスタイル</a></p>
  <div id="avatar-waterfall">
    <a class="avatar-box" href="/star/1"><span>Yua Mikami</span></a>
    <a class="avatar-box" href="/star/2" title="Rei"><span>Rei</span></a>
  </div>
  <div class="star-name"><a href="/star/3" title="Mei">Mei</a></div>
  <div class="star-name"><a href="/star/9" title="7">7</a></div>
</body></html>"#;

    fn base() -> Url {
        Url::parse("https://www.example.com/").unwrap()
    }

    #[test]
    fn test_candidate_from_detail_page() {
        let code: Code = "SSIS-001".parse().unwrap();
        let candidate = Document::parse(DETAIL).candidate(&code, &Heuristics::default(), &base()).unwrap();
        assert_eq!(candidate.title, "A Very Long Title");
        assert_eq!(candidate.studio, "エスワン ナンバーワンスタイル");
        assert_eq!(candidate.actresses, vec!["Yua Mikami", "Rei", "Mei"]);
        assert_eq!(candidate.poster_url.as_deref(), Some("https://www.example.com/pics/cover/abc_b.jpg"));
    }

    #[test]
    fn test_age_gate_is_rejected() {
        let html = r#"<html><body><div id="driver-verify">Age Verification</div></body></html>"#;
        let code: Code = "SSIS-001".parse().unwrap();
        let err = Document::parse(html).candidate(&code, &Heuristics::default(), &base()).unwrap_err();
        assert_eq!(&*err, &ErrorKind::AgeGate);
    }

    #[test]
    fn test_empty_page_yields_empty_candidate() {
        let code: Code = "SSIS-001".parse().unwrap();
        let candidate =
            Document::parse("<html><body><p>nothing</p></body></html>").candidate(&code, &Heuristics::default(), &base());
        assert!(!candidate.unwrap().is_acceptable());
    }

    #[test]
    fn test_poster_falls_back_to_cdn_pattern() {
        let html = r#"<html><body><h3>Title</h3><script>var img = "https://pics.dmm.co.jp/digital/ssis001pl.jpg";</script></body></html>"#;
        let code: Code = "SSIS-001".parse().unwrap();
        let candidate = Document::parse(html).candidate(&code, &Heuristics::default(), &base()).unwrap();
        assert_eq!(candidate.poster_url.as_deref(), Some("https://pics.dmm.co.jp/digital/ssis001pl.jpg"));
        assert_eq!(candidate.title, "Title");
    }

    #[test]
    fn test_protocol_relative_poster() {
        let html = r#"<html><body><a class="bigImage" href="//cdn.example.net/c.jpg"></a></body></html>"#;
        let code: Code = "IPX-123".parse().unwrap();
        let candidate = Document::parse(html).candidate(&code, &Heuristics::default(), &base()).unwrap();
        assert_eq!(candidate.poster_url.as_deref(), Some("https://cdn.example.net/c.jpg"));
    }

    #[test]
    fn test_strip_code_is_case_insensitive() {
        let code: Code = "IPX-123".parse().unwrap();
        assert_eq!(strip_code("ipx-123  Title", &code), "Title");
        assert_eq!(strip_code("Title IPX-123", &code), "Title IPX-123");
    }
}
