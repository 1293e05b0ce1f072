//! HTTP plumbing for kura.
//!
//! [`connect`] turns a [`SourceConfig`] into an [`HttpSource`] (detail page
//! lookups) and an [`HttpAssetFetcher`] (poster downloads). Both share one
//! connection pool, one set of default headers and one [`Throttle`].

mod asset;
pub mod error;
mod source;
#[cfg(test)]
mod testing;
mod throttle;

pub use crate::asset::HttpAssetFetcher;
pub use crate::source::HttpSource;
pub use crate::throttle::Throttle;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use kura_config::SourceConfig;
use reqwest::header::{ACCEPT_LANGUAGE, COOKIE, HeaderMap, HeaderName, HeaderValue, REFERER, USER_AGENT};
use reqwest::{Client, Proxy};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Builds both HTTP components from one configuration.
///
/// # Errors
/// Fails when the base URL, proxy or a header value is malformed.
pub fn connect(config: &SourceConfig) -> Result<(HttpSource, HttpAssetFetcher)> {
    let client = client(config)?;
    let base = base_url(&config.base_url)?;
    let throttle = Arc::new(Throttle::new(Duration::from_millis(config.delay_ms)));
    Ok((HttpSource::new(client.clone(), base, throttle.clone()), HttpAssetFetcher::new(client, throttle)))
}

fn client(config: &SourceConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    insert(&mut headers, USER_AGENT, "user_agent", &config.user_agent)?;
    insert(&mut headers, REFERER, "referer", &config.referer())?;
    insert(&mut headers, ACCEPT_LANGUAGE, "accept_language", &config.accept_language)?;
    if let Some(cookie) = &config.cookie {
        insert(&mut headers, COOKIE, "cookie", cookie)?;
    }

    let mut builder = Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .danger_accept_invalid_certs(config.accept_invalid_certs);
    // Only an explicitly configured proxy is used; `*_PROXY` variables are ignored.
    builder = match &config.proxy {
        Some(proxy) => {
            debug!(proxy, "routing requests through proxy");
            builder.proxy(Proxy::all(proxy).or_raise(|| ErrorKind::InvalidProxy(proxy.clone()))?)
        },
        None => builder.no_proxy(),
    };
    builder.build().or_raise(|| ErrorKind::Client)
}

fn insert(headers: &mut HeaderMap, name: HeaderName, field: &'static str, value: &str) -> Result<()> {
    let value = HeaderValue::from_str(value).or_raise(|| ErrorKind::InvalidHeader(field))?;
    headers.insert(name, value);
    Ok(())
}

/// Detail pages are joined onto the base as a single path segment, which
/// only works when the base ends in a slash.
fn base_url(raw: &str) -> Result<Url> {
    let normalized = format!("{}/", raw.trim_end_matches('/'));
    let url = Url::parse(&normalized).or_raise(|| ErrorKind::InvalidBaseUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        exn::bail!(ErrorKind::InvalidBaseUrl(raw.to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://www.javbus.com", "https://www.javbus.com/")]
    #[case("https://www.javbus.com/", "https://www.javbus.com/")]
    #[case("http://mirror.local/ja//", "http://mirror.local/ja/")]
    fn test_base_url_gains_trailing_slash(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(base_url(raw).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("not a url")]
    #[case("ftp://example.com")]
    fn test_base_url_rejects(#[case] raw: &str) {
        let err = base_url(raw).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidBaseUrl(_)));
    }

    #[test]
    fn test_connect_with_defaults() {
        assert!(connect(&SourceConfig::default()).is_ok());
    }

    #[test]
    fn test_connect_rejects_bad_header() {
        let config = SourceConfig { cookie: Some("line\nbreak".to_string()), ..SourceConfig::default() };
        let err = connect(&config).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidHeader("cookie")));
    }

    #[test]
    fn test_connect_rejects_bad_proxy() {
        let config = SourceConfig { proxy: Some("::nope::".to_string()), ..SourceConfig::default() };
        let err = connect(&config).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidProxy(_)));
    }
}
