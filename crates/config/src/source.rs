use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://www.javbus.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/120.0.0.0 Safari/537.36";

/// Settings for the HTTP metadata source and poster downloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// When disabled every item resolves through the fallback table.
    pub enabled: bool,
    /// Detail pages live at `<base_url>/<CODE>`.
    pub base_url: String,
    /// HTTP(S) proxy for every request, e.g. `http://127.0.0.1:7890`.
    pub proxy: Option<String>,
    pub user_agent: String,
    /// Defaults to the base URL when unset.
    pub referer: Option<String>,
    /// Sent verbatim; the default opts in to the full catalogue.
    pub cookie: Option<String>,
    pub accept_language: String,
    pub timeout_secs: u64,
    /// Fixed pause between consecutive network requests.
    pub delay_ms: u64,
    /// Intercepting proxies commonly present their own certificates.
    pub accept_invalid_certs: bool,
}
impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            proxy: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: None,
            cookie: Some("existmag=all".to_string()),
            accept_language: "zh-CN,zh;q=0.9,ja;q=0.8,en;q=0.7".to_string(),
            timeout_secs: 20,
            delay_ms: 500,
            accept_invalid_certs: false,
        }
    }
}
impl SourceConfig {
    pub fn referer(&self) -> String {
        self.referer.clone().unwrap_or_else(|| format!("{}/", self.base_url.trim_end_matches('/')))
    }
}
