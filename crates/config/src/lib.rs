//! Layered configuration for kura.
//!
//! Values are merged, lowest precedence first, from:
//!
//! 1. built-in defaults ([`Config::default`]),
//! 2. a configuration file (`toml`, `yaml`/`yml` or `json`, chosen by
//!    extension), either given explicitly or found at
//!    [`Config::default_path`],
//! 3. environment variables prefixed with `KURA_`, where `__` separates
//!    nested keys (`KURA_SOURCE__PROXY=http://127.0.0.1:7890`).
//!
//! Command-line flags are applied on top by the binary.

pub mod error;
mod layout;
mod source;
mod tables;

pub use crate::layout::Layout;
pub use crate::source::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT, SourceConfig};
pub use crate::tables::{BUILTIN_TABLES_VERSION, StudioTables};
use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

pub const DEFAULT_QUARANTINE_DIR: &str = "others";
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "wmv", "flv", "mov", "m4v", "rmvb", "ts"];
const ENV_PREFIX: &str = "KURA_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: Layout,
    /// Custom path template overriding the layout's built-in one.
    pub template: Option<String>,
    /// Directory directly under the library root that receives failed items.
    pub quarantine_dir: String,
    /// Lowercase, without the leading dot.
    pub video_extensions: Vec<String>,
    pub source: SourceConfig,
    pub tables: StudioTables,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            template: None,
            quarantine_dir: DEFAULT_QUARANTINE_DIR.to_string(),
            video_extensions: DEFAULT_VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            source: SourceConfig::default(),
            tables: StudioTables::default(),
        }
    }
}
impl Config {
    /// `<platform config dir>/kura.toml`, e.g. `~/.config/kura/kura.toml`.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "kura").map(|dirs| dirs.config_dir().join("kura.toml"))
    }

    /// Builds the provider stack without extracting it.
    ///
    /// An explicit `path` must exist; the default path is only used when it
    /// does.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };
        if let Some(file) = file {
            debug!(path = %file.display(), "loading configuration file");
            let extension = file.extension().map(|e| e.to_string_lossy().to_lowercase());
            figment = match extension.as_deref() {
                Some("toml") => figment.merge(Toml::file(&file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(&file)),
                Some("json") => figment.merge(Json::file(&file)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(file)),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Loads and validates configuration from every provider.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(&Self::figment(path)?)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Parse)?;
        config.validated()
    }

    /// Normalizes extensions and rejects values that would break the layout.
    pub fn validated(mut self) -> Result<Self> {
        let mut components = Path::new(&self.quarantine_dir).components();
        if !matches!((components.next(), components.next()), (Some(Component::Normal(_)), None)) {
            exn::bail!(ErrorKind::Invalid {
                field: "quarantine_dir",
                reason: format!("'{}' must be a single directory name", self.quarantine_dir),
            });
        }
        self.video_extensions = self
            .video_extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        if self.video_extensions.is_empty() {
            exn::bail!(ErrorKind::Invalid { field: "video_extensions", reason: "no extensions left".to_string() });
        }
        if self.source.timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid { field: "source.timeout_secs", reason: "must be positive".to_string() });
        }
        Ok(self)
    }
}
