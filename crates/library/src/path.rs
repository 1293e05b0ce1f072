//! Canonical destination paths.
//!
//! Converts resolved [`Metadata`] into deterministic library paths using
//! [upon] templates. The template syntax follows upon's Mustache-like
//! conventions (`{{ variable }}`, `{{ value|formatter }}`), extended with:
//!
//! - **`slug`**: the same slug rules the studio normalizer uses.
//! - **`truncate`**: keeps at most `n` characters (not bytes, so kana and
//!   kanji titles are cut evenly), usable as either `truncate(value, n)` or
//!   `{{ value|truncate: n }}`.
//!
//! # Template Variables
//!
//! | Variable    | Type           | Description                                     |
//! |-------------|----------------|-------------------------------------------------|
//! | `studio`    | `String`       | Normalized studio key                           |
//! | `actress`   | `String`       | Sanitized first actress, or `Unknown`           |
//! | `actresses` | `List<String>` | Every sanitized actress                         |
//! | `code`      | `String`       | Canonical code, e.g. `SSIS-001`                 |
//! | `prefix`    | `String`       | Letter prefix of the code                       |
//! | `title`     | `String`       | Sanitized title                                 |
//! | `source`    | `String`       | `resolved` or `fallback`                        |
//!
//! Whatever the template, the final path component must begin with `[` and
//! contain `]`: that shape is how the scanner recognizes organized items.

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use kura_config::Layout;
use kura_extract::models::Metadata;
use kura_storage::StorageBackend;
use kura_storage::error::Result as StorageResult;
use kura_storage::validate_path;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::instrument;
use upon::{Engine, Template};

pub const DEFAULT_TEMPLATE_FOLDER: &str = "{{ studio }}/{{ actress }}/[{{ code }}] {{ title }}";
pub const DEFAULT_TEMPLATE_FLAT: &str = "{{ studio }}/[{{ code }}]-[{{ title }}]";

/// Placeholder folder for items without a known actress.
pub const UNKNOWN_ACTRESS: &str = "Unknown";
pub const SIDECAR_NAME: &str = "metadata.json";
pub const COVER_STEM: &str = "cover";
const MAX_COMPONENT_CHARS: usize = 200;
const FORBIDDEN: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Makes a free-text value safe to use as a single path component.
///
/// Strips characters that are invalid on common filesystems (and control
/// characters), collapses whitespace, trims leading/trailing dots and spaces,
/// then caps the result at 200 characters.
///
/// ```
/// use kura_library::sanitize;
/// assert_eq!(sanitize("Foo/Bar:Baz"), "FooBarBaz");
/// assert_eq!(sanitize("  ..hidden  title.. "), "hidden title");
/// ```
pub fn sanitize(raw: &str) -> String {
    let stripped: String =
        raw.chars().filter(|c| !FORBIDDEN.contains(c) && (c.is_whitespace() || !c.is_control())).collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c| c == '.' || c == ' ');
    let capped: String = trimmed.chars().take(MAX_COMPONENT_CHARS).collect();
    capped.trim_matches(|c| c == '.' || c == ' ').to_string()
}

/// Whether a file or folder name has the organized `[CODE]…` shape.
pub fn is_canonical_name(name: &str) -> bool {
    name.starts_with('[') && name.contains(']')
}

/// Where an item ends up, and where its companions go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// The item owns a directory holding the video, `cover.*` and `metadata.json`.
    Folder(PathBuf),
    /// The item is a single file; companions sit beside it, named after its stem.
    File(PathBuf),
}
impl Destination {
    /// The path that is moved into place: the folder, or the file.
    pub fn path(&self) -> &Path {
        match self {
            Self::Folder(path) | Self::File(path) => path,
        }
    }

    fn stem(&self) -> String {
        let stem = match self {
            Self::Folder(dir) => dir.file_name(),
            Self::File(file) => file.file_stem(),
        };
        stem.map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
    }

    fn sibling(&self, name: String) -> PathBuf {
        match self {
            Self::Folder(dir) => dir.join(name),
            Self::File(file) => file.with_file_name(name),
        }
    }

    /// Where the video lives. Inside a folder it is renamed to the folder's
    /// own name, keeping its extension.
    pub fn video(&self, extension: Option<&str>) -> PathBuf {
        match (self, extension) {
            (Self::File(file), _) => file.clone(),
            (Self::Folder(_), Some(ext)) => self.sibling(format!("{}.{ext}", self.stem())),
            (Self::Folder(_), None) => self.sibling(self.stem()),
        }
    }

    pub fn cover(&self, extension: &str) -> PathBuf {
        match self {
            Self::Folder(_) => self.sibling(format!("{COVER_STEM}.{extension}")),
            Self::File(_) => self.sibling(format!("{}-{COVER_STEM}.{extension}", self.stem())),
        }
    }

    pub fn sidecar(&self) -> PathBuf {
        match self {
            Self::Folder(_) => self.sibling(SIDECAR_NAME.to_string()),
            Self::File(_) => self.sibling(format!("{}.json", self.stem())),
        }
    }
}

/// Appends `_n` to a folder name, or to a file stem before its extension.
pub fn with_suffix(path: &Path, n: u32, is_file: bool) -> PathBuf {
    let extension = path.extension().filter(|_| is_file).map(|e| e.to_string_lossy().into_owned());
    let stem = match extension {
        Some(_) => path.file_stem(),
        None => path.file_name(),
    };
    let stem = stem.map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    match extension {
        Some(ext) => path.with_file_name(format!("{stem}_{n}.{ext}")),
        None => path.with_file_name(format!("{stem}_{n}")),
    }
}

/// The `n` for which `candidate` is [`with_suffix`]`(base, n, is_file)`, if any.
pub fn suffix_of(candidate: &Path, base: &Path, is_file: bool) -> Option<u32> {
    let stem = match is_file {
        true => candidate.file_stem(),
        false => candidate.file_name(),
    }?;
    let (_, digits) = stem.to_str()?.rsplit_once('_')?;
    let n = digits.parse::<u32>().ok().filter(|n| *n > 0)?;
    (with_suffix(base, n, is_file) == candidate).then_some(n)
}

/// The first of `path`, `path_1`, `path_2`, … that does not exist yet.
///
/// Check-then-act: the caller must move into the returned path before
/// anything else touches the library.
pub async fn free_path(backend: &dyn StorageBackend, path: &Path, is_file: bool) -> StorageResult<PathBuf> {
    if !backend.exists(path).await? {
        return Ok(path.to_path_buf());
    }
    let mut n = 1;
    loop {
        let candidate = with_suffix(path, n, is_file);
        if !backend.exists(&candidate).await? {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Generates canonical destination paths from [`Metadata`] and a template.
///
/// The template is compiled and trial-rendered at construction time, so
/// syntax errors and templates that break the `[CODE]` naming rule surface
/// before any item is touched.
pub struct PathBuilder {
    engine: Engine<'static>,
    template: Template<'static>,
    layout: Layout,
}
impl PathBuilder {
    /// Builds a generator for `layout`, using `template` instead of the
    /// layout's default when given.
    pub fn new(layout: Layout, template: Option<&str>) -> Result<Self> {
        let source = template.map(str::to_string).unwrap_or_else(|| match layout {
            Layout::Folder => DEFAULT_TEMPLATE_FOLDER.to_string(),
            Layout::Flat => DEFAULT_TEMPLATE_FLAT.to_string(),
        });
        let mut engine = Engine::new();
        register_extensions(&mut engine);
        let template = engine.compile(source).or_raise(|| ErrorKind::Template)?;
        let builder = Self { engine, template, layout };
        let sample = Metadata::fallback("ABC-123".parse::<kura_extract::Code>().or_raise(|| ErrorKind::Template)?, "sample");
        builder.generate("sample", &sample)?;
        Ok(builder)
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Renders the template, returning the normalized relative path of the
    /// item (without any extension).
    #[instrument(skip_all, fields(code = %metadata.code))]
    pub fn generate(&self, studio: &str, metadata: &Metadata) -> Result<PathBuf> {
        let rendered = self
            .template
            .render(&self.engine, Self::parameters(studio, metadata))
            .to_string()
            .or_raise(|| ErrorKind::Template)?;
        let path = Self::normalize(rendered)?;
        let name = path.file_name().and_then(|n| n.to_str()).ok_or_raise(|| ErrorKind::Template)?;
        if !is_canonical_name(name) {
            exn::bail!(ErrorKind::Template);
        }
        Ok(path)
    }

    /// Where an item with the given extension belongs, before collision
    /// handling.
    pub fn destination(&self, studio: &str, metadata: &Metadata, extension: Option<&str>) -> Result<Destination> {
        let base = self.generate(studio, metadata)?;
        Ok(match (self.layout, extension) {
            (Layout::Folder, _) => Destination::Folder(base),
            (Layout::Flat, Some(ext)) => {
                let mut name = base.file_name().map(|n| n.to_os_string()).unwrap_or_default();
                name.push(format!(".{ext}"));
                Destination::File(base.with_file_name(name))
            },
            (Layout::Flat, None) => Destination::File(base),
        })
    }

    /// Trims each path segment, drops empty ones, then validates the result
    /// so a rendered path can never leave the library root.
    fn normalize(s: impl Into<String>) -> Result<PathBuf> {
        let path = s.into().trim().split('/').map(str::trim).filter(|s| !s.is_empty()).collect::<Vec<_>>().join("/");
        validate_path(&path).or_raise(|| ErrorKind::Template)
    }

    fn parameters(studio: &str, metadata: &Metadata) -> upon::Value {
        let actresses: Vec<String> =
            metadata.actresses.iter().map(|name| sanitize(name)).filter(|name| !name.is_empty()).collect();
        let actress = actresses.first().cloned().unwrap_or_else(|| UNKNOWN_ACTRESS.to_string());
        upon::value! {
            studio: sanitize(studio),
            actress: actress,
            actresses: actresses,
            code: metadata.code.to_string(),
            prefix: metadata.code.prefix(),
            title: sanitize(&metadata.title),
            source: metadata.source.to_string(),
        }
    }
}
impl std::fmt::Debug for PathBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathBuilder").field("layout", &self.layout).finish_non_exhaustive()
    }
}

/// Template extensions. `slug` folds a value into a studio-style key, and
/// `truncate` keeps at most `n` characters of a value, dropping any
/// whitespace left dangling at the cut.
fn register_extensions(engine: &mut Engine<'_>) {
    engine.add_formatter("slug", slug_value);
    engine.add_function("truncate", truncate_chars);
}

fn slug_value(f: &mut upon::fmt::Formatter<'_>, value: &upon::Value) -> upon::fmt::Result {
    match value {
        upon::Value::String(s) => f.write_str(&crate::normalize::slug(s))?,
        other => upon::fmt::default(f, other)?,
    }
    Ok(())
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => value[..cut].trim_end().to_string(),
        None => value.to_string(),
    }
}
