//! Root-relative path validation.
//!
//! Every path handed to a [`StorageBackend`](crate::StorageBackend) is
//! relative to the library root. Validation resolves `.`/`..` components
//! lexically and refuses anything that would climb above the root, so a
//! hostile title scraped from the web can never turn into `../../etc`.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a library-relative path.
///
/// > **Note:** This does **not** touch the filesystem; symlinks are not
/// >           resolved. Null bytes are explicitly rejected.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use kura_storage::validate_path;
/// assert!(validate_path("s1/Unknown/[SSIS-001] Title").is_ok());
/// assert!(validate_path("others/../s1/file.mp4").is_ok());
/// assert!(validate_path("../outside.mp4").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(
///     validate_path("s1/./Unknown//[SSIS-001] Title/").unwrap(),
///     Path::new("s1/Unknown/[SSIS-001] Title")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes survive Path::components() on Unix but truncate in syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(original.to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(original.to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(original.to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("s1/Unknown/[SSIS-001] Title", "s1/Unknown/[SSIS-001] Title")]
    #[case("others//SSIS-001.mp4", "others/SSIS-001.mp4")]
    #[case("s1/./Unknown/./x.mp4", "s1/Unknown/x.mp4")]
    #[case("s1/Unknown/..", "s1")]
    #[case("studio/", "studio")]
    #[case("studio///", "studio")]
    fn test_valid_paths(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate(input).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case("../outside.mp4")]
    #[case("a/../../b")]
    #[case("..")]
    #[case("a\0b")]
    #[case("")]
    #[case(".")]
    #[case("./.")]
    #[case("//")]
    fn test_invalid_paths(#[case] input: &str) {
        let err = validate(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_absolute_input_is_treated_as_relative() {
        assert_eq!(validate("/s1/file.mp4").unwrap(), Path::new("s1/file.mp4"));
    }
}
