//! Path validation for the local dataset sink.
//!
//! Every path handed to a [`StorageBackend`](crate::StorageBackend) is relative
//! to the dataset root and must never leave it.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a relative dataset path and returns it normalized.
///
/// `.` components and repeated separators are dropped, `..` is resolved as
/// long as it never climbs above the root. Null bytes, platform prefixes and
/// paths that normalize to nothing are rejected with
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use senas_storage::validate_path;
/// assert!(validate_path("alfabeto/vocales/a/1_a.png").is_ok());
/// assert!(validate_path("palabras/../frases/de-nada").is_ok());
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a/../../b").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(
///     validate_path("./alfabeto//vocales/./a/").unwrap(),
///     Path::new("alfabeto/vocales/a")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes survive Path::components() on Unix but truncate
                // paths in syscalls.
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

    #[test]
    fn test_dataset_paths() {
        assert_eq!(validate("alfabeto/vocales/a").unwrap(), Path::new("alfabeto/vocales/a"));
        assert_eq!(validate("frases/de-nada/17_x.webp").unwrap(), Path::new("frases/de-nada/17_x.webp"));
        assert_eq!(validate("palabras").unwrap(), Path::new("palabras"));
    }

    #[test]
    fn test_normalization() {
        assert_eq!(validate("a//b//c").unwrap(), Path::new("a/b/c"));
        assert_eq!(validate("a/./b/./c").unwrap(), Path::new("a/b/c"));
        assert_eq!(validate("a/b/..").unwrap(), Path::new("a"));
        assert_eq!(validate("consonantes/").unwrap(), Path::new("consonantes"));
    }

    #[test]
    fn test_absolute_input_is_rooted() {
        // Leading separators are stripped: the result is always relative to the dataset root.
        assert_eq!(validate("/alfabeto/vocales").unwrap(), Path::new("alfabeto/vocales"));
    }

    #[test]
    fn test_traversal_rejected() {
        assert!(validate("../etc/passwd").is_err());
        assert!(validate("a/../../b").is_err());
        assert!(validate("..").is_err());
        assert!(validate("../..").is_err());
    }

    #[test]
    fn test_null_bytes_rejected() {
        assert!(validate("a\0b").is_err());
        assert!(validate("\0").is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(validate("").is_err());
        assert!(validate(".").is_err());
        assert!(validate("./.").is_err());
        assert!(validate("//").is_err());
    }
}
