//! Local sink for downloaded dataset files.
//!
//! The importer writes every accepted image below a dataset root, organised
//! by category and leaf code. The [`StorageBackend`] trait is the narrow
//! interface the import pipeline needs from that root: create directories,
//! write and delete files, and stat what was written.

mod local;

pub use self::local::LocalBackend;
use crate::error::Result;
use crate::models::FileInfo;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Interface for the local dataset sink.
///
/// # Path Handling
/// All paths are relative to the dataset root and are validated with
/// [`validate_path`](crate::validate_path) before use; implementations must
/// reject anything that escapes the root.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use senas_storage::{backend::StorageBackend, error::Result};
///
/// async fn store_sample(backend: &dyn StorageBackend, bytes: &[u8]) -> Result<u64> {
///     let path = Path::new("alfabeto/vocales/a/1700000000000_a.png");
///     backend.write(path, bytes).await?;
///     Ok(backend.stat(path).await?.size)
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the backend (used for logging only).
    fn name(&self) -> &str;

    /// Absolute location of a relative dataset path.
    ///
    /// Collaborators that only understand real filesystem paths (such as the
    /// media validator) use this to open what the backend wrote.
    fn resolve(&self, path: &Path) -> Result<PathBuf>;

    /// Check if a file or directory exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Create a directory and all of its missing parents.
    ///
    /// Succeeds when the directory already exists.
    async fn create_dir(&self, path: &Path) -> Result<()>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents, creating parent directories as needed and
    /// overwriting any existing file.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Delete a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Get file metadata without reading contents.
    async fn stat(&self, path: &Path) -> Result<FileInfo>;
}
