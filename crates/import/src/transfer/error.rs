//! Error types for the [`transfer`](super) module.
//!
//! Per-file errors are logged and counted by the leaf transfer; only a
//! failure to enumerate the leaf folder is raised into the crate error.

use derive_more::{Display, Error};

/// A transfer error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for transfer operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The leaf folder could not be listed.
    Listing,
    /// Downloading into the local sink failed on every attempt.
    Download,
    /// The downloaded file is not a usable image; the local copy was removed.
    #[display("invalid image: {_0}")]
    InvalidImage(#[error(not(source))] String),
    /// The local sink failed after a successful download.
    Storage,
    /// The sample record could not be written.
    Catalog,
}
