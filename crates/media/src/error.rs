//! Media Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A media error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for media operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The file could not be opened or read.
    #[display("could not read {}", _0.display())]
    Unreadable(#[error(not(source))] PathBuf),
    /// The file is not a structurally valid image in a supported format.
    #[display("not a valid image: {}", _0.display())]
    InvalidImage(#[error(not(source))] PathBuf),
    /// The blocking decode task was cancelled or panicked.
    #[display("image decoding task failed")]
    Task,
}

