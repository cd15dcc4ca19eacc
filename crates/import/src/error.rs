//! Import Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Failures of a single file never show
//! up here: they are counted by the [`transfer`](crate::transfer) stage.

use derive_more::{Display, Error};

/// An import error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of an import failure.
///
/// ### Node-level errors
/// Caught by the walker, logged, and counted as one failure:
/// - [`ErrorKind::Catalog`]
/// - [`ErrorKind::Remote`]
/// - [`ErrorKind::Storage`]
/// - [`ErrorKind::Transfer`]
///
/// ### Fatal errors
/// Mark the batch as failed and end the run:
/// - [`ErrorKind::Session`]
/// - [`ErrorKind::BatchOpen`]
/// - [`ErrorKind::BatchClose`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A category or leaf could not be read from or written to the catalog.
    #[display("catalog operation failed")]
    Catalog,
    /// A remote folder could not be listed, even after retrying.
    #[display("remote listing failed")]
    Remote,
    /// The local dataset sink rejected an operation.
    #[display("local storage operation failed")]
    Storage,
    /// The images of a leaf folder could not be enumerated.
    #[display("transfer of leaf folder failed")]
    Transfer,
    /// No authenticated remote session could be established.
    #[display("remote session unavailable: {_0}")]
    Session(#[error(not(source))] String),
    #[display("could not open import batch")]
    BatchOpen,
    #[display("could not finalize import batch")]
    BatchClose,
}

impl ErrorKind {
    /// Returns `true` if the error ends the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Session(_) | Self::BatchOpen | Self::BatchClose)
    }
}
