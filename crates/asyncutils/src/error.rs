//! Async Utility Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An async utility error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for async utility operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Every attempt of a retried operation failed. The last underlying error
    /// is kept as the child of this error in the error tree.
    #[display("failed after {attempts} attempts: {label} - {message}")]
    Exhausted {
        attempts: u32,
        label: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        let kind = ErrorKind::Exhausted {
            attempts: 3,
            label: "list folder abc".to_string(),
            message: "network error: timed out".to_string(),
        };
        assert_eq!(kind.to_string(), "failed after 3 attempts: list folder abc - network error: timed out");
    }
}
