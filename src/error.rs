//! Binary Error Types
//!
//! Each variant names the bootstrap or run step that failed; the underlying
//! library error is kept as its child in the error tree.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open the catalog database")]
    Catalog,
    #[display("could not prepare the local dataset folder")]
    Storage,
    #[display("dataset import failed")]
    Import,
}
