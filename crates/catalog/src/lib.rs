//! Persistent catalog of the sign dataset.
//!
//! The catalog records what the importer found and accepted:
//! - **Categories** and **leaves** (individual signs) mirror the compiled
//!   taxonomy. They are unique by code and created lazily, so re-running an
//!   import never duplicates them.
//! - **Batches** record one import run each, with its final counts.
//! - **Samples** record every accepted image file, linked to its leaf and to
//!   the batch that imported it.
//!
//! Consumers depend on the narrow [`Catalog`] trait; [`Repository`] is the
//! SQLite implementation and, with the `mock` feature, [`MemoryCatalog`] is
//! an in-memory one for tests.

mod catalog;
mod db;
pub mod error;
#[cfg(feature = "mock")]
mod memory;
mod models;
mod repo;

pub use crate::catalog::{Catalog, CatalogHandle};
pub use crate::db::Database;
#[cfg(feature = "mock")]
pub use crate::memory::MemoryCatalog;
pub use crate::models::{
    Batch, BatchId, BatchOutcome, BatchStatus, Category, CategoryId, Difficulty, Leaf, LeafId, NewBatch, NewCategory,
    NewLeaf, NewSample, Quality, Sample, SampleId, SampleKind, SampleSource,
};
pub use crate::repo::Repository;
