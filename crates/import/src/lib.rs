//! Taxonomy-driven import of the sign dataset.
//!
//! The [`Importer`] opens a batch in the catalog, authenticates against the
//! remote store and [`walk`]s the compiled [`DATASET`] taxonomy: every
//! category is upserted and matched to a remote folder by name, every leaf
//! folder's images are [transferred](transfer_leaf) into the local sink and
//! recorded as samples. Failures are contained at the lowest level that can
//! absorb them and surface as counts in the final [`Tally`].

mod batch;
pub mod error;
mod matcher;
mod naming;
mod scaffold;
mod taxonomy;
mod transfer;
mod walk;

pub use crate::batch::{Importer, Report, Settings};
pub use crate::matcher::{filter_images, find_subfolder, list_children};
pub use crate::naming::{category_dir, leaf_dir, local_file_name, sanitize};
pub use crate::scaffold::{scaffold, scaffold_dirs};
pub use crate::taxonomy::{DATASET, TaxonomyNode};
pub use crate::transfer::transfer_leaf;
pub use crate::walk::walk;
use senas_asyncutils::{RetryPolicy, WorkQueue};
use senas_catalog::CatalogHandle;
use senas_media::ValidatorHandle;
use senas_storage::{BackendHandle, RemoteHandle};

/// Collaborators shared by every stage of a run.
///
/// Cheap to clone; each transfer unit on the queue holds its own copy.
#[derive(Clone)]
pub struct Context {
    pub remote: RemoteHandle,
    pub catalog: CatalogHandle,
    pub local: BackendHandle,
    pub validator: ValidatorHandle,
    pub retry: RetryPolicy,
    pub queue: WorkQueue,
}

/// Files imported and files that failed, summed over any part of the walk.
///
/// `failed` also counts whole categories whose processing failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, derive_more::AddAssign)]
pub struct Tally {
    pub processed: u64,
    pub failed: u64,
}
