//! Per-leaf transfer of remote images into the local sink.
//!
//! Every image of a leaf folder becomes one unit on the shared
//! [`WorkQueue`](senas_asyncutils::WorkQueue): download (retried), validate,
//! measure, and record a sample. A unit's failure is logged and counted
//! against the leaf; it never aborts sibling units or the walk.

pub(crate) mod error;
mod file;
mod leaf;

pub use self::leaf::transfer_leaf;
