//! Async building blocks used by the importer.
//!
//! - [`with_retry`] runs a fallible operation with exponential backoff.
//! - [`WorkQueue`] runs units of work with a fixed concurrency limit and hands
//!   back a [`Ticket`] per unit that the caller joins on.

pub mod error;
mod queue;
mod retry;

pub use crate::queue::{Ticket, WorkQueue};
pub use crate::retry::{RetryPolicy, with_retry};
