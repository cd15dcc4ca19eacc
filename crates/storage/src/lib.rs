pub mod backend;
pub mod error;
mod models;
mod path;
pub mod remote;

pub use crate::backend::StorageBackend;
pub use crate::models::FileInfo;
pub use crate::path::validate as validate_path;
pub use crate::remote::{RemoteEntry, RemoteHandle, RemoteStore, SessionProvider};
use std::sync::Arc;

/// Shared handle to the local sink that receives downloaded files.
pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
