//! Remote file stores the dataset is imported from.
//!
//! A remote store is a tree of folders and files addressed by opaque ids.
//! The importer only ever needs two operations: list the direct children of
//! a folder, and read the bytes of a file. Stores are obtained from a
//! [`SessionProvider`], which authenticates with stored credentials.

#[cfg(feature = "drive")]
mod auth;
#[cfg(feature = "drive")]
mod drive;
#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "drive")]
pub use self::auth::DriveAuthenticator;
#[cfg(feature = "drive")]
pub use self::drive::DriveRemote;
#[cfg(feature = "mock")]
pub use self::mock::{FailingSession, MockRemote, StaticSession};
use crate::error::Result;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;
use std::sync::Arc;

/// MIME type the remote store uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

pub type RemoteEntryStream<'a> = Pin<Box<dyn Stream<Item = Result<RemoteEntry>> + Send + 'a>>;
pub type RemoteHandle = Arc<dyn RemoteStore>;

/// A direct child of a remote folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    /// Byte size; remote stores do not report one for folders.
    pub size: Option<u64>,
}
impl RemoteEntry {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

/// Read-only access to an authenticated remote store.
///
/// Trashed entries are never listed. Both operations may fail transiently;
/// callers are expected to wrap them in a retry policy.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Name of the store (used for logging only).
    fn name(&self) -> &str;

    /// Stream the direct children of a folder, in the store's listing order.
    ///
    /// Paged stores fetch further pages lazily as the stream is polled.
    fn list_stream<'a>(&'a self, folder_id: &'a str) -> RemoteEntryStream<'a>;

    /// Collect every direct child of a folder.
    ///
    /// An empty folder yields an empty list, never an error.
    async fn list(&self, folder_id: &str) -> Result<Vec<RemoteEntry>> {
        self.list_stream(folder_id).try_collect().await
    }

    /// Read the full contents of a file.
    async fn read(&self, file_id: &str) -> Result<Vec<u8>>;
}

/// Produces an authenticated [`RemoteHandle`] from stored credentials.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Fails with [`Authentication`](crate::error::ErrorKind::Authentication)
    /// when no valid stored token exists.
    async fn authenticate(&self) -> Result<RemoteHandle>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_folder() {
        let mut entry = RemoteEntry {
            id: "1".into(),
            name: "Vocales".into(),
            mime_type: FOLDER_MIME_TYPE.into(),
            size: None,
        };
        assert!(entry.is_folder());
        entry.mime_type = "image/png".into();
        assert!(!entry.is_folder());
    }
}
