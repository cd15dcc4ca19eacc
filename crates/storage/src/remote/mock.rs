//! In-memory remote store for testing.

use super::{FOLDER_MIME_TYPE, RemoteEntry, RemoteEntryStream, RemoteHandle, RemoteStore, SessionProvider};
use crate::error::{ErrorKind, Result};
use async_stream::stream;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory remote store for testing.
///
/// Folders and files are kept in insertion order, which is also the listing
/// order. Failures can be injected per folder (listing) or per file (reads)
/// to exercise retry and isolation paths, and every call is counted.
///
/// # Examples
///
/// ```
/// use senas_storage::remote::{MockRemote, RemoteStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut remote = MockRemote::default();
/// let vocales = remote.add_folder(MockRemote::ROOT, "Vocales");
/// let a = remote.add_folder(&vocales, "a");
/// remote.add_file(&a, "hand.png", "image/png", b"...".to_vec());
///
/// let children = remote.list(&a).await?;
/// assert_eq!(children.len(), 1);
/// assert_eq!(children[0].name, "hand.png");
/// # Ok(())
/// # }
/// ```
pub struct MockRemote {
    name: String,
    tree: RwLock<MockTree>,
}

#[derive(Default)]
struct MockTree {
    next_id: u64,
    nodes: Vec<MockNode>,
    list_failures: HashMap<String, u32>,
    read_failures: HashMap<String, u32>,
    lists: HashMap<String, u32>,
    reads: HashMap<String, u32>,
}

struct MockNode {
    parent: String,
    entry: RemoteEntry,
    trashed: bool,
    data: Vec<u8>,
}

impl MockRemote {
    /// Id of the implicit root folder.
    pub const ROOT: &'static str = "root";

    /// Change the name of the mock remote.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a folder under `parent`, returning its generated id.
    pub fn add_folder(&mut self, parent: &str, name: &str) -> String {
        self.insert(parent, name, FOLDER_MIME_TYPE, Vec::new())
    }

    /// Add a file under `parent`, returning its generated id.
    pub fn add_file(&mut self, parent: &str, name: &str, mime_type: &str, data: impl Into<Vec<u8>>) -> String {
        self.insert(parent, name, mime_type, data.into())
    }

    /// Mark an entry as trashed; trashed entries are never listed.
    ///
    /// Panics on unknown ids. If test setup is wrong, the test should not pass.
    pub fn trash(&mut self, id: &str) {
        let tree = self.tree.get_mut();
        let Some(node) = tree.nodes.iter_mut().find(|node| node.entry.id == id) else {
            panic!("MockRemote::trash: unknown id {id}");
        };
        node.trashed = true;
    }

    /// Make the next `times` listings of `folder_id` fail with a network error.
    pub fn fail_listing(&mut self, folder_id: &str, times: u32) {
        self.tree.get_mut().list_failures.insert(folder_id.to_string(), times);
    }

    /// Make the next `times` reads of `file_id` fail with a network error.
    pub fn fail_reads(&mut self, file_id: &str, times: u32) {
        self.tree.get_mut().read_failures.insert(file_id.to_string(), times);
    }

    /// How many times `folder_id` has been listed.
    pub async fn list_count(&self, folder_id: &str) -> u32 {
        self.tree.read().await.lists.get(folder_id).copied().unwrap_or(0)
    }

    /// How many times `file_id` has been read.
    pub async fn read_count(&self, file_id: &str) -> u32 {
        self.tree.read().await.reads.get(file_id).copied().unwrap_or(0)
    }

    fn insert(&mut self, parent: &str, name: &str, mime_type: &str, data: Vec<u8>) -> String {
        let tree = self.tree.get_mut();
        tree.next_id += 1;
        let id = format!("mock-{}", tree.next_id);
        let size = (mime_type != FOLDER_MIME_TYPE).then_some(data.len() as u64);
        tree.nodes.push(MockNode {
            parent: parent.to_string(),
            entry: RemoteEntry {
                id: id.clone(),
                name: name.to_string(),
                mime_type: mime_type.to_string(),
                size,
            },
            trashed: false,
            data,
        });
        id
    }
}
impl Default for MockRemote {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            tree: RwLock::new(MockTree::default()),
        }
    }
}

impl MockTree {
    /// Consume one injected failure for `id`, if any remain.
    fn take_failure(failures: &mut HashMap<String, u32>, id: &str) -> bool {
        match failures.get_mut(id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            },
            _ => false,
        }
    }

    fn list(&mut self, folder_id: &str) -> Result<Vec<RemoteEntry>> {
        *self.lists.entry(folder_id.to_string()).or_default() += 1;
        if Self::take_failure(&mut self.list_failures, folder_id) {
            exn::bail!(ErrorKind::Network(format!("injected listing failure for {folder_id}")));
        }
        let known = folder_id == MockRemote::ROOT
            || self.nodes.iter().any(|node| node.entry.id == folder_id && node.entry.is_folder());
        if !known {
            exn::bail!(ErrorKind::NotFound(folder_id.to_string()));
        }
        Ok(self
            .nodes
            .iter()
            .filter(|node| node.parent == folder_id && !node.trashed)
            .map(|node| node.entry.clone())
            .collect())
    }

    fn read(&mut self, file_id: &str) -> Result<Vec<u8>> {
        *self.reads.entry(file_id.to_string()).or_default() += 1;
        if Self::take_failure(&mut self.read_failures, file_id) {
            exn::bail!(ErrorKind::Network(format!("injected read failure for {file_id}")));
        }
        self.nodes
            .iter()
            .find(|node| node.entry.id == file_id && !node.entry.is_folder())
            .map(|node| node.data.clone())
            .ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(file_id.to_string())))
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, folder_id: &'a str) -> RemoteEntryStream<'a> {
        Box::pin(stream! {
            // Snapshot under the lock, then release it before yielding.
            let listing = self.tree.write().await.list(folder_id);
            match listing {
                Ok(entries) => {
                    for entry in entries {
                        yield Ok(entry);
                    }
                },
                Err(e) => yield Err(e),
            }
        })
    }

    async fn read(&self, file_id: &str) -> Result<Vec<u8>> {
        self.tree.write().await.read(file_id)
    }
}

/// Session provider that always hands out the same remote.
pub struct StaticSession {
    remote: RemoteHandle,
}
impl StaticSession {
    pub fn new(remote: RemoteHandle) -> Self {
        Self { remote }
    }
}

#[async_trait]
impl SessionProvider for StaticSession {
    async fn authenticate(&self) -> Result<RemoteHandle> {
        Ok(Arc::clone(&self.remote))
    }
}

/// Session provider whose stored credentials are always rejected.
pub struct FailingSession {
    message: String,
}
impl FailingSession {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[async_trait]
impl SessionProvider for FailingSession {
    async fn authenticate(&self) -> Result<RemoteHandle> {
        exn::bail!(ErrorKind::Authentication(self.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listing_order_and_trash() {
        let mut remote = MockRemote::default();
        let first = remote.add_folder(MockRemote::ROOT, "Alfabeto");
        let trashed = remote.add_file(MockRemote::ROOT, "old.png", "image/png", b"x".to_vec());
        let second = remote.add_folder(MockRemote::ROOT, "alfabeto");
        remote.trash(&trashed);
        let ids: Vec<_> = remote.list(MockRemote::ROOT).await.unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[tokio::test]
    async fn test_empty_folder() {
        let mut remote = MockRemote::default();
        let empty = remote.add_folder(MockRemote::ROOT, "Frases");
        assert!(remote.list(&empty).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_folder() {
        let remote = MockRemote::default();
        let err = remote.list("nope").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let mut remote = MockRemote::default();
        let file = remote.add_file(MockRemote::ROOT, "a.png", "image/png", b"png".to_vec());
        remote.fail_reads(&file, 2);
        assert!(remote.read(&file).await.is_err());
        assert!(remote.read(&file).await.is_err());
        assert_eq!(remote.read(&file).await.unwrap(), b"png");
        assert_eq!(remote.read_count(&file).await, 3);

        remote.fail_listing(MockRemote::ROOT, 1);
        let err = remote.list(MockRemote::ROOT).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(remote.list(MockRemote::ROOT).await.unwrap().len(), 1);
        assert_eq!(remote.list_count(MockRemote::ROOT).await, 2);
    }

    #[tokio::test]
    async fn test_sessions() {
        let remote: RemoteHandle = Arc::new(MockRemote::default().with_name("fixture"));
        let session = StaticSession::new(remote);
        assert_eq!(session.authenticate().await.unwrap().name(), "fixture");

        let Err(err) = FailingSession::new("token missing").authenticate().await else {
            panic!("a failing session must not hand out a remote");
        };
        assert!(matches!(&*err, ErrorKind::Authentication(_)));
    }
}
