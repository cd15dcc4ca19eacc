//! Matching the taxonomy against the remote folder tree.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use senas_asyncutils::{RetryPolicy, with_retry};
use senas_storage::{RemoteEntry, RemoteStore};

const IMAGE_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".webp"];

/// Every non-trashed direct child of a remote folder, retried on failure.
pub async fn list_children(remote: &dyn RemoteStore, retry: &RetryPolicy, folder_id: &str) -> Result<Vec<RemoteEntry>> {
    let label = format!("list folder {folder_id}");
    with_retry(retry, &label, || remote.list(folder_id)).await.or_raise(|| ErrorKind::Remote)
}

/// The sub-folder of `parent_id` named `name`, compared case-insensitively.
///
/// When the remote holds several folders with that name, the first one in
/// listing order wins.
pub async fn find_subfolder(
    remote: &dyn RemoteStore,
    retry: &RetryPolicy,
    parent_id: &str,
    name: &str,
) -> Result<Option<RemoteEntry>> {
    let wanted = name.to_lowercase();
    let mut matches = list_children(remote, retry, parent_id)
        .await?
        .into_iter()
        .filter(|entry| entry.is_folder() && entry.name.to_lowercase() == wanted);
    let first = matches.next();
    let others = matches.count();
    if others > 0 {
        tracing::warn!(parent = parent_id, name, duplicates = others + 1, "Ambiguous folder name; using the first match");
    }
    Ok(first)
}

/// Keep the entries that are images by both MIME type and file extension.
pub fn filter_images(entries: Vec<RemoteEntry>) -> Vec<RemoteEntry> {
    entries.into_iter().filter(is_image).collect()
}

fn is_image(entry: &RemoteEntry) -> bool {
    let name = entry.name.to_lowercase();
    entry.mime_type.starts_with("image/") && IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}
