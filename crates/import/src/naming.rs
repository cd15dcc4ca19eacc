//! Local paths for imported files.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;

static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '_',
        })
        .collect()
}

/// Millisecond stamp that never repeats within the process.
///
/// Follows the wall clock, but when two files are named in the same
/// millisecond (or the clock steps back) the later one gets the next value.
pub fn next_stamp() -> u64 {
    let now = u64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).unwrap_or(0);
    let previous = LAST_STAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last.saturating_add(1))))
        .unwrap_or_else(|last| last);
    now.max(previous.saturating_add(1))
}

/// Name of the local copy of a remote file: `<stamp>_<sanitized name>`.
pub fn local_file_name(remote_name: &str) -> String {
    format!("{}_{}", next_stamp(), sanitize(remote_name))
}

/// Directory of a leaf below the dataset root:
/// `[parent category code/]category code/leaf code in lower case`.
pub fn leaf_dir(parent: Option<&str>, category: &str, leaf: &str) -> PathBuf {
    let mut path = category_dir(parent, category);
    path.push(leaf.to_lowercase());
    path
}

pub fn category_dir(parent: Option<&str>, category: &str) -> PathBuf {
    let mut path = PathBuf::new();
    if let Some(parent) = parent {
        path.push(parent);
    }
    path.push(category);
    path
}
