//! Local directory layout for the taxonomy.

use crate::error::{ErrorKind, Result};
use crate::naming::{category_dir, leaf_dir};
use crate::taxonomy::TaxonomyNode;
use exn::ResultExt;
use senas_storage::StorageBackend;
use std::path::PathBuf;

/// Every category and leaf directory of `nodes`, parents before children.
///
/// Paths follow the same rule the walker uses for its destinations.
pub fn scaffold_dirs(nodes: &[TaxonomyNode]) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    collect(nodes, None, &mut dirs);
    dirs
}

fn collect(nodes: &[TaxonomyNode], parent: Option<&str>, dirs: &mut Vec<PathBuf>) {
    for node in nodes {
        dirs.push(category_dir(parent, node.code));
        collect(node.children, Some(node.code), dirs);
        dirs.extend(node.leaves.iter().map(|leaf| leaf_dir(parent, node.code, leaf)));
    }
}

/// Create the local directory tree for `nodes`, returning how many
/// directories it contains. Existing directories are left alone.
pub async fn scaffold(local: &dyn StorageBackend, nodes: &[TaxonomyNode]) -> Result<usize> {
    let dirs = scaffold_dirs(nodes);
    for dir in &dirs {
        local.create_dir(dir).await.or_raise(|| ErrorKind::Storage)?;
    }
    tracing::debug!(backend = local.name(), count = dirs.len(), "Created local folder structure");
    Ok(dirs.len())
}
