//! Recursive walk of the taxonomy against the remote folder tree.

use crate::error::{ErrorKind, Result};
use crate::matcher::find_subfolder;
use crate::naming::leaf_dir;
use crate::taxonomy::TaxonomyNode;
use crate::transfer::transfer_leaf;
use crate::{Context, Tally};
use exn::ResultExt;
use senas_catalog::{BatchId, Category, NewCategory, NewLeaf};
use std::future::Future;
use std::pin::Pin;

/// Walk `nodes` below the remote folder `folder_id`, importing every leaf.
///
/// Nodes are handled strictly one after another, each subtree (including
/// its transfers) finishing before the next sibling starts. A node whose
/// remote folder is missing is skipped with a warning. Any other failure
/// while handling a node is logged and counted as one failure, keeping
/// whatever that node had already imported.
#[tracing::instrument(level = "debug", skip(ctx, nodes))]
pub async fn walk(ctx: &Context, nodes: &[TaxonomyNode], folder_id: &str, batch: BatchId) -> Tally {
    walk_level(ctx, nodes, folder_id, batch, None).await
}

fn walk_level<'a>(
    ctx: &'a Context,
    nodes: &'a [TaxonomyNode],
    folder_id: &'a str,
    batch: BatchId,
    parent: Option<&'a Category>,
) -> Pin<Box<dyn Future<Output = Tally> + Send + 'a>> {
    Box::pin(async move {
        let mut tally = Tally::default();
        for (index, node) in nodes.iter().enumerate() {
            if let Err(err) = walk_node(ctx, node, index, folder_id, batch, parent, &mut tally).await {
                tracing::error!(category = node.name, error = ?err, "Failed to process category {}", node.name);
                tally.failed += 1;
            }
        }
        tally
    })
}

async fn walk_node(
    ctx: &Context,
    node: &TaxonomyNode,
    index: usize,
    folder_id: &str,
    batch: BatchId,
    parent: Option<&Category>,
    tally: &mut Tally,
) -> Result<()> {
    let category = ctx
        .catalog
        .category_or_create(&NewCategory {
            code: node.code.to_string(),
            name: node.name.to_string(),
            parent: parent.map(|p| p.id),
            order: node.order_at(index),
        })
        .await
        .or_raise(|| ErrorKind::Catalog)?;

    let Some(folder) = find_subfolder(&*ctx.remote, &ctx.retry, folder_id, node.name).await? else {
        tracing::warn!(category = node.name, parent = folder_id, "Remote folder not found; skipping");
        return Ok(());
    };

    if !node.children.is_empty() {
        *tally += walk_level(ctx, node.children, &folder.id, batch, Some(&category)).await;
    }

    for code in node.leaves {
        let leaf = ctx
            .catalog
            .leaf_or_create(&NewLeaf {
                code: code.to_lowercase(),
                name: code.to_uppercase(),
                difficulty: node.difficulty(),
                category: category.id,
            })
            .await
            .or_raise(|| ErrorKind::Catalog)?;

        let Some(leaf_folder) = find_subfolder(&*ctx.remote, &ctx.retry, &folder.id, code).await? else {
            tracing::warn!(category = node.name, leaf = code, "Remote leaf folder not found; skipping");
            continue;
        };

        let destination = leaf_dir(parent.map(|p| p.code.as_str()), node.code, code);
        ctx.local.create_dir(&destination).await.or_raise(|| ErrorKind::Storage)?;
        *tally += transfer_leaf(ctx, &leaf_folder.id, leaf.id, &destination, batch).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use senas_asyncutils::{RetryPolicy, WorkQueue};
    use senas_catalog::{Catalog, Difficulty, MemoryCatalog};
    use senas_media::ImageValidator;
    use senas_storage::backend::LocalBackend;
    use senas_storage::remote::MockRemote;
    use std::io::Cursor;
    use std::num::{NonZeroU32, NonZeroUsize};
    use std::sync::Arc;
    use std::time::Duration;

    static TREE: &[TaxonomyNode] = &[
        TaxonomyNode {
            difficulty: Some(Difficulty::Intermediate),
            leaves: &["Uno", "dos"],
            ..TaxonomyNode::new("Números", "numeros")
        },
        TaxonomyNode {
            children: &[TaxonomyNode {
                leaves: &["rojo"],
                ..TaxonomyNode::new("Primarios", "primarios")
            }],
            ..TaxonomyNode::new("Colores", "colores")
        },
    ];

    fn png() -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbImage::new(2, 2).write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png).unwrap();
        bytes
    }

    fn context(remote: MockRemote, catalog: Arc<MemoryCatalog>, root: &std::path::Path) -> Context {
        Context {
            remote: Arc::new(remote),
            catalog,
            local: Arc::new(LocalBackend::new("test", root).unwrap()),
            validator: Arc::new(ImageValidator),
            retry: RetryPolicy::new(NonZeroU32::new(2).unwrap(), Duration::from_millis(1)),
            queue: WorkQueue::new(NonZeroUsize::new(4).unwrap()),
        }
    }

    async fn open_batch(catalog: &MemoryCatalog) -> BatchId {
        let batch = senas_catalog::NewBatch {
            name: "walk".into(),
            description: "walk".into(),
            started_at: time::OffsetDateTime::now_utc(),
        };
        catalog.create_batch(&batch).await.unwrap().id
    }

    #[tokio::test]
    async fn test_destinations_and_leaf_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut remote = MockRemote::default();
        let numeros = remote.add_folder(MockRemote::ROOT, "números");
        let uno = remote.add_folder(&numeros, "UNO");
        remote.add_file(&uno, "1.png", "image/png", png());
        let colores = remote.add_folder(MockRemote::ROOT, "Colores");
        let primarios = remote.add_folder(&colores, "Primarios");
        let rojo = remote.add_folder(&primarios, "rojo");
        remote.add_file(&rojo, "r.png", "image/png", png());
        let catalog = Arc::new(MemoryCatalog::default());
        let batch = open_batch(&catalog).await;
        let ctx = context(remote, catalog.clone(), dir.path());

        let tally = walk(&ctx, TREE, MockRemote::ROOT, batch).await;
        assert_eq!(tally, Tally { processed: 2, failed: 0 });
        assert!(dir.path().join("numeros/uno").is_dir());
        assert!(dir.path().join("colores/primarios/rojo").is_dir());

        let uno = catalog.find_leaf_by_code("uno").await.unwrap().unwrap();
        assert_eq!(uno.name, "UNO");
        assert_eq!(uno.difficulty, Difficulty::Intermediate);
        // Leaves are recorded even without a remote folder.
        let dos = catalog.find_leaf_by_code("dos").await.unwrap().unwrap();
        assert_eq!(dos.category, uno.category);
        let rojo = catalog.find_leaf_by_code("rojo").await.unwrap().unwrap();
        assert_eq!(rojo.difficulty, Difficulty::Basic);

        let primarios = catalog.find_category_by_code("primarios").await.unwrap().unwrap();
        let colores = catalog.find_category_by_code("colores").await.unwrap().unwrap();
        assert_eq!(primarios.parent, Some(colores.id));
        assert_eq!((colores.order, primarios.order), (1, 0));
    }

    #[tokio::test]
    async fn test_failed_node_keeps_earlier_counts() {
        let dir = tempfile::tempdir().unwrap();
        let mut remote = MockRemote::default();
        let numeros = remote.add_folder(MockRemote::ROOT, "Números");
        let uno = remote.add_folder(&numeros, "Uno");
        remote.add_file(&uno, "1.png", "image/png", png());
        let dos = remote.add_folder(&numeros, "dos");
        remote.add_file(&dos, "2.png", "image/png", png());
        // The leaf folder "dos" can be found but never listed.
        remote.fail_listing(&dos, 10);
        let catalog = Arc::new(MemoryCatalog::default());
        let batch = open_batch(&catalog).await;
        let ctx = context(remote, catalog.clone(), dir.path());

        let tally = walk(&ctx, TREE, MockRemote::ROOT, batch).await;
        // "Uno" was imported before "dos" failed the node; Colores is absent.
        assert_eq!(tally, Tally { processed: 1, failed: 1 });
        assert_eq!(catalog.samples().await.len(), 1);
        assert!(catalog.find_category_by_code("colores").await.unwrap().is_some());
    }
}
