use crate::error::{ErrorKind as ImportErrorKind, Result as ImportResult};
use crate::matcher::{filter_images, list_children};
use crate::naming::local_file_name;
use crate::transfer::error::{ErrorKind, Result};
use crate::transfer::file::{FileTask, transfer_file};
use crate::{Context, Tally};
use exn::ResultExt;
use senas_asyncutils::{Ticket, WorkQueue};
use senas_catalog::{BatchId, LeafId};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Import every image in the remote folder of one leaf into `destination`.
///
/// Files are transferred concurrently through the context's work queue; this
/// returns once all of them have finished. A folder without images yields an
/// empty [`Tally`].
///
/// # Errors
/// Returns [`Exn<ImportErrorKind::Transfer>`](ImportErrorKind::Transfer) when
/// the folder cannot be listed. Failures of individual files are counted in
/// the tally instead.
pub async fn transfer_leaf(
    ctx: &Context,
    folder_id: &str,
    leaf: LeafId,
    destination: &Path,
    batch: BatchId,
) -> ImportResult<Tally> {
    transfer_leaf_inner(ctx, folder_id, leaf, destination, batch).await.or_raise(|| ImportErrorKind::Transfer)
}

async fn transfer_leaf_inner(
    ctx: &Context,
    folder_id: &str,
    leaf: LeafId,
    destination: &Path,
    batch: BatchId,
) -> Result<Tally> {
    let entries = list_children(&*ctx.remote, &ctx.retry, folder_id).await.or_raise(|| ErrorKind::Listing)?;
    let images = filter_images(entries);
    if images.is_empty() {
        tracing::warn!(folder = folder_id, "No images found in remote folder");
        return Ok(Tally::default());
    }
    tracing::info!(folder = folder_id, destination = %destination.display(), count = images.len(), "Transferring images");

    let processed = Arc::new(AtomicU64::new(0));
    let failed = Arc::new(AtomicU64::new(0));
    let tickets: Vec<Ticket> = images
        .into_iter()
        .map(|image| {
            let task = FileTask {
                path: destination.join(local_file_name(&image.name)),
                file_id: image.id,
                original_name: image.name,
                leaf,
                batch,
            };
            let unit_ctx = ctx.clone();
            let processed = Arc::clone(&processed);
            let failed = Arc::clone(&failed);
            ctx.queue.add(async move {
                match transfer_file(&unit_ctx, &task).await {
                    Ok(sample) => {
                        processed.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!(file = %task.original_name, sample = %sample.id, "Imported");
                    },
                    Err(err) => {
                        failed.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(file = %task.original_name, error = ?err, "Failed to import {}", task.original_name);
                    },
                }
            })
        })
        .collect();
    WorkQueue::join(tickets).await;

    Ok(Tally {
        processed: processed.load(Ordering::Relaxed),
        failed: failed.load(Ordering::Relaxed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use senas_asyncutils::RetryPolicy;
    use senas_catalog::{Catalog, Difficulty, MemoryCatalog, NewBatch, NewCategory, NewLeaf};
    use senas_media::ImageValidator;
    use senas_storage::backend::LocalBackend;
    use senas_storage::remote::MockRemote;
    use std::io::Cursor;
    use std::num::{NonZeroU32, NonZeroUsize};
    use std::time::Duration;
    use tempfile::TempDir;
    use time::OffsetDateTime;

    fn png() -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbImage::new(4, 3).write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png).unwrap();
        bytes
    }

    struct Fixture {
        dir: TempDir,
        ctx: Context,
        catalog: Arc<MemoryCatalog>,
        leaf: LeafId,
        batch: BatchId,
    }

    async fn fixture(remote: MockRemote) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(MemoryCatalog::default());
        let category = catalog
            .create_category(&NewCategory {
                code: "frases".into(),
                name: "Frases".into(),
                parent: None,
                order: 3,
            })
            .await
            .unwrap();
        let leaf = catalog
            .create_leaf(&NewLeaf {
                code: "de-nada".into(),
                name: "DE-NADA".into(),
                difficulty: Difficulty::Advanced,
                category: category.id,
            })
            .await
            .unwrap();
        let batch = catalog
            .create_batch(&NewBatch {
                name: "test".into(),
                description: "test".into(),
                started_at: OffsetDateTime::now_utc(),
            })
            .await
            .unwrap();
        let ctx = Context {
            remote: Arc::new(remote),
            catalog: catalog.clone(),
            local: Arc::new(LocalBackend::new("test", dir.path()).unwrap()),
            validator: Arc::new(ImageValidator),
            retry: RetryPolicy::new(NonZeroU32::new(3).unwrap(), Duration::from_millis(1)),
            queue: WorkQueue::new(NonZeroUsize::new(2).unwrap()),
        };
        Fixture {
            dir,
            ctx,
            catalog,
            leaf: leaf.id,
            batch: batch.id,
        }
    }

    #[tokio::test]
    async fn test_valid_and_invalid_files_are_counted() {
        let mut remote = MockRemote::default();
        let folder = remote.add_folder(MockRemote::ROOT, "de-nada");
        for i in 0..3 {
            remote.add_file(&folder, &format!("ok {i}.png"), "image/png", png());
        }
        remote.add_file(&folder, "broken.png", "image/png", b"not an image".to_vec());
        remote.add_file(&folder, "notes.txt", "text/plain", b"skipped".to_vec());
        let f = fixture(remote).await;

        let destination = Path::new("frases/de-nada");
        let tally = transfer_leaf(&f.ctx, &folder, f.leaf, destination, f.batch).await.unwrap();
        assert_eq!(tally, Tally { processed: 3, failed: 1 });

        let samples = f.catalog.samples().await;
        assert_eq!(samples.len(), 3);
        for sample in &samples {
            assert_eq!((sample.width, sample.height), (4, 3));
            assert_eq!(sample.format, "png");
            assert_eq!(sample.leaf, f.leaf);
            let stored = Path::new(&sample.file_path);
            assert!(stored.is_absolute());
            assert!(stored.starts_with(f.dir.path().join(destination)));
            assert!(stored.is_file());
        }
        // The invalid download was removed again.
        let stored = std::fs::read_dir(f.dir.path().join(destination)).unwrap().count();
        assert_eq!(stored, 3);
    }

    #[tokio::test]
    async fn test_folder_without_images() {
        let mut remote = MockRemote::default();
        let folder = remote.add_folder(MockRemote::ROOT, "de-nada");
        remote.add_file(&folder, "readme.txt", "text/plain", b"x".to_vec());
        let f = fixture(remote).await;
        let tally = transfer_leaf(&f.ctx, &folder, f.leaf, Path::new("frases/de-nada"), f.batch).await.unwrap();
        assert_eq!(tally, Tally::default());
    }

    #[tokio::test]
    async fn test_unlistable_folder_is_an_error() {
        let mut remote = MockRemote::default();
        let folder = remote.add_folder(MockRemote::ROOT, "de-nada");
        remote.fail_listing(&folder, 10);
        let f = fixture(remote).await;
        let err = transfer_leaf(&f.ctx, &folder, f.leaf, Path::new("frases/de-nada"), f.batch).await.unwrap_err();
        assert!(matches!(&*err, ImportErrorKind::Transfer));
    }

    #[tokio::test]
    async fn test_sample_write_failure_keeps_file() {
        let mut remote = MockRemote::default();
        let folder = remote.add_folder(MockRemote::ROOT, "de-nada");
        remote.add_file(&folder, "hand.png", "image/png", png());
        let f = fixture(remote).await;
        f.catalog.fail_sample_writes(1).await;

        let destination = Path::new("frases/de-nada");
        let tally = transfer_leaf(&f.ctx, &folder, f.leaf, destination, f.batch).await.unwrap();
        assert_eq!(tally, Tally { processed: 0, failed: 1 });
        assert!(f.catalog.samples().await.is_empty());
        let stored = std::fs::read_dir(f.dir.path().join(destination)).unwrap().count();
        assert_eq!(stored, 1);
    }
}
