//! One import run, recorded as a batch in the catalog.

use crate::error::{ErrorKind, Result};
use crate::taxonomy::{DATASET, TaxonomyNode};
use crate::walk::walk;
use crate::{Context, Tally};
use exn::ResultExt;
use senas_asyncutils::{RetryPolicy, WorkQueue};
use senas_catalog::{Batch, BatchId, BatchOutcome, CatalogHandle, NewBatch};
use senas_media::ValidatorHandle;
use senas_storage::{BackendHandle, SessionProvider};
use std::num::NonZeroUsize;
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const BATCH_DESCRIPTION: &str = "Automatic import from Google Drive";

/// Run-wide settings, immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Remote folder holding the top-level categories.
    pub root_folder_id: String,
    pub retry: RetryPolicy,
    /// Maximum number of files transferred at once.
    pub concurrency: NonZeroUsize,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct Report {
    /// The finalized batch, as stored in the catalog.
    pub batch: Batch,
    pub tally: Tally,
}

/// Imports the whole taxonomy as a single batch.
pub struct Importer {
    catalog: CatalogHandle,
    session: Arc<dyn SessionProvider>,
    local: BackendHandle,
    validator: ValidatorHandle,
    settings: Settings,
    taxonomy: &'static [TaxonomyNode],
}

impl Importer {
    pub fn new(
        catalog: CatalogHandle,
        session: Arc<dyn SessionProvider>,
        local: BackendHandle,
        validator: ValidatorHandle,
        settings: Settings,
    ) -> Self {
        Self {
            catalog,
            session,
            local,
            validator,
            settings,
            taxonomy: DATASET,
        }
    }

    /// Import a different taxonomy than [`DATASET`].
    pub fn with_taxonomy(mut self, taxonomy: &'static [TaxonomyNode]) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    /// Open a batch, walk the taxonomy, and finalize the batch.
    ///
    /// The batch is COMPLETED whenever the walk finishes, even if some files
    /// failed. If the session cannot be established or the batch cannot be
    /// finalized, the batch is marked FAILED (counting a single failure, with
    /// the error message) and the error is returned.
    #[tracing::instrument(skip(self), fields(root = %self.settings.root_folder_id))]
    pub async fn run(&self) -> Result<Report> {
        let started_at = OffsetDateTime::now_utc();
        let name = format!("Dataset import {}", started_at.format(&Rfc3339).or_raise(|| ErrorKind::BatchOpen)?);
        let batch = self
            .catalog
            .create_batch(&NewBatch {
                name,
                description: BATCH_DESCRIPTION.to_string(),
                started_at,
            })
            .await
            .or_raise(|| ErrorKind::BatchOpen)?;
        tracing::info!(batch = %batch.id, name = %batch.name, "Starting dataset import");

        match self.import(batch.id).await {
            Ok(report) => {
                tracing::info!(
                    batch = %report.batch.id,
                    processed = report.tally.processed,
                    failed = report.tally.failed,
                    "Import completed"
                );
                Ok(report)
            },
            Err(err) => {
                tracing::error!(batch = %batch.id, error = ?err, "Import failed");
                let outcome = BatchOutcome::failed((*err).to_string(), OffsetDateTime::now_utc());
                if let Err(close) = self.catalog.update_batch(batch.id, &outcome).await {
                    tracing::error!(batch = %batch.id, error = ?close, "Could not mark batch as failed");
                }
                Err(err)
            },
        }
    }

    async fn import(&self, batch: BatchId) -> Result<Report> {
        let remote = self.session.authenticate().await.map_err(|err| {
            let reason = (*err).to_string();
            err.raise(ErrorKind::Session(reason))
        })?;
        tracing::debug!(remote = remote.name(), "Remote session established");

        let ctx = Context {
            remote,
            catalog: Arc::clone(&self.catalog),
            local: Arc::clone(&self.local),
            validator: Arc::clone(&self.validator),
            retry: self.settings.retry,
            queue: WorkQueue::new(self.settings.concurrency),
        };
        let tally = walk(&ctx, self.taxonomy, &self.settings.root_folder_id, batch).await;

        let outcome = BatchOutcome::completed(tally.processed, tally.failed, OffsetDateTime::now_utc());
        let batch = self.catalog.update_batch(batch, &outcome).await.or_raise(|| ErrorKind::BatchClose)?;
        Ok(Report { batch, tally })
    }
}
