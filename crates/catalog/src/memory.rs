//! In-memory catalog for testing.

use crate::catalog::Catalog;
use crate::error::{ErrorKind, Result};
use crate::models::{
    Batch, BatchId, BatchOutcome, BatchStatus, Category, CategoryId, Leaf, LeafId, NewBatch, NewCategory, NewLeaf,
    NewSample, Sample, SampleId,
};
use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// In-memory catalog for testing.
///
/// Mirrors the uniqueness and lifecycle rules of the SQLite
/// [`Repository`](crate::Repository), and can be told to fail upcoming
/// writes to exercise error paths.
///
/// # Examples
///
/// ```
/// use senas_catalog::{Catalog, MemoryCatalog, NewCategory};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> senas_catalog::error::Result<()> {
/// let catalog = MemoryCatalog::default();
/// let new = NewCategory { code: "alfabeto".into(), name: "Alfabeto".into(), parent: None, order: 1 };
/// let first = catalog.category_or_create(&new).await?;
/// let again = catalog.category_or_create(&new).await?;
/// assert_eq!(first.id, again.id);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MemoryCatalog {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    categories: Vec<Category>,
    leaves: Vec<Leaf>,
    batches: Vec<Batch>,
    samples: Vec<Sample>,
    failing_category_writes: u32,
    failing_sample_writes: u32,
    failing_batch_updates: u32,
}

fn take(remaining: &mut u32) -> bool {
    match *remaining {
        0 => false,
        _ => {
            *remaining -= 1;
            true
        },
    }
}

fn next_id(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX - 1) + 1
}

impl MemoryCatalog {
    /// Fail the next `times` category inserts with a database error.
    pub async fn fail_category_writes(&self, times: u32) {
        self.state.write().await.failing_category_writes = times;
    }

    /// Fail the next `times` sample inserts with a database error.
    pub async fn fail_sample_writes(&self, times: u32) {
        self.state.write().await.failing_sample_writes = times;
    }

    /// Fail the next `times` batch finalizations with a database error.
    pub async fn fail_batch_updates(&self, times: u32) {
        self.state.write().await.failing_batch_updates = times;
    }

    /// Every sample stored so far, across batches.
    pub async fn samples(&self) -> Vec<Sample> {
        self.state.read().await.samples.clone()
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.state.read().await.categories.clone()
    }

    pub async fn leaves(&self) -> Vec<Leaf> {
        self.state.read().await.leaves.clone()
    }

    pub async fn batches(&self) -> Vec<Batch> {
        self.state.read().await.batches.clone()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn find_category_by_code(&self, code: &str) -> Result<Option<Category>> {
        Ok(self.state.read().await.categories.iter().find(|c| c.code == code).cloned())
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category> {
        let mut state = self.state.write().await;
        if take(&mut state.failing_category_writes) {
            exn::bail!(ErrorKind::Database);
        }
        if let Some(existing) = state.categories.iter().find(|c| c.code == category.code) {
            return Ok(existing.clone());
        }
        if let Some(parent) = category.parent
            && !state.categories.iter().any(|c| c.id == parent)
        {
            exn::bail!(ErrorKind::Database);
        }
        let created = Category {
            id: CategoryId(next_id(state.categories.len())),
            code: category.code.clone(),
            name: category.name.clone(),
            parent: category.parent,
            order: category.order,
            created_at: OffsetDateTime::now_utc(),
        };
        state.categories.push(created.clone());
        Ok(created)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Category> {
        let state = self.state.read().await;
        match state.categories.iter().find(|c| c.id == id) {
            Some(category) => Ok(category.clone()),
            None => exn::bail!(ErrorKind::NotFound(format!("category {id}"))),
        }
    }

    async fn count_categories(&self) -> Result<u64> {
        Ok(self.state.read().await.categories.len() as u64)
    }

    async fn find_leaf_by_code(&self, code: &str) -> Result<Option<Leaf>> {
        Ok(self.state.read().await.leaves.iter().find(|l| l.code == code).cloned())
    }

    async fn create_leaf(&self, leaf: &NewLeaf) -> Result<Leaf> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.leaves.iter().find(|l| l.code == leaf.code) {
            return Ok(existing.clone());
        }
        if !state.categories.iter().any(|c| c.id == leaf.category) {
            exn::bail!(ErrorKind::Database);
        }
        let created = Leaf {
            id: LeafId(next_id(state.leaves.len())),
            code: leaf.code.clone(),
            name: leaf.name.clone(),
            difficulty: leaf.difficulty,
            category: leaf.category,
            created_at: OffsetDateTime::now_utc(),
        };
        state.leaves.push(created.clone());
        Ok(created)
    }

    async fn count_leaves(&self) -> Result<u64> {
        Ok(self.state.read().await.leaves.len() as u64)
    }

    async fn create_batch(&self, batch: &NewBatch) -> Result<Batch> {
        let mut state = self.state.write().await;
        let created = Batch {
            id: BatchId(next_id(state.batches.len())),
            name: batch.name.clone(),
            description: batch.description.clone(),
            status: BatchStatus::Processing,
            // Match the whole-second precision of the SQLite repository.
            started_at: batch.started_at.replace_nanosecond(0).unwrap_or(batch.started_at),
            completed_at: None,
            total_files: 0,
            processed_files: 0,
            succeeded_files: 0,
            failed_files: 0,
            error: None,
        };
        state.batches.push(created.clone());
        Ok(created)
    }

    async fn update_batch(&self, id: BatchId, outcome: &BatchOutcome) -> Result<Batch> {
        let mut state = self.state.write().await;
        if take(&mut state.failing_batch_updates) {
            exn::bail!(ErrorKind::Database);
        }
        let Some(batch) = state.batches.iter_mut().find(|b| b.id == id) else {
            exn::bail!(ErrorKind::NotFound(format!("batch {id}")));
        };
        if batch.status.is_terminal() {
            exn::bail!(ErrorKind::BatchFinalized(id.0));
        }
        batch.status = outcome.status;
        batch.completed_at = Some(outcome.completed_at);
        batch.total_files = outcome.total_files;
        batch.processed_files = outcome.processed_files;
        batch.succeeded_files = outcome.succeeded_files;
        batch.failed_files = outcome.failed_files;
        batch.error = outcome.error.clone();
        Ok(batch.clone())
    }

    async fn get_batch(&self, id: BatchId) -> Result<Batch> {
        let state = self.state.read().await;
        match state.batches.iter().find(|b| b.id == id) {
            Some(batch) => Ok(batch.clone()),
            None => exn::bail!(ErrorKind::NotFound(format!("batch {id}"))),
        }
    }

    async fn create_sample(&self, sample: &NewSample) -> Result<Sample> {
        let mut state = self.state.write().await;
        if take(&mut state.failing_sample_writes) {
            exn::bail!(ErrorKind::Database);
        }
        if !state.batches.iter().any(|b| b.id == sample.batch) || !state.leaves.iter().any(|l| l.id == sample.leaf) {
            exn::bail!(ErrorKind::Database);
        }
        let created = Sample {
            id: SampleId(next_id(state.samples.len())),
            file_path: sample.file_path.clone(),
            original_name: sample.original_name.clone(),
            file_size: sample.file_size,
            width: sample.width,
            height: sample.height,
            format: sample.format.clone(),
            kind: sample.kind,
            quality: sample.quality,
            source: sample.source,
            batch: sample.batch,
            leaf: sample.leaf,
            created_at: OffsetDateTime::now_utc(),
        };
        state.samples.push(created.clone());
        Ok(created)
    }

    async fn list_samples_for_batch(&self, batch: BatchId) -> Result<Vec<Sample>> {
        Ok(self.state.read().await.samples.iter().filter(|s| s.batch == batch).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;

    fn category(code: &str) -> NewCategory {
        NewCategory {
            code: code.to_string(),
            name: code.to_string(),
            parent: None,
            order: 0,
        }
    }

    #[tokio::test]
    async fn test_upserts_do_not_duplicate() {
        let catalog = MemoryCatalog::default();
        let vocales = catalog.category_or_create(&category("vocales")).await.unwrap();
        catalog.category_or_create(&category("vocales")).await.unwrap();
        let leaf = NewLeaf {
            code: "a".to_string(),
            name: "A".to_string(),
            difficulty: Difficulty::Basic,
            category: vocales.id,
        };
        let first = catalog.leaf_or_create(&leaf).await.unwrap();
        let again = catalog.leaf_or_create(&leaf).await.unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(catalog.count_categories().await.unwrap(), 1);
        assert_eq!(catalog.count_leaves().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_injected_category_failure() {
        let catalog = MemoryCatalog::default();
        catalog.fail_category_writes(1).await;
        assert!(catalog.create_category(&category("x")).await.is_err());
        assert!(catalog.create_category(&category("x")).await.is_ok());
    }

    #[tokio::test]
    async fn test_batch_finalized_once() {
        let catalog = MemoryCatalog::default();
        let batch = catalog
            .create_batch(&NewBatch {
                name: "n".into(),
                description: "d".into(),
                started_at: OffsetDateTime::now_utc(),
            })
            .await
            .unwrap();
        catalog.update_batch(batch.id, &BatchOutcome::completed(1, 0, OffsetDateTime::now_utc())).await.unwrap();
        let err = catalog
            .update_batch(batch.id, &BatchOutcome::failed("late", OffsetDateTime::now_utc()))
            .await
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::BatchFinalized(_)));
    }
}
