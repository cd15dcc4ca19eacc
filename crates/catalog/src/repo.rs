//! SQLite-backed [`Catalog`].

use crate::Database;
use crate::catalog::Catalog;
use crate::error::{ErrorKind, Result};
use crate::models::{
    Batch, BatchId, BatchOutcome, BatchRow, Category, CategoryId, CategoryRow, Leaf, LeafRow, NewBatch, NewCategory,
    NewLeaf, NewSample, Sample, SampleRow, from_count, to_count,
};
use async_trait::async_trait;
use exn::ResultExt;
use sqlx::SqlitePool;
use time::OffsetDateTime;

/// Repository for every catalog entity.
///
/// # Relationships
///
/// - Categories may reference a parent category (created before the child)
/// - Every leaf belongs to exactly one category
/// - Every sample belongs to exactly one leaf and one batch
/// - Deleting a batch cascades to its samples
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn now() -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }
}

#[async_trait]
impl Catalog for Repository {
    // =========================================================================
    // Categories
    // =========================================================================

    async fn find_category_by_code(&self, code: &str) -> Result<Option<Category>> {
        let row: Option<CategoryRow> = sqlx::query_as(include_str!("../queries/find_category_by_code.sql"))
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Category::try_from).transpose()
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category> {
        let row: CategoryRow = sqlx::query_as(include_str!("../queries/upsert_category.sql"))
            .bind(&category.code)
            .bind(&category.name)
            .bind(category.parent.map(|parent| parent.0))
            .bind(category.order)
            .bind(Self::now())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tracing::debug!(code = %category.code, id = row.id, "Stored category");
        row.try_into()
    }

    async fn get_category(&self, id: CategoryId) -> Result<Category> {
        let row: Option<CategoryRow> = sqlx::query_as(include_str!("../queries/get_category.sql"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        match row {
            Some(row) => row.try_into(),
            None => exn::bail!(ErrorKind::NotFound(format!("category {id}"))),
        }
    }

    async fn count_categories(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_categories.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        to_count(count, "category count")
    }

    // =========================================================================
    // Leaves
    // =========================================================================

    async fn find_leaf_by_code(&self, code: &str) -> Result<Option<Leaf>> {
        let row: Option<LeafRow> = sqlx::query_as(include_str!("../queries/find_leaf_by_code.sql"))
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Leaf::try_from).transpose()
    }

    async fn create_leaf(&self, leaf: &NewLeaf) -> Result<Leaf> {
        let row: LeafRow = sqlx::query_as(include_str!("../queries/upsert_leaf.sql"))
            .bind(&leaf.code)
            .bind(&leaf.name)
            .bind(leaf.difficulty.as_str())
            .bind(leaf.category.0)
            .bind(Self::now())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tracing::debug!(code = %leaf.code, id = row.id, "Stored leaf");
        row.try_into()
    }

    async fn count_leaves(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_leaves.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        to_count(count, "leaf count")
    }

    // =========================================================================
    // Batches
    // =========================================================================

    async fn create_batch(&self, batch: &NewBatch) -> Result<Batch> {
        let row: BatchRow = sqlx::query_as(include_str!("../queries/insert_batch.sql"))
            .bind(&batch.name)
            .bind(&batch.description)
            .bind(batch.started_at.unix_timestamp())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.try_into()
    }

    async fn update_batch(&self, id: BatchId, outcome: &BatchOutcome) -> Result<Batch> {
        let row: Option<BatchRow> = sqlx::query_as(include_str!("../queries/finalize_batch.sql"))
            .bind(outcome.status.as_str())
            .bind(outcome.completed_at.unix_timestamp())
            .bind(from_count(outcome.total_files, "batch total_files")?)
            .bind(from_count(outcome.processed_files, "batch processed_files")?)
            .bind(from_count(outcome.succeeded_files, "batch succeeded_files")?)
            .bind(from_count(outcome.failed_files, "batch failed_files")?)
            .bind(outcome.error.as_deref())
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        match row {
            Some(row) => row.try_into(),
            // Distinguish "already terminal" from "never existed".
            None => {
                self.get_batch(id).await?;
                exn::bail!(ErrorKind::BatchFinalized(id.0))
            },
        }
    }

    async fn get_batch(&self, id: BatchId) -> Result<Batch> {
        let row: Option<BatchRow> = sqlx::query_as(include_str!("../queries/get_batch.sql"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        match row {
            Some(row) => row.try_into(),
            None => exn::bail!(ErrorKind::NotFound(format!("batch {id}"))),
        }
    }

    // =========================================================================
    // Samples
    // =========================================================================

    async fn create_sample(&self, sample: &NewSample) -> Result<Sample> {
        let row: SampleRow = sqlx::query_as(include_str!("../queries/insert_sample.sql"))
            .bind(&sample.file_path)
            .bind(&sample.original_name)
            .bind(from_count(sample.file_size, "sample file_size")?)
            .bind(i64::from(sample.width))
            .bind(i64::from(sample.height))
            .bind(&sample.format)
            .bind(sample.kind.as_str())
            .bind(sample.quality.as_str())
            .bind(sample.source.as_str())
            .bind(sample.batch.0)
            .bind(sample.leaf.0)
            .bind(Self::now())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.try_into()
    }

    async fn list_samples_for_batch(&self, batch: BatchId) -> Result<Vec<Sample>> {
        let rows: Vec<SampleRow> = sqlx::query_as(include_str!("../queries/list_samples_for_batch.sql"))
            .bind(batch.0)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Sample::try_from).collect()
    }
}
