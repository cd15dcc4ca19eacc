use crate::error::Result;
use crate::models::{
    Batch, BatchId, BatchOutcome, Category, CategoryId, Leaf, NewBatch, NewCategory, NewLeaf, NewSample, Sample,
};
use async_trait::async_trait;
use std::sync::Arc;

pub type CatalogHandle = Arc<dyn Catalog>;

/// Key-based persistence the import pipeline needs.
///
/// Every method is individually atomic. Categories and leaves are unique by
/// code and never updated once created; a batch is created once and
/// finalized once; samples are only ever inserted.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn find_category_by_code(&self, code: &str) -> Result<Option<Category>>;

    /// Insert a category, or return the existing one with the same code.
    async fn create_category(&self, category: &NewCategory) -> Result<Category>;

    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) for unknown ids.
    async fn get_category(&self, id: CategoryId) -> Result<Category>;

    async fn count_categories(&self) -> Result<u64>;

    async fn find_leaf_by_code(&self, code: &str) -> Result<Option<Leaf>>;

    /// Insert a leaf, or return the existing one with the same code.
    async fn create_leaf(&self, leaf: &NewLeaf) -> Result<Leaf>;

    async fn count_leaves(&self) -> Result<u64>;

    /// Open a batch in the PROCESSING state.
    async fn create_batch(&self, batch: &NewBatch) -> Result<Batch>;

    /// Move a PROCESSING batch to its terminal state.
    ///
    /// Returns [`BatchFinalized`](crate::error::ErrorKind::BatchFinalized)
    /// if the batch already left PROCESSING.
    async fn update_batch(&self, id: BatchId, outcome: &BatchOutcome) -> Result<Batch>;

    async fn get_batch(&self, id: BatchId) -> Result<Batch>;

    async fn create_sample(&self, sample: &NewSample) -> Result<Sample>;

    async fn list_samples_for_batch(&self, batch: BatchId) -> Result<Vec<Sample>>;

    /// Fetch a category by code, creating it on first encounter.
    ///
    /// Idempotent: re-running an import never duplicates categories.
    async fn category_or_create(&self, category: &NewCategory) -> Result<Category> {
        match self.find_category_by_code(&category.code).await? {
            Some(existing) => Ok(existing),
            None => self.create_category(category).await,
        }
    }

    /// Fetch a leaf by code, creating it on first encounter.
    async fn leaf_or_create(&self, leaf: &NewLeaf) -> Result<Leaf> {
        match self.find_leaf_by_code(&leaf.code).await? {
            Some(existing) => Ok(existing),
            None => self.create_leaf(leaf).await,
        }
    }
}
