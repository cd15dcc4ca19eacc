use super::{BatchId, from_timestamp, text_enum, to_count};
use crate::error::{Error, Result};
use time::OffsetDateTime;

text_enum!(
    /// Lifecycle of an import batch. Leaves `Processing` exactly once.
    BatchStatus {
        Processing => "PROCESSING",
        Completed => "COMPLETED",
        Failed => "FAILED",
    }
);
impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing)
    }
}

/// One import run ("lote").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub id: BatchId,
    pub name: String,
    pub description: String,
    pub status: BatchStatus,
    pub started_at: OffsetDateTime,
    pub completed_at: Option<OffsetDateTime>,
    pub total_files: u64,
    pub processed_files: u64,
    pub succeeded_files: u64,
    pub failed_files: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBatch {
    pub name: String,
    pub description: String,
    pub started_at: OffsetDateTime,
}

/// Final state written to a batch when its run ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub status: BatchStatus,
    pub completed_at: OffsetDateTime,
    pub total_files: u64,
    pub processed_files: u64,
    pub succeeded_files: u64,
    pub failed_files: u64,
    pub error: Option<String>,
}
impl BatchOutcome {
    /// The walk finished, however many individual files failed.
    ///
    /// Every file that was attempted counts as processed.
    pub fn completed(succeeded: u64, failed: u64, completed_at: OffsetDateTime) -> Self {
        let total = succeeded.saturating_add(failed);
        Self {
            status: BatchStatus::Completed,
            completed_at,
            total_files: total,
            processed_files: total,
            succeeded_files: succeeded,
            failed_files: failed,
            error: None,
        }
    }

    /// The run aborted before the walk could finish.
    pub fn failed(message: impl Into<String>, completed_at: OffsetDateTime) -> Self {
        Self {
            status: BatchStatus::Failed,
            completed_at,
            total_files: 0,
            processed_files: 0,
            succeeded_files: 0,
            failed_files: 1,
            error: Some(message.into()),
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BatchRow {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) status: String,
    pub(crate) started_at: i64,
    pub(crate) completed_at: Option<i64>,
    pub(crate) total_files: i64,
    pub(crate) processed_files: i64,
    pub(crate) succeeded_files: i64,
    pub(crate) failed_files: i64,
    pub(crate) error: Option<String>,
}
impl TryFrom<BatchRow> for Batch {
    type Error = Error;
    fn try_from(row: BatchRow) -> Result<Self> {
        Ok(Self {
            id: BatchId(row.id),
            name: row.name,
            description: row.description,
            status: row.status.parse()?,
            started_at: from_timestamp(row.started_at, "batch started_at")?,
            completed_at: row.completed_at.map(|ts| from_timestamp(ts, "batch completed_at")).transpose()?,
            total_files: to_count(row.total_files, "batch total_files")?,
            processed_files: to_count(row.processed_files, "batch processed_files")?,
            succeeded_files: to_count(row.succeeded_files, "batch succeeded_files")?,
            failed_files: to_count(row.failed_files, "batch failed_files")?,
            error: row.error,
        })
    }
}
