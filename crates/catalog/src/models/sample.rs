use super::{BatchId, LeafId, SampleId, from_timestamp, text_enum, to_count};
use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use time::OffsetDateTime;

text_enum!(
    SampleKind {
        Image => "IMAGE",
    }
);

text_enum!(
    /// Review state of a sample. Imports always start out pending.
    Quality {
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
    }
);

text_enum!(
    /// Where a sample came from.
    SampleSource {
        /// Bulk import from the remote store
        Batch => "BATCH",
        /// Captured directly by a contributor
        Capture => "CAPTURE",
    }
);

/// One accepted image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub id: SampleId,
    /// Location of the local copy, including the dataset root
    pub file_path: String,
    pub original_name: String,
    pub file_size: u64,
    pub width: u32,
    pub height: u32,
    /// Lower-case file extension
    pub format: String,
    pub kind: SampleKind,
    pub quality: Quality,
    pub source: SampleSource,
    pub batch: BatchId,
    pub leaf: LeafId,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSample {
    /// Resolved path of the stored file, so readers need not know the
    /// dataset root.
    pub file_path: String,
    pub original_name: String,
    pub file_size: u64,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub kind: SampleKind,
    pub quality: Quality,
    pub source: SampleSource,
    pub batch: BatchId,
    pub leaf: LeafId,
}

#[derive(sqlx::FromRow)]
pub(crate) struct SampleRow {
    pub(crate) id: i64,
    pub(crate) file_path: String,
    pub(crate) original_name: String,
    pub(crate) file_size: i64,
    pub(crate) width: i64,
    pub(crate) height: i64,
    pub(crate) format: String,
    pub(crate) kind: String,
    pub(crate) quality: String,
    pub(crate) source: String,
    pub(crate) batch_id: i64,
    pub(crate) leaf_id: i64,
    pub(crate) created_at: i64,
}
impl TryFrom<SampleRow> for Sample {
    type Error = Error;
    fn try_from(row: SampleRow) -> Result<Self> {
        Ok(Self {
            id: SampleId(row.id),
            file_path: row.file_path,
            original_name: row.original_name,
            file_size: to_count(row.file_size, "sample file_size")?,
            width: u32::try_from(row.width).or_raise(|| ErrorKind::InvalidData("sample width"))?,
            height: u32::try_from(row.height).or_raise(|| ErrorKind::InvalidData("sample height"))?,
            format: row.format,
            kind: row.kind.parse()?,
            quality: row.quality.parse()?,
            source: row.source.parse()?,
            batch: BatchId(row.batch_id),
            leaf: LeafId(row.leaf_id),
            created_at: from_timestamp(row.created_at, "sample created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> SampleRow {
        SampleRow {
            id: 1,
            file_path: "alfabeto/vocales/a/1700000000000_a.png".to_string(),
            original_name: "a.png".to_string(),
            file_size: 2048,
            width: 640,
            height: 480,
            format: "png".to_string(),
            kind: "IMAGE".to_string(),
            quality: "PENDING".to_string(),
            source: "BATCH".to_string(),
            batch_id: 2,
            leaf_id: 3,
            created_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_row_to_model() {
        let sample = Sample::try_from(row()).unwrap();
        assert_eq!(sample.kind, SampleKind::Image);
        assert_eq!(sample.quality, Quality::Pending);
        assert_eq!(sample.source, SampleSource::Batch);
        assert_eq!((sample.width, sample.height), (640, 480));
    }

    #[test]
    fn test_negative_dimensions_rejected() {
        let mut bad = row();
        bad.width = -1;
        let err = Sample::try_from(bad).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData("sample width")));
    }
}
