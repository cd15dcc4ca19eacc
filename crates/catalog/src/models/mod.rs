//! Catalog entities and their database row representations.
//!
//! Public types are what callers work with; the `*Row` types mirror table
//! columns one-to-one and only live inside this crate.

mod batch;
mod category;
mod leaf;
mod sample;

pub use self::batch::{Batch, BatchOutcome, BatchStatus, NewBatch};
pub(crate) use self::batch::BatchRow;
pub use self::category::{Category, NewCategory};
pub(crate) use self::category::CategoryRow;
pub use self::leaf::{Difficulty, Leaf, NewLeaf};
pub(crate) use self::leaf::LeafRow;
pub use self::sample::{NewSample, Quality, Sample, SampleKind, SampleSource};
pub(crate) use self::sample::SampleRow;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use time::OffsetDateTime;

/// Enums persisted as upper-case text columns.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }
        impl $name {
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
        impl std::str::FromStr for $name {
            type Err = crate::error::Error;
            fn from_str(s: &str) -> crate::error::Result<Self> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => exn::bail!(crate::error::ErrorKind::InvalidData(stringify!($name))),
                }
            }
        }
    };
}
pub(crate) use text_enum;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
        pub struct $name(pub i64);
    };
}

id_type!(
    /// Primary key of a [`Category`].
    CategoryId
);
id_type!(
    /// Primary key of a [`Leaf`].
    LeafId
);
id_type!(
    /// Primary key of a [`Batch`].
    BatchId
);
id_type!(
    /// Primary key of a [`Sample`].
    SampleId
);

/// Timestamps are stored as whole Unix seconds.
pub(crate) fn from_timestamp(seconds: i64, column: &'static str) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(seconds).or_raise(|| ErrorKind::InvalidData(column))
}

pub(crate) fn to_count(value: i64, column: &'static str) -> Result<u64> {
    u64::try_from(value).or_raise(|| ErrorKind::InvalidData(column))
}

pub(crate) fn from_count(value: u64, column: &'static str) -> Result<i64> {
    i64::try_from(value).or_raise(|| ErrorKind::InvalidData(column))
}
