use super::{CategoryId, from_timestamp};
use crate::error::{Error, Result};
use time::OffsetDateTime;

/// A node of the taxonomy as recorded in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    /// Globally unique code
    pub code: String,
    pub name: String,
    /// `None` for top-level categories
    pub parent: Option<CategoryId>,
    pub order: i64,
    pub created_at: OffsetDateTime,
}

/// Category to be created on first encounter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub code: String,
    pub name: String,
    pub parent: Option<CategoryId>,
    pub order: i64,
}

#[derive(sqlx::FromRow)]
pub(crate) struct CategoryRow {
    pub(crate) id: i64,
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) parent_id: Option<i64>,
    pub(crate) sort_order: i64,
    pub(crate) created_at: i64,
}
impl TryFrom<CategoryRow> for Category {
    type Error = Error;
    fn try_from(row: CategoryRow) -> Result<Self> {
        Ok(Self {
            id: CategoryId(row.id),
            code: row.code,
            name: row.name,
            parent: row.parent_id.map(CategoryId),
            order: row.sort_order,
            created_at: from_timestamp(row.created_at, "category created_at")?,
        })
    }
}
