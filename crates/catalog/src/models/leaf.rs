use super::{CategoryId, LeafId, from_timestamp, text_enum};
use crate::error::{Error, Result};
use time::OffsetDateTime;

text_enum!(
    /// How hard a sign is to learn; drives curriculum ordering.
    Difficulty {
        Basic => "BASIC",
        Intermediate => "INTERMEDIATE",
        Advanced => "ADVANCED",
    }
);

/// A single sign ("seña"): the unit images are collected for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub id: LeafId,
    /// Globally unique, lower-case code
    pub code: String,
    pub name: String,
    pub difficulty: Difficulty,
    pub category: CategoryId,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLeaf {
    pub code: String,
    pub name: String,
    pub difficulty: Difficulty,
    pub category: CategoryId,
}

#[derive(sqlx::FromRow)]
pub(crate) struct LeafRow {
    pub(crate) id: i64,
    pub(crate) code: String,
    pub(crate) name: String,
    pub(crate) difficulty: String,
    pub(crate) category_id: i64,
    pub(crate) created_at: i64,
}
impl TryFrom<LeafRow> for Leaf {
    type Error = Error;
    fn try_from(row: LeafRow) -> Result<Self> {
        Ok(Self {
            id: LeafId(row.id),
            code: row.code,
            name: row.name,
            difficulty: row.difficulty.parse()?,
            category: CategoryId(row.category_id),
            created_at: from_timestamp(row.created_at, "leaf created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rstest::rstest;

    #[rstest]
    #[case(Difficulty::Basic, "BASIC")]
    #[case(Difficulty::Intermediate, "INTERMEDIATE")]
    #[case(Difficulty::Advanced, "ADVANCED")]
    fn test_difficulty_text(#[case] difficulty: Difficulty, #[case] text: &str) {
        assert_eq!(difficulty.to_string(), text);
        assert_eq!(text.parse::<Difficulty>().unwrap(), difficulty);
    }

    #[test]
    fn test_unknown_difficulty() {
        let err = "basic".parse::<Difficulty>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData("Difficulty")));
    }

    #[test]
    fn test_row_to_model() {
        let row = LeafRow {
            id: 7,
            code: "hola".to_string(),
            name: "HOLA".to_string(),
            difficulty: "INTERMEDIATE".to_string(),
            category_id: 3,
            created_at: 1_700_000_000,
        };
        let leaf = Leaf::try_from(row).unwrap();
        assert_eq!(leaf.id, LeafId(7));
        assert_eq!(leaf.difficulty, Difficulty::Intermediate);
        assert_eq!(leaf.category, CategoryId(3));
        assert_eq!(leaf.created_at.unix_timestamp(), 1_700_000_000);
    }
}
