//! The compiled sign taxonomy.
//!
//! Categories are matched against remote folders by display name; leaves
//! (individual signs) are matched by their code. The tree is static and
//! walked in declaration order.

use senas_catalog::Difficulty;

/// A category of the taxonomy, with optional sub-categories and leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxonomyNode {
    /// Display name, also the name of the matching remote folder.
    pub name: &'static str,
    /// Unique code, also the local directory name.
    pub code: &'static str,
    /// Explicit sort order; siblings without one use their position.
    pub order: Option<i64>,
    /// Difficulty of this node's leaves; [`Difficulty::Basic`] when unset.
    pub difficulty: Option<Difficulty>,
    pub children: &'static [TaxonomyNode],
    /// Leaf codes, matched against remote folder names as written.
    pub leaves: &'static [&'static str],
}

impl TaxonomyNode {
    pub const fn new(name: &'static str, code: &'static str) -> Self {
        Self {
            name,
            code,
            order: None,
            difficulty: None,
            children: &[],
            leaves: &[],
        }
    }

    /// Sort order for the node at `index` among its siblings.
    pub fn order_at(&self, index: usize) -> i64 {
        self.order.unwrap_or_else(|| i64::try_from(index).unwrap_or(i64::MAX))
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty.unwrap_or(Difficulty::Basic)
    }

    /// Number of leaves in this node and every node below it.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len() + self.children.iter().map(TaxonomyNode::leaf_count).sum::<usize>()
    }
}

const VOWELS: &[&str] = &["a", "e", "i", "o", "u"];
const CONSONANTS: &[&str] = &[
    "b", "c", "d", "f", "g", "h", "j", "k", "l", "m", "n", "ñ", "p", "q", "r", "s", "t", "v", "w", "x", "y", "z",
];

/// The full dataset taxonomy.
pub static DATASET: &[TaxonomyNode] = &[
    TaxonomyNode {
        order: Some(1),
        children: &[
            TaxonomyNode {
                order: Some(1),
                difficulty: Some(Difficulty::Basic),
                leaves: VOWELS,
                ..TaxonomyNode::new("Vocales", "vocales")
            },
            TaxonomyNode {
                order: Some(2),
                difficulty: Some(Difficulty::Basic),
                leaves: CONSONANTS,
                ..TaxonomyNode::new("Consonantes", "consonantes")
            },
        ],
        ..TaxonomyNode::new("Alfabeto", "alfabeto")
    },
    TaxonomyNode {
        order: Some(2),
        children: &[
            TaxonomyNode {
                difficulty: Some(Difficulty::Intermediate),
                leaves: &["hola", "adios", "buenos-dias", "buenas-tardes", "buenas-noches"],
                ..TaxonomyNode::new("Saludos", "saludos")
            },
            TaxonomyNode {
                difficulty: Some(Difficulty::Intermediate),
                leaves: &["gracias", "por-favor", "perdon", "disculpa"],
                ..TaxonomyNode::new("Cortesía", "cortesia")
            },
        ],
        ..TaxonomyNode::new("Palabras", "palabras")
    },
    TaxonomyNode {
        order: Some(3),
        difficulty: Some(Difficulty::Advanced),
        leaves: &["como-estas", "me-llamo", "mucho-gusto", "de-nada"],
        ..TaxonomyNode::new("Frases", "frases")
    },
];
