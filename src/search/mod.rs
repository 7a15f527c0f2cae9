//! Medicine search
//!
//! Implements:
//! - Typo-tolerant substring matching (fuzzy)
//! - Field-weighted ranking over name, substance, code and holder

mod fuzzy;
mod index;

pub use fuzzy::*;
pub use index::*;

/// Relative importance of each indexed field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldWeights {
    pub name: f64,
    pub substance: f64,
    pub code: f64,
    pub holder: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            name: 0.4,
            substance: 0.3,
            code: 0.2,
            holder: 0.1,
        }
    }
}

impl FieldWeights {
    /// Weights rescaled to sum to 1
    pub fn normalized(&self) -> Self {
        let total = self.name + self.substance + self.code + self.holder;
        if total <= 0.0 {
            return Self::default();
        }
        Self {
            name: self.name / total,
            substance: self.substance / total,
            code: self.code / total,
            holder: self.holder / total,
        }
    }
}

/// Configuration for the search index
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum normalized distance (0 = identical, 1 = unrelated) for a field
    /// to count as a match
    pub threshold: f64,
    /// Queries shorter than this (in chars, after trimming) match nothing
    pub min_query_len: usize,
    pub weights: FieldWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            min_query_len: 2,
            weights: FieldWeights::default(),
        }
    }
}
