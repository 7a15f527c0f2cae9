//! In-memory fuzzy index over medicine records

use std::cmp::Ordering;

use super::fuzzy::match_score_within;
use super::{FieldWeights, SearchConfig};
use crate::types::{padded_code, MedicineRecord};

/// Lowercased searchable text of one record
#[derive(Debug, Clone)]
struct IndexEntry {
    name: String,
    substance: String,
    code: String,
    holder: String,
}

/// A ranked match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Position of the record in the collection the index was built from
    pub position: usize,
    /// Combined score, 0 = perfect
    pub score: f64,
}

/// Fuzzy search index, built once per data load
#[derive(Debug, Clone)]
pub struct SearchIndex {
    entries: Vec<IndexEntry>,
    config: SearchConfig,
    weights: FieldWeights,
}

impl SearchIndex {
    /// Build an index over `records` in their current order
    pub fn build(records: &[MedicineRecord], config: SearchConfig) -> Self {
        let entries = records
            .iter()
            .map(|m| IndexEntry {
                name: m.name.to_lowercase(),
                substance: m.substance.as_deref().unwrap_or_default().to_lowercase(),
                // padded so both "254045" and "0254045" hit exactly
                code: padded_code(&m.sukl_code),
                holder: m.holder.as_deref().unwrap_or_default().to_lowercase(),
            })
            .collect();

        let weights = config.weights.normalized();
        Self {
            entries,
            config,
            weights,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return up to `limit` hits, best first. Never fails: an unusable query
    /// simply matches nothing.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let pattern = query.trim().to_lowercase();
        let pattern_chars: Vec<char> = pattern.chars().collect();
        if limit == 0 || pattern_chars.len() < self.config.min_query_len {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(position, entry)| {
                self.score_entry(entry, &pattern, &pattern_chars)
                    .map(|score| SearchHit { position, score })
            })
            .collect();

        hits.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        hits.truncate(limit);
        hits
    }

    /// Product of per-field scores raised to the field weight, over the fields
    /// within threshold. `None` when no field matches.
    fn score_entry(&self, entry: &IndexEntry, pattern: &str, chars: &[char]) -> Option<f64> {
        let fields = [
            (entry.name.as_str(), self.weights.name),
            (entry.substance.as_str(), self.weights.substance),
            (entry.code.as_str(), self.weights.code),
            (entry.holder.as_str(), self.weights.holder),
        ];

        let mut total = 1.0;
        let mut matched = false;
        for (text, weight) in fields {
            if text.is_empty() || weight <= 0.0 {
                continue;
            }
            if let Some(score) = match_score_within(pattern, chars, text, self.config.threshold) {
                matched = true;
                total *= score.max(f64::EPSILON).powf(weight);
            }
        }

        matched.then_some(total)
    }
}
