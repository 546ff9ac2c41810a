//! Result Store - aggregated records keyed by category, algorithm, and size
//!
//! Records keep their insertion order (the order the runner produced them),
//! which is also the order candidates are handed to the selector.

use super::AggregatedRecord;
use crate::algorithms::AlgorithmCategory;
use crate::selector::CandidateMetric;
use crate::{Error, Result};
use serde_json::{Map, Value};

/// In-memory collection of aggregated records.
///
/// ## Raw layout
///
/// [`ResultStore::to_raw_json`] nests records the way the persisted raw
/// results are laid out, with sizes as string keys:
///
/// ```text
/// { "sorting": { "merge_sort": { "1000": { avg_time, avg_cpu, ... } } } }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultStore {
    records: Vec<AggregatedRecord>,
}

impl ResultStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Add a record, replacing any record for the same cell.
    pub fn insert(&mut self, record: AggregatedRecord) {
        let existing = self.records.iter_mut().find(|r| {
            r.category() == record.category()
                && r.algorithm() == record.algorithm()
                && r.size() == record.size()
        });
        match existing {
            Some(slot) => *slot = record,
            None => self.records.push(record),
        }
    }

    /// Get the record of one cell.
    #[must_use]
    pub fn get(
        &self,
        category: AlgorithmCategory,
        algorithm: &str,
        size: usize,
    ) -> Option<&AggregatedRecord> {
        self.records.iter().find(|r| {
            r.category() == category && r.algorithm() == algorithm && r.size() == size
        })
    }

    /// All records, in insertion order.
    #[must_use]
    pub fn records(&self) -> &[AggregatedRecord] {
        &self.records
    }

    /// Records of one category, in insertion order.
    pub fn for_category(
        &self,
        category: AlgorithmCategory,
    ) -> impl Iterator<Item = &AggregatedRecord> + '_ {
        self.records.iter().filter(move |r| r.category() == category)
    }

    /// Distinct sizes recorded for a category, ascending.
    #[must_use]
    pub fn sizes(&self, category: AlgorithmCategory) -> Vec<usize> {
        let mut sizes: Vec<usize> = self.for_category(category).map(AggregatedRecord::size).collect();
        sizes.sort_unstable();
        sizes.dedup();
        sizes
    }

    /// Largest size recorded for a category.
    #[must_use]
    pub fn largest_size(&self, category: AlgorithmCategory) -> Option<usize> {
        self.for_category(category).map(AggregatedRecord::size).max()
    }

    /// Selector candidates for one (category, size), in insertion order.
    #[must_use]
    pub fn candidates_for(&self, category: AlgorithmCategory, size: usize) -> Vec<CandidateMetric> {
        self.for_category(category)
            .filter(|r| r.size() == size)
            .map(AggregatedRecord::to_candidate)
            .collect()
    }

    /// Nested raw layout: category → algorithm → size (string) → record.
    ///
    /// # Errors
    /// Returns `Json` if a record cannot be serialized.
    pub fn to_raw_json(&self) -> Result<Value> {
        let mut root = Map::new();
        for record in &self.records {
            let by_algorithm = root
                .entry(record.category().as_str())
                .or_insert_with(|| Value::Object(Map::new()));
            let by_size = as_object(by_algorithm)?
                .entry(record.algorithm())
                .or_insert_with(|| Value::Object(Map::new()));
            as_object(by_size)?.insert(record.size().to_string(), serde_json::to_value(record)?);
        }
        Ok(Value::Object(root))
    }

    /// Rebuild a store from the nested raw layout.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the document is not three levels of objects,
    /// `Json` if a leaf is not a valid record.
    pub fn from_raw_json(value: &Value) -> Result<Self> {
        let mut store = Self::new();
        for by_algorithm in objects(value)?.values() {
            for by_size in objects(by_algorithm)?.values() {
                for leaf in objects(by_size)?.values() {
                    store.insert(serde_json::from_value(leaf.clone())?);
                }
            }
        }
        Ok(store)
    }
}

fn as_object(value: &mut Value) -> Result<&mut Map<String, Value>> {
    value
        .as_object_mut()
        .ok_or_else(|| Error::InvalidInput("raw layout node is not an object".to_string()))
}

fn objects(value: &Value) -> Result<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::InvalidInput("raw layout node is not an object".to_string()))
}
