//! Benchmark Report - outcome of one experiment run

use super::ResultStore;
use crate::algorithms::AlgorithmCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A (category, algorithm, size) cell that produced no record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellFailure {
    category: AlgorithmCategory,
    algorithm: String,
    size: usize,
    reason: String,
}

impl CellFailure {
    /// Create a failure entry.
    #[must_use]
    pub fn new(
        category: AlgorithmCategory,
        algorithm: impl Into<String>,
        size: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            category,
            algorithm: algorithm.into(),
            size,
            reason: reason.into(),
        }
    }

    /// Get the category.
    #[must_use]
    pub const fn category(&self) -> AlgorithmCategory {
        self.category
    }

    /// Get the algorithm name.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Get the dataset size.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Get the failure description.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Results of a full benchmark matrix.
///
/// `started_at`/`ended_at` bracket the whole run; `config` is a snapshot of
/// the configuration the run was started with.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkReport {
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    config: serde_json::Value,
    store: ResultStore,
    failures: Vec<CellFailure>,
}

impl BenchmarkReport {
    /// Assemble a report.
    #[must_use]
    pub const fn new(
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        config: serde_json::Value,
        store: ResultStore,
        failures: Vec<CellFailure>,
    ) -> Self {
        Self {
            started_at,
            ended_at,
            config,
            store,
            failures,
        }
    }

    /// Get the start timestamp.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Get the end timestamp.
    #[must_use]
    pub const fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }

    /// Get the wall-clock duration of the run.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.ended_at - self.started_at
    }

    /// Get the configuration snapshot.
    #[must_use]
    pub const fn config(&self) -> &serde_json::Value {
        &self.config
    }

    /// Get the aggregated records.
    #[must_use]
    pub const fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Consume the report, keeping the records.
    #[must_use]
    pub fn into_store(self) -> ResultStore {
        self.store
    }

    /// Get the failed cells.
    #[must_use]
    pub fn failures(&self) -> &[CellFailure] {
        &self.failures
    }

    /// Check if every cell produced a record.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_failure_accessors() {
        let failure = CellFailure::new(AlgorithmCategory::Sorting, "flaky_sort", 10, "boom");
        assert_eq!(failure.category(), AlgorithmCategory::Sorting);
        assert_eq!(failure.algorithm(), "flaky_sort");
        assert_eq!(failure.size(), 10);
        assert_eq!(failure.reason(), "boom");
    }

    #[test]
    fn test_report_completeness() {
        let now = Utc::now();
        let report = BenchmarkReport::new(
            now,
            now,
            serde_json::json!({}),
            ResultStore::new(),
            vec![],
        );
        assert!(report.is_complete());
        assert_eq!(report.duration(), chrono::Duration::zero());

        let failed = BenchmarkReport::new(
            now,
            now,
            serde_json::json!({}),
            ResultStore::new(),
            vec![CellFailure::new(AlgorithmCategory::Recursion, "x", 1, "panic")],
        );
        assert!(!failed.is_complete());
        assert_eq!(failed.failures().len(), 1);
    }
}
