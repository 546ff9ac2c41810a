//! # Carbon Optimizer: Carbon-Aware Algorithm Benchmarking
//!
//! **Version**: 0.1.0
//!
//! Measures interchangeable algorithm implementations (sorting, searching,
//! recursion) over reproducible inputs, converts the measurements into
//! energy and carbon estimates, and selects the greenest implementation under
//! a tunable carbon/runtime trade-off.
//!
//! ## Data Flow
//!
//! ```text
//! dataset::generate ─► Profiler ─► ExperimentRunner ─► EnergyModel ─► CarbonConverter
//!                                          │
//!                                          ▼
//!                                    ResultStore ─► export (Parquet) ─► predictor
//!                                          │
//!                                          ▼
//!                                  selector::select ─► best algorithm + explanation
//! ```
//!
//! ## Design Principles
//!
//! - **Reproducibility**: inputs are a pure function of `(category, size, seed)`
//! - **Isolation**: a failing algorithm costs one cell, never the whole run
//! - **Graceful degradation**: live carbon intensity falls back to a static default
//! - **Determinism**: selection ties resolve to the earliest candidate
//!
//! ## Example Usage
//!
//! ```rust
//! use carbon_optimizer::{select_best, CandidateMetric};
//!
//! let candidates = vec![
//!     CandidateMetric::new("merge_sort", 0.012, 0.004),
//!     CandidateMetric::new("bubble_sort", 0.950, 0.310),
//! ];
//! let result = select_best(&candidates, None, None)?;
//! assert_eq!(result.best_algorithm(), "merge_sort");
//! # Ok::<(), carbon_optimizer::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod algorithms;
pub mod carbon;
pub mod config;
pub mod dataset;
pub mod energy;
pub mod error;
pub mod experiment;
pub mod export;
pub mod pipeline;
pub mod predictor;
pub mod profiler;
pub mod selector;

pub use algorithms::{Algorithm, AlgorithmCategory, AlgorithmRegistry};
pub use carbon::CarbonConverter;
pub use config::OptimizerConfig;
pub use error::{Error, Result};
pub use experiment::{AggregatedRecord, BenchmarkReport, ExperimentRunner, ResultStore};
pub use selector::{CandidateMetric, SelectionResult};

use config::{DEFAULT_ALPHA, DEFAULT_BETA};

/// Run the full benchmark matrix described by `config`.
///
/// Records are keyed category → algorithm → size in the report's
/// [`ResultStore`]. Failed cells are listed in the report, not returned as
/// errors.
///
/// # Errors
/// Returns `InvalidConfig` if `config` does not validate, `Sampling` if the
/// current process cannot be profiled.
pub fn run_benchmarks(config: &OptimizerConfig) -> Result<BenchmarkReport> {
    let converter = CarbonConverter::new(config.carbon);
    Ok(ExperimentRunner::new(config, &converter)?.run())
}

/// Select the greenest candidate; weights default to 0.5/0.5.
///
/// # Errors
/// See [`selector::rank`].
pub fn select_best(
    candidates: &[CandidateMetric],
    alpha: Option<f64>,
    beta: Option<f64>,
) -> Result<SelectionResult> {
    selector::select(
        candidates,
        alpha.unwrap_or(DEFAULT_ALPHA),
        beta.unwrap_or(DEFAULT_BETA),
    )
}
