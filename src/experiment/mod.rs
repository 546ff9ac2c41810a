//! Benchmark experiments
//!
//! Data structures and the runner for the benchmark matrix.
//!
//! ## Schema Overview
//!
//! ```text
//! BenchmarkReport (1) ──< AggregatedRecord (N) [ResultStore]
//!        │                       │
//!        │                       └──< RunSample (num_runs)
//!        └──< CellFailure (N)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use carbon_optimizer::carbon::CarbonConverter;
//! use carbon_optimizer::config::OptimizerConfig;
//! use carbon_optimizer::experiment::ExperimentRunner;
//!
//! let config = OptimizerConfig::default();
//! let converter = CarbonConverter::new(config.carbon);
//! let report = ExperimentRunner::new(&config, &converter)?.run();
//!
//! for record in report.store().records() {
//!     println!("{} @ {}: {:.6} gCO2", record.algorithm(), record.size(), record.carbon_gco2());
//! }
//! # Ok::<(), carbon_optimizer::Error>(())
//! ```

mod aggregated_record;
mod report;
mod run_sample;
mod runner;
mod store;

pub use aggregated_record::{AggregatedRecord, Averages};
pub use report::{BenchmarkReport, CellFailure};
pub use run_sample::RunSample;
pub use runner::ExperimentRunner;
pub use store::ResultStore;
