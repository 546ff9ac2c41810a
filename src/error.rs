//! Error types for carbon-optimizer
//!
//! Clear error messages with actionable guidance. Configuration errors are
//! fatal to the call that raised them; provider errors are produced internally
//! and always recovered by the carbon converter.

use std::time::Duration;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// carbon-optimizer error types
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown algorithm category tag
    #[error("Invalid algorithm category: {0}\nExpected one of: sorting, searching, recursion")]
    InvalidCategory(String),

    /// Unknown algorithm name
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Selector called without candidates
    #[error("Empty candidate set: at least one candidate is required for selection")]
    EmptyCandidateSet,

    /// Selector weights are not finite numbers
    #[error("Invalid weights: alpha={alpha}, beta={beta} (weights must be finite)")]
    InvalidWeights {
        /// Carbon weight
        alpha: f64,
        /// Runtime weight
        beta: f64,
    },

    /// Algorithm invoked with an input built for another category
    #[error("Algorithm '{algorithm}' expects {expected} input, got {found}")]
    CategoryMismatch {
        /// Algorithm name
        algorithm: String,
        /// Category the algorithm belongs to
        expected: String,
        /// Category of the supplied input
        found: String,
    },

    /// Algorithm panicked while being profiled
    #[error("Algorithm '{algorithm}' panicked: {message}")]
    AlgorithmPanicked {
        /// Algorithm name
        algorithm: String,
        /// Panic payload, when it was a string
        message: String,
    },

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Live carbon-intensity provider failed or returned garbage
    #[error("Carbon intensity provider failed: {0}")]
    ProviderFailed(String),

    /// Live carbon-intensity provider did not answer in time
    #[error("Carbon intensity provider timed out after {0:?}")]
    ProviderTimeout(Duration),

    /// Process resource sampling failed
    #[error("Resource sampling failed: {0}")]
    Sampling(String),

    /// Emissions model error (fit/predict)
    #[error("Emissions model error: {0}")]
    Model(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}
