//! Configuration
//!
//! Every tunable of the pipeline lives here: the experiment matrix, the power
//! constants, the carbon defaults, and the default selector weights. The
//! defaults reproduce the reference experiment (3 categories, sizes
//! 1000/5000/10000, 5 repetitions, seed 42).
//!
//! Configuration files are JSON; omitted fields take their defaults.
//!
//! ```rust
//! use carbon_optimizer::config::OptimizerConfig;
//!
//! let config = OptimizerConfig::from_json_str(r#"{ "experiment": { "num_runs": 3 } }"#)?;
//! assert_eq!(config.experiment.num_runs, 3);
//! assert_eq!(config.experiment.seed, 42);
//! # Ok::<(), carbon_optimizer::Error>(())
//! ```

use crate::algorithms::{Algorithm, AlgorithmCategory};
use crate::energy::EnergyModel;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default number of repetitions per (category, algorithm, size) cell.
pub const DEFAULT_NUM_RUNS: usize = 5;

/// Default dataset seed.
pub const DEFAULT_SEED: u64 = 42;

/// Default dataset sizes (small, medium, large).
pub const DEFAULT_DATASET_SIZES: [usize; 3] = [1000, 5000, 10000];

/// Default grid carbon intensity (gCO2/kWh).
pub const DEFAULT_CARBON_INTENSITY: f64 = 475.0;

/// Default bound on a live carbon-intensity lookup.
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 2000;

/// Default selector weight on carbon.
pub const DEFAULT_ALPHA: f64 = 0.5;
/// Default selector weight on runtime.
pub const DEFAULT_BETA: f64 = 0.5;

/// Algorithms benchmarked for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPlan {
    /// Category tag
    pub category: AlgorithmCategory,
    /// Algorithm names, in benchmark order
    pub algorithms: Vec<String>,
}

impl CategoryPlan {
    /// Plan covering `algorithms` for `category`.
    #[must_use]
    pub fn new(category: AlgorithmCategory, algorithms: &[Algorithm]) -> Self {
        Self {
            category,
            algorithms: algorithms.iter().map(|a| a.name().to_string()).collect(),
        }
    }
}

/// Shape of the benchmark matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Categories and their algorithms, in run order
    pub categories: Vec<CategoryPlan>,
    /// Input sizes, in run order
    pub dataset_sizes: Vec<usize>,
    /// Repetitions per cell
    pub num_runs: usize,
    /// Dataset seed
    pub seed: u64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            categories: vec![
                CategoryPlan::new(
                    AlgorithmCategory::Sorting,
                    &[Algorithm::BubbleSort, Algorithm::MergeSort, Algorithm::QuickSort],
                ),
                CategoryPlan::new(
                    AlgorithmCategory::Searching,
                    &[Algorithm::LinearSearch, Algorithm::BinarySearch],
                ),
                CategoryPlan::new(
                    AlgorithmCategory::Recursion,
                    &[Algorithm::FibonacciRecursive, Algorithm::FibonacciIterative],
                ),
            ],
            dataset_sizes: DEFAULT_DATASET_SIZES.to_vec(),
            num_runs: DEFAULT_NUM_RUNS,
            seed: DEFAULT_SEED,
        }
    }
}

/// Carbon conversion defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarbonConfig {
    /// Static fallback intensity (gCO2/kWh)
    pub default_intensity_g_per_kwh: f64,
    /// Bound on a live provider lookup, in milliseconds
    pub provider_timeout_ms: u64,
}

impl Default for CarbonConfig {
    fn default() -> Self {
        Self {
            default_intensity_g_per_kwh: DEFAULT_CARBON_INTENSITY,
            provider_timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
        }
    }
}

impl CarbonConfig {
    /// Provider timeout as a `Duration`.
    #[must_use]
    pub const fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Benchmark matrix
    pub experiment: ExperimentConfig,
    /// Power constants
    pub power: EnergyModel,
    /// Carbon defaults
    pub carbon: CarbonConfig,
    /// Default carbon weight for selection
    pub alpha: f64,
    /// Default runtime weight for selection
    pub beta: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            experiment: ExperimentConfig::default(),
            power: EnergyModel::default(),
            carbon: CarbonConfig::default(),
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
        }
    }
}

impl OptimizerConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    /// Returns `Json` on malformed input, `InvalidConfig` on invalid values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read, otherwise as `from_json_str`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Check value ranges.
    ///
    /// Weights only need to be finite: they are not required to sum to 1.
    ///
    /// # Errors
    /// Returns `InvalidConfig` describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        let experiment = &self.experiment;
        if experiment.num_runs == 0 {
            return Err(Error::InvalidConfig("num_runs must be at least 1".into()));
        }
        if experiment.dataset_sizes.is_empty() {
            return Err(Error::InvalidConfig("dataset_sizes must not be empty".into()));
        }
        if experiment.categories.is_empty() {
            return Err(Error::InvalidConfig("categories must not be empty".into()));
        }
        for (name, value) in [
            ("power.watts_per_core", self.power.watts_per_core),
            ("power.watts_per_mb", self.power.watts_per_mb),
            (
                "carbon.default_intensity_g_per_kwh",
                self.carbon.default_intensity_g_per_kwh,
            ),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a finite, non-negative number (got {value})"
                )));
            }
        }
        if !self.alpha.is_finite() || !self.beta.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "alpha/beta must be finite (got {}, {})",
                self.alpha, self.beta
            )));
        }
        Ok(())
    }
}
