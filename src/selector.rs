//! Multi-criteria selector
//!
//! Picks the greenest candidate under a speed/efficiency trade-off.
//!
//! ## Algorithm
//!
//! 1. Min-max normalize carbon and runtime independently over the candidate
//!    set: `norm(v) = (v - min) / (max - min)`, or `0.0` for every element
//!    when all values are equal.
//! 2. `cost_i = alpha * norm_carbon_i + beta * norm_runtime_i`
//! 3. Lowest cost wins; exact ties go to the earliest candidate.
//!
//! Weights are per call and only need to be finite. They are not required
//! to sum to 1 and are never rescaled.
//!
//! ## Example
//!
//! ```rust
//! use carbon_optimizer::selector::{select, CandidateMetric};
//!
//! let candidates = [
//!     CandidateMetric::new("A", 100.0, 0.2),
//!     CandidateMetric::new("B", 120.0, 0.1),
//!     CandidateMetric::new("C", 300.0, 1.0),
//! ];
//! let result = select(&candidates, 0.7, 0.3)?;
//! assert_eq!(result.best_algorithm(), "A");
//! # Ok::<(), carbon_optimizer::Error>(())
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Selector input: one algorithm's carbon and runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetric {
    name: String,
    carbon: f64,
    runtime: f64,
}

impl CandidateMetric {
    /// Create a candidate.
    ///
    /// # Arguments
    ///
    /// * `name` - Algorithm name
    /// * `carbon` - Emissions (gCO2)
    /// * `runtime` - Average runtime (s)
    #[must_use]
    pub fn new(name: impl Into<String>, carbon: f64, runtime: f64) -> Self {
        Self {
            name: name.into(),
            carbon,
            runtime,
        }
    }

    /// Get the algorithm name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the emissions in gCO2.
    #[must_use]
    pub const fn carbon(&self) -> f64 {
        self.carbon
    }

    /// Get the runtime in seconds.
    #[must_use]
    pub const fn runtime(&self) -> f64 {
        self.runtime
    }
}

/// A candidate with its normalized metrics and cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    /// Candidate as given
    pub candidate: CandidateMetric,
    /// Position in the input
    pub index: usize,
    /// Normalized carbon in `[0, 1]`
    pub norm_carbon: f64,
    /// Normalized runtime in `[0, 1]`
    pub norm_runtime: f64,
    /// Weighted cost
    pub cost: f64,
}

/// Outcome of one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    best_algorithm: String,
    score: f64,
    explanation: String,
}

impl SelectionResult {
    /// Get the winning algorithm name.
    #[must_use]
    pub fn best_algorithm(&self) -> &str {
        &self.best_algorithm
    }

    /// Get the winner's cost.
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    /// Get the human-readable justification.
    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }
}

/// Min-max normalize `values` into `[0, 1]`.
///
/// All-equal input (including a single value) maps to all zeros. Finite
/// values whose spread overflows `f64` are normalized at half scale.
#[must_use]
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range.is_nan() || range <= 0.0 {
        return vec![0.0; values.len()];
    }
    if range.is_finite() {
        values.iter().map(|v| (v - min) / range).collect()
    } else {
        let half_range = max / 2.0 - min / 2.0;
        values
            .iter()
            .map(|v| (v / 2.0 - min / 2.0) / half_range)
            .collect()
    }
}

/// `alpha * norm_carbon + beta * norm_runtime`.
#[must_use]
#[allow(clippy::suboptimal_flops)]
pub fn weighted_cost(norm_carbon: f64, norm_runtime: f64, alpha: f64, beta: f64) -> f64 {
    alpha * norm_carbon + beta * norm_runtime
}

/// Justification text embedding the weights.
#[must_use]
pub fn explanation(name: &str, alpha: f64, beta: f64) -> String {
    format!(
        "Selected '{name}' as it achieves the lowest combined energy score \
         (alpha={alpha}, beta={beta}) based on normalized carbon and runtime."
    )
}

/// Every candidate ordered by ascending cost; equal costs keep input order.
///
/// # Errors
/// - `EmptyCandidateSet` if `candidates` is empty
/// - `InvalidWeights` if `alpha` or `beta` is not finite
/// - `InvalidInput` if a carbon or runtime value is not finite
pub fn rank(candidates: &[CandidateMetric], alpha: f64, beta: f64) -> Result<Vec<RankedCandidate>> {
    if candidates.is_empty() {
        return Err(Error::EmptyCandidateSet);
    }
    if !alpha.is_finite() || !beta.is_finite() {
        return Err(Error::InvalidWeights { alpha, beta });
    }
    if let Some(bad) = candidates
        .iter()
        .find(|c| !c.carbon.is_finite() || !c.runtime.is_finite())
    {
        return Err(Error::InvalidInput(format!(
            "candidate '{}' has non-finite metrics (carbon={}, runtime={})",
            bad.name, bad.carbon, bad.runtime
        )));
    }

    let carbon: Vec<f64> = candidates.iter().map(CandidateMetric::carbon).collect();
    let runtime: Vec<f64> = candidates.iter().map(CandidateMetric::runtime).collect();
    let norm_carbon = min_max_normalize(&carbon);
    let norm_runtime = min_max_normalize(&runtime);

    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .zip(norm_carbon.into_iter().zip(norm_runtime))
        .enumerate()
        .map(|(index, (candidate, (norm_carbon, norm_runtime)))| RankedCandidate {
            candidate: candidate.clone(),
            index,
            norm_carbon,
            norm_runtime,
            cost: weighted_cost(norm_carbon, norm_runtime, alpha, beta),
        })
        .collect();

    // sort_by is stable: ties stay in input order
    ranked.sort_by(|a, b| a.cost.partial_cmp(&b.cost).unwrap_or(Ordering::Equal));
    Ok(ranked)
}

/// Pick the lowest-cost candidate.
///
/// # Errors
/// Same as [`rank`].
pub fn select(candidates: &[CandidateMetric], alpha: f64, beta: f64) -> Result<SelectionResult> {
    let best = rank(candidates, alpha, beta)?
        .into_iter()
        .next()
        .ok_or(Error::EmptyCandidateSet)?;

    Ok(SelectionResult {
        explanation: explanation(best.candidate.name(), alpha, beta),
        best_algorithm: best.candidate.name,
        score: best.cost,
    })
}
