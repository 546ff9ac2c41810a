//! Pipeline orchestrator
//!
//! Runs the phases in order and reports each one's outcome:
//!
//! | Phase         | Warning when                      | Error when                     |
//! |---------------|-----------------------------------|--------------------------------|
//! | `experiments` | some cells failed                 | the runner could not start     |
//! | `dataset`     | no row survived cleaning          |                                |
//! | `model`       | the emissions model cannot be fit |                                |
//! | `selection`   | no candidates at the largest size | the selector rejected its input|
//!
//! A failing phase never stops the ones after it. The overall status is the
//! worst phase status.

use crate::carbon::CarbonConverter;
use crate::config::OptimizerConfig;
use crate::experiment::{BenchmarkReport, ExperimentRunner, ResultStore};
use crate::export::{build_rows, DatasetRow};
use crate::predictor::{EmissionsModel, LinearEmissionsModel};
use crate::profiler::{EnergyMeter, Profiler, ResourceSampler};
use crate::selector::{select, CandidateMetric, SelectionResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, warn};

/// Pipeline phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Benchmark matrix with per-cell energy and carbon
    Experiments,
    /// Cleaned dataset
    Dataset,
    /// Emissions model training
    Model,
    /// Greenest-algorithm selection
    Selection,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Experiments => "experiments",
            Self::Dataset => "dataset",
            Self::Model => "model",
            Self::Selection => "selection",
        })
    }
}

/// Phase status, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    /// Completed normally
    Success,
    /// Completed with degraded output
    Warning,
    /// Produced nothing
    Error,
}

/// Outcome of one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOutcome {
    /// Phase
    pub phase: Phase,
    /// Status
    pub status: PhaseStatus,
    /// Human-readable summary
    pub message: String,
}

impl PhaseOutcome {
    fn new(phase: Phase, status: PhaseStatus, message: impl Into<String>) -> Self {
        let outcome = Self {
            phase,
            status,
            message: message.into(),
        };
        match status {
            PhaseStatus::Success => info!(phase = %phase, "{}", outcome.message),
            PhaseStatus::Warning => warn!(phase = %phase, "{}", outcome.message),
            PhaseStatus::Error => error!(phase = %phase, "{}", outcome.message),
        }
        outcome
    }
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    phases: Vec<PhaseOutcome>,
    report: Option<BenchmarkReport>,
    rows: Vec<DatasetRow>,
    model: Option<LinearEmissionsModel>,
    selection: Option<SelectionResult>,
}

impl PipelineReport {
    /// Get the phase outcomes, in run order.
    #[must_use]
    pub fn phases(&self) -> &[PhaseOutcome] {
        &self.phases
    }

    /// Get the outcome of one phase.
    #[must_use]
    pub fn phase(&self, phase: Phase) -> Option<&PhaseOutcome> {
        self.phases.iter().find(|o| o.phase == phase)
    }

    /// Get the worst phase status.
    #[must_use]
    pub fn status(&self) -> PhaseStatus {
        self.phases
            .iter()
            .map(|o| o.status)
            .max()
            .unwrap_or(PhaseStatus::Success)
    }

    /// Get the benchmark report, if the experiments ran.
    #[must_use]
    pub const fn report(&self) -> Option<&BenchmarkReport> {
        self.report.as_ref()
    }

    /// Get the cleaned dataset rows.
    #[must_use]
    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    /// Get the trained emissions model, if fitting succeeded.
    #[must_use]
    pub const fn model(&self) -> Option<&LinearEmissionsModel> {
        self.model.as_ref()
    }

    /// Get the selection, if one was made.
    #[must_use]
    pub const fn selection(&self) -> Option<&SelectionResult> {
        self.selection.as_ref()
    }
}

/// End-to-end pipeline over one configuration.
///
/// # Example
///
/// ```rust,no_run
/// use carbon_optimizer::config::OptimizerConfig;
/// use carbon_optimizer::pipeline::{Pipeline, PhaseStatus};
///
/// let pipeline = Pipeline::new(OptimizerConfig::default());
/// let outcome = pipeline.run();
/// if outcome.status() != PhaseStatus::Error {
///     if let Some(selection) = outcome.selection() {
///         println!("{}", selection.explanation());
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Pipeline {
    config: OptimizerConfig,
    converter: CarbonConverter,
}

impl Pipeline {
    /// Pipeline with a converter built from `config.carbon`.
    #[must_use]
    pub fn new(config: OptimizerConfig) -> Self {
        let converter = CarbonConverter::new(config.carbon);
        Self { config, converter }
    }

    /// Replace the converter (for example one with a live provider).
    #[must_use]
    pub fn with_converter(mut self, converter: CarbonConverter) -> Self {
        self.converter = converter;
        self
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Get the converter, to register or clear a live provider.
    #[must_use]
    pub const fn converter(&self) -> &CarbonConverter {
        &self.converter
    }

    /// Run every phase, profiling the current process.
    #[must_use]
    pub fn run(&self) -> PipelineReport {
        match Profiler::new() {
            Ok(profiler) => self.run_with_profiler(profiler),
            Err(e) => self.finish(
                None,
                PhaseOutcome::new(Phase::Experiments, PhaseStatus::Error, e.to_string()),
            ),
        }
    }

    /// Run every phase with an explicit profiler.
    #[must_use]
    pub fn run_with_profiler<S, M>(&self, profiler: Profiler<S, M>) -> PipelineReport
    where
        S: ResourceSampler,
        M: EnergyMeter,
    {
        if let Err(e) = self.config.validate() {
            return self.finish(
                None,
                PhaseOutcome::new(Phase::Experiments, PhaseStatus::Error, e.to_string()),
            );
        }
        let report =
            ExperimentRunner::with_parts(self.config.clone(), &self.converter, profiler).run();
        self.run_from_report(report)
    }

    /// Run the phases after the experiments on an existing report.
    #[must_use]
    pub fn run_from_report(&self, report: BenchmarkReport) -> PipelineReport {
        let records = report.store().len();
        let failed = report.failures().len();
        let outcome = if failed == 0 {
            PhaseOutcome::new(
                Phase::Experiments,
                PhaseStatus::Success,
                format!("{records} records"),
            )
        } else {
            PhaseOutcome::new(
                Phase::Experiments,
                PhaseStatus::Warning,
                format!("{records} records, {failed} failed cells"),
            )
        };
        self.finish(Some(report), outcome)
    }

    fn finish(
        &self,
        report: Option<BenchmarkReport>,
        experiments: PhaseOutcome,
    ) -> PipelineReport {
        let empty = ResultStore::new();
        let store = report.as_ref().map_or(&empty, BenchmarkReport::store);

        let rows = build_rows(store);
        let dataset = if rows.is_empty() {
            PhaseOutcome::new(Phase::Dataset, PhaseStatus::Warning, "no rows survived cleaning")
        } else {
            PhaseOutcome::new(
                Phase::Dataset,
                PhaseStatus::Success,
                format!("{} rows ({} dropped)", rows.len(), store.len() - rows.len()),
            )
        };

        let mut fitted = LinearEmissionsModel::new();
        let (model, model_outcome) = match fitted.fit(&rows) {
            Ok(()) => {
                let quality = fitted.evaluate(&rows).map_or_else(
                    |e| format!("fit quality unavailable: {e}"),
                    |m| format!("R²={:.3}, MAE={:.6} gCO2", m.r_squared, m.mae),
                );
                let message = format!("linear model fitted on {} rows ({quality})", rows.len());
                (
                    Some(fitted),
                    PhaseOutcome::new(Phase::Model, PhaseStatus::Success, message),
                )
            }
            Err(e) => (
                None,
                PhaseOutcome::new(Phase::Model, PhaseStatus::Warning, e.to_string()),
            ),
        };

        let (selection, selection_outcome) = self.select_at_largest_size(&rows);

        PipelineReport {
            phases: vec![experiments, dataset, model_outcome, selection_outcome],
            report,
            rows,
            model,
            selection,
        }
    }

    fn select_at_largest_size(&self, rows: &[DatasetRow]) -> (Option<SelectionResult>, PhaseOutcome) {
        let Some(largest) = rows.iter().map(|r| r.dataset_size).max() else {
            return (
                None,
                PhaseOutcome::new(Phase::Selection, PhaseStatus::Warning, "no candidates to select from"),
            );
        };

        let candidates: Vec<CandidateMetric> = rows
            .iter()
            .filter(|r| r.dataset_size == largest)
            .map(|r| CandidateMetric::new(&r.algorithm, r.carbon_gco2, r.avg_time_sec))
            .collect();

        match select(&candidates, self.config.alpha, self.config.beta) {
            Ok(selection) => {
                let message = format!(
                    "selected '{}' among {} candidates at size {largest}",
                    selection.best_algorithm(),
                    candidates.len()
                );
                (
                    Some(selection),
                    PhaseOutcome::new(Phase::Selection, PhaseStatus::Success, message),
                )
            }
            Err(e) => (
                None,
                PhaseOutcome::new(Phase::Selection, PhaseStatus::Error, e.to_string()),
            ),
        }
    }
}
