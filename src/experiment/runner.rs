//! Experiment Runner - drives the benchmark matrix
//!
//! ```text
//! for category in config order
//!   for size in config order          ── one base dataset per (category, size)
//!     for algorithm in plan order
//!       repeat num_runs               ── fresh copy of the base dataset each time
//!         profile(algorithm(copy))
//!       aggregate ─► energy ─► carbon ─► ResultStore
//! ```
//!
//! A cell that errors or panics is recorded as a [`CellFailure`] and the run
//! moves on; no single algorithm can abort the matrix.

use super::{AggregatedRecord, BenchmarkReport, CellFailure, ResultStore, RunSample};
use crate::algorithms::{AlgorithmCategory, AlgorithmRegistry, DatasetInput};
use crate::carbon::CarbonConverter;
use crate::config::OptimizerConfig;
use crate::dataset;
use crate::profiler::{EnergyMeter, NoEnergyMeter, ProcessSampler, Profiler, ResourceSampler};
use crate::{Error, Result};
use chrono::Utc;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// Runs every configured (category, algorithm, size) cell.
pub struct ExperimentRunner<'a, S = ProcessSampler, M = NoEnergyMeter> {
    config: OptimizerConfig,
    registry: &'a AlgorithmRegistry,
    converter: &'a CarbonConverter,
    profiler: Profiler<S, M>,
}

impl<'a> ExperimentRunner<'a> {
    /// Runner over the built-in algorithms, profiling the current process.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `config` does not validate, `Sampling` if
    /// the current process cannot be sampled.
    pub fn new(config: &OptimizerConfig, converter: &'a CarbonConverter) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_parts(config.clone(), converter, Profiler::new()?))
    }
}

impl<'a, S: ResourceSampler, M: EnergyMeter> ExperimentRunner<'a, S, M> {
    /// Runner with an explicit profiler (custom samplers, hardware meters).
    #[must_use]
    pub fn with_parts(
        config: OptimizerConfig,
        converter: &'a CarbonConverter,
        profiler: Profiler<S, M>,
    ) -> Self {
        Self {
            config,
            registry: AlgorithmRegistry::builtin(),
            converter,
            profiler,
        }
    }

    /// Resolve algorithm names against `registry` instead of the built-ins.
    #[must_use]
    pub fn with_registry(mut self, registry: &'a AlgorithmRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Run the whole matrix.
    #[must_use]
    pub fn run(&mut self) -> BenchmarkReport {
        let started_at = Utc::now();
        let snapshot = serde_json::to_value(&self.config).unwrap_or_default();
        let experiment = self.config.experiment.clone();

        info!(
            categories = experiment.categories.len(),
            sizes = ?experiment.dataset_sizes,
            num_runs = experiment.num_runs,
            seed = experiment.seed,
            "starting benchmark matrix"
        );

        let mut store = ResultStore::new();
        let mut failures = Vec::new();

        for plan in &experiment.categories {
            for &size in &experiment.dataset_sizes {
                let base = match dataset::generate(plan.category, size, experiment.seed) {
                    Ok(input) => input,
                    Err(error) => {
                        warn!(category = %plan.category, size, %error, "dataset generation failed");
                        failures.extend(plan.algorithms.iter().map(|name| {
                            CellFailure::new(plan.category, name, size, error.to_string())
                        }));
                        continue;
                    }
                };

                for name in &plan.algorithms {
                    match self.run_cell(plan.category, name, size, &base) {
                        Ok(record) => {
                            info!(
                                category = %plan.category,
                                algorithm = %name,
                                size,
                                avg_time = record.avg_time(),
                                energy_kwh = record.energy_kwh(),
                                carbon_gco2 = record.carbon_gco2(),
                                energy_source = %record.energy_source(),
                                "cell complete"
                            );
                            store.insert(record);
                        }
                        Err(error) => {
                            warn!(
                                category = %plan.category,
                                algorithm = %name,
                                size,
                                %error,
                                "cell failed, continuing"
                            );
                            failures.push(CellFailure::new(plan.category, name, size, error.to_string()));
                        }
                    }
                }
            }
        }

        info!(records = store.len(), failures = failures.len(), "benchmark matrix finished");
        BenchmarkReport::new(started_at, Utc::now(), snapshot, store, failures)
    }

    /// Profile `num_runs` repetitions of one algorithm and aggregate them.
    fn run_cell(
        &mut self,
        category: AlgorithmCategory,
        name: &str,
        size: usize,
        base: &DatasetInput,
    ) -> Result<AggregatedRecord> {
        let handle = self
            .registry
            .get(name)
            .ok_or_else(|| Error::UnknownAlgorithm(name.to_string()))?;
        if handle.category() != category {
            return Err(Error::CategoryMismatch {
                algorithm: name.to_string(),
                expected: category.to_string(),
                found: handle.category().to_string(),
            });
        }

        let num_runs = self.config.experiment.num_runs;
        let mut runs: Vec<RunSample> = Vec::with_capacity(num_runs);
        for repetition in 0..num_runs {
            let mut input = base.clone();
            let profiled = self.profiler.profile(|| {
                panic::catch_unwind(AssertUnwindSafe(|| handle.invoke(&mut input)))
            })?;

            match profiled.result {
                Ok(Ok(output)) => {
                    let _ = std::hint::black_box(output);
                }
                Ok(Err(error)) => return Err(error),
                Err(payload) => {
                    return Err(Error::AlgorithmPanicked {
                        algorithm: name.to_string(),
                        message: panic_message(payload.as_ref()),
                    })
                }
            }

            debug!(
                algorithm = %name,
                size,
                repetition,
                elapsed_secs = profiled.sample.elapsed_secs(),
                "repetition profiled"
            );
            runs.push(profiled.sample);
        }

        AggregatedRecord::from_runs(category, name, size, runs, self.converter, &self.config.power)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{Algorithm, AlgorithmHandle, AlgorithmOutput};
    use crate::config::{CategoryPlan, ExperimentConfig};
    use crate::profiler::testing::ScriptedSampler;

    fn small_config(categories: Vec<CategoryPlan>) -> OptimizerConfig {
        OptimizerConfig {
            experiment: ExperimentConfig {
                categories,
                dataset_sizes: vec![10, 20],
                num_runs: 2,
                seed: 7,
            },
            ..OptimizerConfig::default()
        }
    }

    fn scripted_profiler() -> Profiler<ScriptedSampler, NoEnergyMeter> {
        Profiler::with_parts(ScriptedSampler::new(vec![(0.0, 1 << 20)]), NoEnergyMeter)
    }

    fn failing_sort(_: &mut DatasetInput) -> Result<AlgorithmOutput> {
        Err(Error::InvalidInput("refuses to sort".into()))
    }

    fn panicking_sort(_: &mut DatasetInput) -> Result<AlgorithmOutput> {
        panic!("comparator exploded")
    }

    // Consumes its input; a second repetition on the same copy would see it empty
    fn draining_sort(input: &mut DatasetInput) -> Result<AlgorithmOutput> {
        match input {
            DatasetInput::Sorting(data) if !data.is_empty() => {
                let mut data = std::mem::take(data);
                data.sort_unstable();
                Ok(AlgorithmOutput::Sorted(data))
            }
            _ => Err(Error::InvalidInput("input already consumed".into())),
        }
    }

    fn custom_registry() -> AlgorithmRegistry {
        AlgorithmRegistry::builder()
            .with_builtins()
            .register(AlgorithmHandle::new("failing_sort", AlgorithmCategory::Sorting, failing_sort))
            .register(AlgorithmHandle::new("panicking_sort", AlgorithmCategory::Sorting, panicking_sort))
            .register(AlgorithmHandle::new("draining_sort", AlgorithmCategory::Sorting, draining_sort))
            .build()
            .unwrap()
    }

    #[test]
    fn test_full_matrix_small_sizes() {
        let config = small_config(OptimizerConfig::default().experiment.categories);
        let converter = CarbonConverter::default();
        let mut runner = ExperimentRunner::with_parts(config, &converter, scripted_profiler());
        let report = runner.run();

        assert!(report.is_complete(), "{:?}", report.failures());
        // 7 algorithms x 2 sizes
        assert_eq!(report.store().len(), 14);
        for record in report.store().records() {
            assert_eq!(record.runs().len(), 2);
            assert!(record.carbon_gco2() >= 0.0);
        }
        assert!(report.ended_at() >= report.started_at());
        assert_eq!(report.config()["experiment"]["num_runs"], 2);
    }

    #[test]
    fn test_records_follow_plan_order() {
        let config = small_config(vec![CategoryPlan::new(
            AlgorithmCategory::Sorting,
            &[Algorithm::QuickSort, Algorithm::BubbleSort],
        )]);
        let converter = CarbonConverter::default();
        let report = ExperimentRunner::with_parts(config, &converter, scripted_profiler()).run();

        let order: Vec<(&str, usize)> = report
            .store()
            .records()
            .iter()
            .map(|r| (r.algorithm(), r.size()))
            .collect();
        assert_eq!(
            order,
            [("quick_sort", 10), ("bubble_sort", 10), ("quick_sort", 20), ("bubble_sort", 20)]
        );
    }

    #[test]
    fn test_failing_and_panicking_cells_do_not_abort() {
        let registry = custom_registry();
        let config = small_config(vec![CategoryPlan {
            category: AlgorithmCategory::Sorting,
            algorithms: vec![
                "failing_sort".into(),
                "merge_sort".into(),
                "panicking_sort".into(),
            ],
        }]);
        let converter = CarbonConverter::default();
        let report = ExperimentRunner::with_parts(config, &converter, scripted_profiler())
            .with_registry(&registry)
            .run();

        assert_eq!(report.store().len(), 2);
        assert!(report.store().get(AlgorithmCategory::Sorting, "merge_sort", 20).is_some());
        assert_eq!(report.failures().len(), 4);
        assert!(report
            .failures()
            .iter()
            .any(|f| f.algorithm() == "panicking_sort" && f.reason().contains("comparator exploded")));
    }

    #[test]
    fn test_each_repetition_gets_fresh_input() {
        let registry = custom_registry();
        let config = small_config(vec![CategoryPlan {
            category: AlgorithmCategory::Sorting,
            algorithms: vec!["draining_sort".into()],
        }]);
        let converter = CarbonConverter::default();
        let report = ExperimentRunner::with_parts(config, &converter, scripted_profiler())
            .with_registry(&registry)
            .run();

        assert!(report.is_complete(), "{:?}", report.failures());
        assert_eq!(report.store().len(), 2);
    }

    #[test]
    fn test_unknown_and_misplaced_algorithms_fail_cells() {
        let config = small_config(vec![CategoryPlan {
            category: AlgorithmCategory::Searching,
            algorithms: vec!["teleport_search".into(), "merge_sort".into()],
        }]);
        let converter = CarbonConverter::default();
        let report = ExperimentRunner::with_parts(config, &converter, scripted_profiler()).run();

        assert!(report.store().is_empty());
        assert_eq!(report.failures().len(), 4);
        assert!(report.failures()[0].reason().contains("teleport_search"));
    }

    #[test]
    fn test_dataset_failure_fails_whole_category_size() {
        let mut config = small_config(vec![CategoryPlan::new(
            AlgorithmCategory::Searching,
            &[Algorithm::LinearSearch, Algorithm::BinarySearch],
        )]);
        config.experiment.dataset_sizes = vec![0, 10];
        let converter = CarbonConverter::default();
        let report = ExperimentRunner::with_parts(config, &converter, scripted_profiler()).run();

        assert_eq!(report.failures().len(), 2);
        assert!(report.failures().iter().all(|f| f.size() == 0));
        assert_eq!(report.store().len(), 2);
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "non-string panic payload");
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = OptimizerConfig::default();
        config.experiment.num_runs = 0;
        let converter = CarbonConverter::default();
        assert!(matches!(
            ExperimentRunner::new(&config, &converter),
            Err(Error::InvalidConfig(_))
        ));
    }
}
