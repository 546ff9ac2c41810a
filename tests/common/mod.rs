//! Shared fixtures for the integration tests

#![allow(dead_code)]

use carbon_optimizer::config::{CategoryPlan, OptimizerConfig};
use carbon_optimizer::profiler::{EnergyMeter, Profiler, ResourceSampler, ResourceSnapshot};
use carbon_optimizer::{AlgorithmCategory, Result};

/// Sampler that reports a steady process: no CPU or memory growth.
pub struct SteadySampler;

impl ResourceSampler for SteadySampler {
    fn sample(&mut self) -> Result<ResourceSnapshot> {
        Ok(ResourceSnapshot {
            cpu_percent: 10.0,
            rss_bytes: 64 * 1024 * 1024,
        })
    }
}

/// Meter that reports the same hardware reading for every window.
pub struct ConstantMeter(pub f64);

impl EnergyMeter for ConstantMeter {
    fn start(&mut self) {}

    fn stop(&mut self) -> Option<f64> {
        Some(self.0)
    }
}

/// Deterministic profiler: every run costs `energy_kwh`.
pub fn steady_profiler(energy_kwh: f64) -> Profiler<SteadySampler, ConstantMeter> {
    Profiler::with_parts(SteadySampler, ConstantMeter(energy_kwh))
}

/// Small configuration that runs in milliseconds.
pub fn small_config() -> OptimizerConfig {
    let mut config = OptimizerConfig::default();
    config.experiment.dataset_sizes = vec![10, 20];
    config.experiment.num_runs = 2;
    config
}

/// Configuration restricted to one category and plan.
pub fn single_plan_config(category: AlgorithmCategory, algorithms: &[&str]) -> OptimizerConfig {
    let mut config = small_config();
    config.experiment.categories = vec![CategoryPlan {
        category,
        algorithms: algorithms.iter().map(ToString::to_string).collect(),
    }];
    config
}
