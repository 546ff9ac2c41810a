//! Aggregated Record - averaged metrics of one benchmark cell

use super::RunSample;
use crate::algorithms::AlgorithmCategory;
use crate::carbon::{CarbonConverter, EnergySource, IntensitySource, ResourceUsage};
use crate::energy::{bytes_to_mb, EnergyModel};
use crate::selector::CandidateMetric;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Arithmetic means over the repetitions of one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Averages {
    /// Mean elapsed time (s)
    pub time_secs: f64,
    /// Mean CPU delta (%)
    pub cpu_percent: f64,
    /// Mean memory delta (bytes)
    pub memory_bytes: f64,
    /// Mean of the hardware readings that are present, if any are
    pub real_energy_kwh: Option<f64>,
}

impl Averages {
    /// Average `samples`; `None` when there are none.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn of(samples: &[RunSample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let readings: Vec<f64> = samples
            .iter()
            .filter_map(RunSample::real_energy_kwh)
            .collect();
        let real_energy_kwh =
            (!readings.is_empty()).then(|| readings.iter().sum::<f64>() / readings.len() as f64);

        Some(Self {
            time_secs: samples.iter().map(RunSample::elapsed_secs).sum::<f64>() / n,
            cpu_percent: samples.iter().map(RunSample::cpu_percent).sum::<f64>() / n,
            memory_bytes: samples
                .iter()
                .map(|s| s.memory_bytes() as f64)
                .sum::<f64>()
                / n,
            real_energy_kwh,
        })
    }
}

/// Averaged performance and emissions of one (category, algorithm, size)
/// cell, with the repetitions it was computed from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatedRecord {
    category: AlgorithmCategory,
    algorithm: String,
    size: usize,
    avg_time: f64,
    avg_cpu: f64,
    avg_mem: f64,
    energy_kwh: f64,
    carbon_gco2: f64,
    energy_source: EnergySource,
    intensity_g_per_kwh: f64,
    intensity_source: IntensitySource,
    runs: Vec<RunSample>,
}

impl AggregatedRecord {
    /// Average `runs` and convert the averages to energy and carbon.
    ///
    /// Energy is the mean of the hardware readings when any repetition has
    /// one, otherwise the model estimate for the averaged time and memory.
    ///
    /// # Errors
    /// Returns `InvalidInput` if `runs` is empty.
    pub fn from_runs(
        category: AlgorithmCategory,
        algorithm: impl Into<String>,
        size: usize,
        runs: Vec<RunSample>,
        converter: &CarbonConverter,
        model: &EnergyModel,
    ) -> Result<Self> {
        let algorithm = algorithm.into();
        let averages = Averages::of(&runs).ok_or_else(|| {
            Error::InvalidInput(format!("no repetitions recorded for {algorithm}"))
        })?;

        let usage = ResourceUsage {
            runtime_s: averages.time_secs,
            memory_bytes: averages.memory_bytes,
        };
        let enriched = converter.enrich(usage, model, None, averages.real_energy_kwh);

        Ok(Self {
            category,
            algorithm,
            size,
            avg_time: averages.time_secs,
            avg_cpu: averages.cpu_percent,
            avg_mem: averages.memory_bytes,
            energy_kwh: enriched.energy_kwh,
            carbon_gco2: enriched.carbon_gco2,
            energy_source: enriched.energy_source,
            intensity_g_per_kwh: enriched.intensity_g_per_kwh,
            intensity_source: enriched.intensity_source,
            runs,
        })
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

    /// Get the mean elapsed time in seconds.
    #[must_use]
    pub const fn avg_time(&self) -> f64 {
        self.avg_time
    }

    /// Get the mean CPU delta in percent.
    #[must_use]
    pub const fn avg_cpu(&self) -> f64 {
        self.avg_cpu
    }

    /// Get the mean memory delta in bytes.
    #[must_use]
    pub const fn avg_mem(&self) -> f64 {
        self.avg_mem
    }

    /// Get the mean memory delta in megabytes.
    #[must_use]
    pub fn avg_memory_mb(&self) -> f64 {
        bytes_to_mb(self.avg_mem)
    }

    /// Get the energy in kWh.
    #[must_use]
    pub const fn energy_kwh(&self) -> f64 {
        self.energy_kwh
    }

    /// Get the emissions in gCO2.
    #[must_use]
    pub const fn carbon_gco2(&self) -> f64 {
        self.carbon_gco2
    }

    /// Get the origin of the energy figure.
    #[must_use]
    pub const fn energy_source(&self) -> EnergySource {
        self.energy_source
    }

    /// Get the carbon intensity used, in gCO2/kWh.
    #[must_use]
    pub const fn intensity_g_per_kwh(&self) -> f64 {
        self.intensity_g_per_kwh
    }

    /// Get the origin of the carbon intensity.
    #[must_use]
    pub const fn intensity_source(&self) -> IntensitySource {
        self.intensity_source
    }

    /// Get the underlying repetitions.
    #[must_use]
    pub fn runs(&self) -> &[RunSample] {
        &self.runs
    }

    /// Project onto the selector's input shape.
    #[must_use]
    pub fn to_candidate(&self) -> CandidateMetric {
        CandidateMetric::new(&self.algorithm, self.carbon_gco2, self.avg_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter() -> CarbonConverter {
        CarbonConverter::default()
    }

    #[test]
    fn test_averages_empty() {
        assert!(Averages::of(&[]).is_none());
    }

    #[test]
    fn test_averages_means() {
        let samples = [
            RunSample::new(1.0, 10.0, 2048, None),
            RunSample::new(3.0, 30.0, 4096, None),
        ];
        let averages = Averages::of(&samples).unwrap();
        assert!((averages.time_secs - 2.0).abs() < f64::EPSILON);
        assert!((averages.cpu_percent - 20.0).abs() < f64::EPSILON);
        assert!((averages.memory_bytes - 3072.0).abs() < f64::EPSILON);
        assert!(averages.real_energy_kwh.is_none());
    }

    #[test]
    fn test_averages_only_present_readings() {
        let samples = [
            RunSample::new(1.0, 0.0, 1024, Some(0.002)),
            RunSample::new(1.0, 0.0, 1024, None),
            RunSample::new(1.0, 0.0, 1024, Some(0.004)),
        ];
        let averages = Averages::of(&samples).unwrap();
        assert!((averages.real_energy_kwh.unwrap() - 0.003).abs() < 1e-15);
    }

    #[test]
    fn test_record_estimated_energy() {
        let runs = vec![RunSample::new(3600.0, 100.0, 1024, None); 5];
        let model = EnergyModel::default().with_watts_per_mb(0.0);
        let record = AggregatedRecord::from_runs(
            AlgorithmCategory::Sorting,
            "merge_sort",
            1000,
            runs,
            &converter(),
            &model,
        )
        .unwrap();
        assert_eq!(record.energy_source(), EnergySource::Estimated);
        assert!((record.energy_kwh() - 0.05).abs() < 1e-15);
        assert!((record.carbon_gco2() - 23.75).abs() < 1e-12);
        assert_eq!(record.runs().len(), 5);
        assert_eq!(record.intensity_source(), IntensitySource::Default);
    }

    #[test]
    fn test_record_hardware_energy() {
        let runs = vec![
            RunSample::new(0.1, 0.0, 1024, Some(0.01)),
            RunSample::new(0.1, 0.0, 1024, None),
        ];
        let record = AggregatedRecord::from_runs(
            AlgorithmCategory::Recursion,
            "fibonacci_iterative",
            1000,
            runs,
            &converter(),
            &EnergyModel::default(),
        )
        .unwrap();
        assert_eq!(record.energy_source(), EnergySource::Hardware);
        assert!((record.energy_kwh() - 0.01).abs() < 1e-15);
    }

    #[test]
    fn test_record_requires_runs() {
        let result = AggregatedRecord::from_runs(
            AlgorithmCategory::Sorting,
            "merge_sort",
            10,
            vec![],
            &converter(),
            &EnergyModel::default(),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_to_candidate() {
        let runs = vec![RunSample::new(0.2, 0.0, 1024, None)];
        let record = AggregatedRecord::from_runs(
            AlgorithmCategory::Searching,
            "linear_search",
            100,
            runs,
            &converter(),
            &EnergyModel::default(),
        )
        .unwrap();
        let candidate = record.to_candidate();
        assert_eq!(candidate.name(), "linear_search");
        assert!((candidate.runtime() - 0.2).abs() < f64::EPSILON);
        assert!((candidate.carbon() - record.carbon_gco2()).abs() < f64::EPSILON);
    }
}
