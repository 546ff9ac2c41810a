//! Run Sample - raw measurements of one repetition

use serde::{Deserialize, Serialize};

/// Measurements of one profiled repetition.
///
/// Produced by the profiler, already noise-filtered: CPU in `[0, 400]`,
/// memory at least 1024 bytes. Serialized with the compact keys of the raw
/// results layout (`time`, `cpu`, `mem`, `real_energy`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RunSample {
    #[serde(rename = "time")]
    elapsed_secs: f64,
    #[serde(rename = "cpu")]
    cpu_percent: f64,
    #[serde(rename = "mem")]
    memory_bytes: u64,
    #[serde(rename = "real_energy")]
    real_energy_kwh: Option<f64>,
}

impl RunSample {
    /// Create a run sample.
    ///
    /// # Arguments
    ///
    /// * `elapsed_secs` - Wall-clock time of the invocation
    /// * `cpu_percent` - CPU usage delta (percent of one core)
    /// * `memory_bytes` - Resident memory delta
    /// * `real_energy_kwh` - Hardware energy reading, if the machine has one
    #[must_use]
    pub const fn new(
        elapsed_secs: f64,
        cpu_percent: f64,
        memory_bytes: u64,
        real_energy_kwh: Option<f64>,
    ) -> Self {
        Self {
            elapsed_secs,
            cpu_percent,
            memory_bytes,
            real_energy_kwh,
        }
    }

    /// Get the elapsed wall-clock time in seconds.
    #[must_use]
    pub const fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    /// Get the CPU usage delta in percent.
    #[must_use]
    pub const fn cpu_percent(&self) -> f64 {
        self.cpu_percent
    }

    /// Get the memory delta in bytes.
    #[must_use]
    pub const fn memory_bytes(&self) -> u64 {
        self.memory_bytes
    }

    /// Get the hardware energy reading in kWh, if any.
    #[must_use]
    pub const fn real_energy_kwh(&self) -> Option<f64> {
        self.real_energy_kwh
    }
}
