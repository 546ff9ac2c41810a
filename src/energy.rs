//! Energy model
//!
//! Linear estimate of the electricity drawn by a run from its duration, the
//! number of busy cores, and the memory it touched:
//!
//! ```text
//! cpu_kwh    = watts_per_core * cores  * (runtime_s / 3600) / 1000
//! memory_kwh = watts_per_mb   * mem_mb * (runtime_s / 3600) / 1000
//! ```
//!
//! The power constants are configuration; callers can override every one of
//! them per invocation.

use serde::{Deserialize, Serialize};

/// Default CPU draw per core, in watts.
pub const DEFAULT_WATTS_PER_CORE: f64 = 50.0;

/// Default memory draw per megabyte, in watts.
pub const DEFAULT_WATTS_PER_MB: f64 = 0.3725;

/// Default number of cores attributed to a run.
pub const DEFAULT_CORES: u32 = 1;

/// Bytes in one megabyte (binary).
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

const SECONDS_PER_HOUR: f64 = 3600.0;
const WATTS_PER_KILOWATT: f64 = 1000.0;

/// CPU energy in kWh.
#[must_use]
pub fn cpu_energy_kwh(runtime_s: f64, cores: u32, watts_per_core: f64) -> f64 {
    watts_per_core * f64::from(cores) * (runtime_s / SECONDS_PER_HOUR) / WATTS_PER_KILOWATT
}

/// Memory energy in kWh.
#[must_use]
pub fn memory_energy_kwh(mem_mb: f64, runtime_s: f64, watts_per_mb: f64) -> f64 {
    watts_per_mb * mem_mb * (runtime_s / SECONDS_PER_HOUR) / WATTS_PER_KILOWATT
}

/// Convert a byte count to megabytes.
#[must_use]
pub fn bytes_to_mb(bytes: f64) -> f64 {
    bytes / BYTES_PER_MB
}

/// Power constants used to turn runtime and memory into energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyModel {
    /// Cores attributed to the run
    pub cores: u32,
    /// CPU draw per core (W)
    pub watts_per_core: f64,
    /// Memory draw per MB (W)
    pub watts_per_mb: f64,
}

impl Default for EnergyModel {
    fn default() -> Self {
        Self {
            cores: DEFAULT_CORES,
            watts_per_core: DEFAULT_WATTS_PER_CORE,
            watts_per_mb: DEFAULT_WATTS_PER_MB,
        }
    }
}

impl EnergyModel {
    /// Override the core count.
    #[must_use]
    pub const fn with_cores(mut self, cores: u32) -> Self {
        self.cores = cores;
        self
    }

    /// Override the per-core draw.
    #[must_use]
    pub const fn with_watts_per_core(mut self, watts: f64) -> Self {
        self.watts_per_core = watts;
        self
    }

    /// Override the per-MB draw.
    #[must_use]
    pub const fn with_watts_per_mb(mut self, watts: f64) -> Self {
        self.watts_per_mb = watts;
        self
    }

    /// CPU energy for a run of `runtime_s` seconds.
    #[must_use]
    pub fn cpu_energy_kwh(&self, runtime_s: f64) -> f64 {
        cpu_energy_kwh(runtime_s, self.cores, self.watts_per_core)
    }

    /// Memory energy for `mem_mb` held for `runtime_s` seconds.
    #[must_use]
    pub fn memory_energy_kwh(&self, mem_mb: f64, runtime_s: f64) -> f64 {
        memory_energy_kwh(mem_mb, runtime_s, self.watts_per_mb)
    }

    /// CPU plus memory energy.
    #[must_use]
    pub fn total_energy_kwh(&self, runtime_s: f64, mem_mb: f64) -> f64 {
        self.cpu_energy_kwh(runtime_s) + self.memory_energy_kwh(mem_mb, runtime_s)
    }
}
