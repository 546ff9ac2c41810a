//! Profiler
//!
//! Brackets one algorithm invocation with process-level samples:
//!
//! ```text
//! sample(cpu%, rss) ─► meter.start ─► t0 ─► f() ─► t1 ─► meter.stop ─► sample(cpu%, rss)
//! ```
//!
//! Only `t0..t1` is timed, so the sampling cost stays out of `elapsed`.
//! Deltas are filtered for sampling noise: CPU is clamped to `[0, 400]`
//! (multi-core overshoot is kept, negative readings are not) and memory is
//! floored at 1 KiB.
//!
//! Sampling brackets a single exclusive invocation. Running two profiled
//! invocations concurrently in one process corrupts both deltas.
//!
//! Panics raised by the profiled closure unwind through the profiler
//! unchanged.

use crate::experiment::RunSample;
use crate::{Error, Result};
use std::time::Instant;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Upper bound of the CPU delta, in percent.
pub const CPU_DELTA_MAX: f64 = 400.0;

/// Lower bound of the memory delta, in bytes.
pub const MIN_MEMORY_DELTA_BYTES: u64 = 1024;

/// Process resource reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSnapshot {
    /// CPU usage since the previous sample, in percent of one core
    pub cpu_percent: f64,
    /// Resident set size, in bytes
    pub rss_bytes: u64,
}

/// Source of process resource readings.
pub trait ResourceSampler {
    /// Take one reading.
    ///
    /// # Errors
    /// Returns `Sampling` if the reading cannot be taken.
    fn sample(&mut self) -> Result<ResourceSnapshot>;
}

/// Samples the current process through `sysinfo`.
///
/// CPU usage is computed by `sysinfo` between consecutive refreshes, so the
/// "after" reading covers exactly the profiled invocation.
pub struct ProcessSampler {
    system: System,
    pid: Pid,
}

impl ProcessSampler {
    /// Attach to the current process.
    ///
    /// # Errors
    /// Returns `Sampling` if the platform cannot report the current PID.
    pub fn new() -> Result<Self> {
        let pid = sysinfo::get_current_pid().map_err(|e| Error::Sampling(e.to_string()))?;
        let mut sampler = Self {
            system: System::new(),
            pid,
        };
        // Prime the CPU counters so the first real sample has a baseline
        sampler.refresh();
        Ok(sampler)
    }

    fn refresh(&mut self) {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );
    }
}

impl ResourceSampler for ProcessSampler {
    fn sample(&mut self) -> Result<ResourceSnapshot> {
        self.refresh();
        let process = self
            .system
            .process(self.pid)
            .ok_or_else(|| Error::Sampling(format!("process {} not visible", self.pid)))?;
        Ok(ResourceSnapshot {
            cpu_percent: f64::from(process.cpu_usage()),
            rss_bytes: process.memory(),
        })
    }
}

/// Hardware energy counter (RAPL or similar).
///
/// `stop` returning `None` is the normal case on machines without counters;
/// downstream code then falls back to the estimated energy.
pub trait EnergyMeter {
    /// Begin a measurement window.
    fn start(&mut self);

    /// End the window and return the energy consumed, in kWh.
    fn stop(&mut self) -> Option<f64>;
}

/// Meter for machines without hardware counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEnergyMeter;

impl EnergyMeter for NoEnergyMeter {
    fn start(&mut self) {}

    fn stop(&mut self) -> Option<f64> {
        None
    }
}

/// Result of one profiled invocation.
#[derive(Debug, Clone)]
pub struct Profiled<R> {
    /// Value returned by the profiled closure
    pub result: R,
    /// Measurements of the invocation
    pub sample: RunSample,
}

/// Clamp a CPU delta into `[0, CPU_DELTA_MAX]`; NaN counts as 0.
#[must_use]
pub fn clamp_cpu_delta(delta: f64) -> f64 {
    if delta.is_nan() {
        return 0.0;
    }
    delta.clamp(0.0, CPU_DELTA_MAX)
}

/// Memory growth between two RSS readings, floored at `MIN_MEMORY_DELTA_BYTES`.
#[must_use]
pub fn memory_delta(before: u64, after: u64) -> u64 {
    after.saturating_sub(before).max(MIN_MEMORY_DELTA_BYTES)
}

/// Wraps single invocations with resource sampling.
pub struct Profiler<S = ProcessSampler, M = NoEnergyMeter> {
    sampler: S,
    meter: M,
}

impl Profiler {
    /// Profiler for the current process without hardware energy counters.
    ///
    /// # Errors
    /// Returns `Sampling` if the current process cannot be sampled.
    pub fn new() -> Result<Self> {
        Ok(Self::with_parts(ProcessSampler::new()?, NoEnergyMeter))
    }
}

impl<S: ResourceSampler, M: EnergyMeter> Profiler<S, M> {
    /// Assemble a profiler from a sampler and an energy meter.
    pub const fn with_parts(sampler: S, meter: M) -> Self {
        Self { sampler, meter }
    }

    /// Invoke `f` once and measure it.
    ///
    /// # Errors
    /// Returns `Sampling` if either resource reading fails. Whatever `f`
    /// returns is passed back untouched in [`Profiled::result`].
    pub fn profile<R, F>(&mut self, f: F) -> Result<Profiled<R>>
    where
        F: FnOnce() -> R,
    {
        let before = self.sampler.sample()?;
        self.meter.start();

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        let real_energy_kwh = self.meter.stop();
        let after = self.sampler.sample()?;

        let sample = RunSample::new(
            elapsed.as_secs_f64(),
            clamp_cpu_delta(after.cpu_percent - before.cpu_percent),
            memory_delta(before.rss_bytes, after.rss_bytes),
            real_energy_kwh,
        );
        Ok(Profiled { result, sample })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{EnergyMeter, ResourceSampler, ResourceSnapshot};
    use crate::Result;
    use std::collections::VecDeque;

    /// Replays a fixed list of snapshots, then repeats the last one.
    pub struct ScriptedSampler {
        snapshots: VecDeque<ResourceSnapshot>,
        last: ResourceSnapshot,
    }

    impl ScriptedSampler {
        pub fn new(snapshots: Vec<(f64, u64)>) -> Self {
            let snapshots: VecDeque<ResourceSnapshot> = snapshots
                .into_iter()
                .map(|(cpu_percent, rss_bytes)| ResourceSnapshot {
                    cpu_percent,
                    rss_bytes,
                })
                .collect();
            let last = snapshots.back().copied().unwrap_or(ResourceSnapshot {
                cpu_percent: 0.0,
                rss_bytes: 0,
            });
            Self { snapshots, last }
        }
    }

    impl ResourceSampler for ScriptedSampler {
        fn sample(&mut self) -> Result<ResourceSnapshot> {
            Ok(self.snapshots.pop_front().unwrap_or(self.last))
        }
    }

    /// Reports a fixed reading for every window.
    pub struct FixedMeter(pub Option<f64>);

    impl EnergyMeter for FixedMeter {
        fn start(&mut self) {}

        fn stop(&mut self) -> Option<f64> {
            self.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FixedMeter, ScriptedSampler};
    use super::*;

    #[test]
    fn test_clamp_cpu_delta() {
        assert_eq!(clamp_cpu_delta(-5.0), 0.0);
        assert_eq!(clamp_cpu_delta(37.5), 37.5);
        assert_eq!(clamp_cpu_delta(900.0), 400.0);
        assert_eq!(clamp_cpu_delta(f64::NAN), 0.0);
    }

    #[test]
    fn test_memory_delta_floor() {
        assert_eq!(memory_delta(10_000, 9_000), 1024);
        assert_eq!(memory_delta(10_000, 10_500), 1024);
        assert_eq!(memory_delta(10_000, 20_000), 10_000);
    }

    #[test]
    fn test_profile_uses_scripted_deltas() {
        let sampler = ScriptedSampler::new(vec![(10.0, 1_000_000), (60.0, 3_000_000)]);
        let mut profiler = Profiler::with_parts(sampler, NoEnergyMeter);
        let profiled = profiler.profile(|| 2 + 2).unwrap();
        assert_eq!(profiled.result, 4);
        assert_eq!(profiled.sample.cpu_percent(), 50.0);
        assert_eq!(profiled.sample.memory_bytes(), 2_000_000);
        assert!(profiled.sample.elapsed_secs() >= 0.0);
        assert!(profiled.sample.real_energy_kwh().is_none());
    }

    #[test]
    fn test_profile_clamps_noise() {
        let sampler = ScriptedSampler::new(vec![(80.0, 5_000), (20.0, 4_000)]);
        let mut profiler = Profiler::with_parts(sampler, NoEnergyMeter);
        let sample = profiler.profile(|| ()).unwrap().sample;
        assert_eq!(sample.cpu_percent(), 0.0);
        assert_eq!(sample.memory_bytes(), 1024);
    }

    #[test]
    fn test_profile_reports_hardware_energy() {
        let sampler = ScriptedSampler::new(vec![(0.0, 0)]);
        let mut profiler = Profiler::with_parts(sampler, FixedMeter(Some(0.002)));
        let sample = profiler.profile(|| ()).unwrap().sample;
        assert_eq!(sample.real_energy_kwh(), Some(0.002));
    }

    #[test]
    fn test_profile_passes_errors_through() {
        let sampler = ScriptedSampler::new(vec![(0.0, 0)]);
        let mut profiler = Profiler::with_parts(sampler, NoEnergyMeter);
        let profiled = profiler
            .profile(|| Err::<(), _>(Error::InvalidInput("boom".into())))
            .unwrap();
        assert!(matches!(profiled.result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_process_sampler_reads_current_process() {
        let mut sampler = ProcessSampler::new().unwrap();
        let snapshot = sampler.sample().unwrap();
        assert!(snapshot.rss_bytes > 0);
        assert!(snapshot.cpu_percent >= 0.0);
    }
}
