//! Carbon converter
//!
//! Turns energy into emissions: `carbon_g = energy_kwh * intensity_g_per_kwh`.
//!
//! ## Intensity resolution
//!
//! 1. an explicit value passed by the caller;
//! 2. the registered live provider, bounded by a timeout;
//! 3. the static default (475 gCO2/kWh unless configured otherwise).
//!
//! A provider that errors, panics, times out, or reports a non-finite or
//! negative value is logged and replaced by the static default. Provider
//! failures never reach the caller.
//!
//! ## Example
//!
//! ```rust
//! use carbon_optimizer::carbon::CarbonConverter;
//! use carbon_optimizer::config::CarbonConfig;
//! use carbon_optimizer::{Error, Result};
//!
//! let converter = CarbonConverter::new(CarbonConfig::default());
//! converter.set_provider(|| -> Result<f64> { Err(Error::ProviderFailed("offline".into())) });
//!
//! // Falls back to 475 gCO2/kWh
//! assert!((converter.to_carbon(0.05, None) - 23.75).abs() < 1e-12);
//! ```

mod provider;

pub use provider::{CarbonIntensityProvider, StaticIntensity};

use crate::config::CarbonConfig;
use crate::energy::{bytes_to_mb, EnergyModel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Emissions in gCO2 for `energy_kwh` at `intensity_g_per_kwh`.
#[must_use]
pub fn to_carbon(energy_kwh: f64, intensity_g_per_kwh: f64) -> f64 {
    energy_kwh * intensity_g_per_kwh
}

/// Where the energy figure of a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergySource {
    /// Hardware energy counters
    Hardware,
    /// CPU + memory energy model
    Estimated,
}

impl fmt::Display for EnergySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hardware => "hardware",
            Self::Estimated => "estimated",
        })
    }
}

/// Where the carbon intensity of a conversion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensitySource {
    /// Passed by the caller
    Explicit,
    /// Live provider
    Live,
    /// Static default
    Default,
}

/// Intensity value together with its origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedIntensity {
    /// gCO2/kWh
    pub value: f64,
    /// Origin of `value`
    pub source: IntensitySource,
}

/// Averaged resource usage to convert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceUsage {
    /// Wall-clock runtime (s)
    pub runtime_s: f64,
    /// Memory delta (bytes)
    pub memory_bytes: f64,
}

/// Energy and emissions of one resource usage, with audit fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    /// Total energy (kWh)
    pub energy_kwh: f64,
    /// Emissions (gCO2)
    pub carbon_gco2: f64,
    /// Origin of `energy_kwh`
    pub energy_source: EnergySource,
    /// Model CPU energy (kWh), also reported for hardware readings
    pub cpu_energy_kwh: f64,
    /// Model memory energy (kWh), also reported for hardware readings
    pub memory_energy_kwh: f64,
    /// Intensity used (gCO2/kWh)
    pub intensity_g_per_kwh: f64,
    /// Origin of `intensity_g_per_kwh`
    pub intensity_source: IntensitySource,
}

/// Energy-to-carbon converter with an optional live intensity provider.
///
/// The provider slot is guarded by a lock: it can be swapped or cleared while
/// other threads convert.
pub struct CarbonConverter {
    config: CarbonConfig,
    provider: RwLock<Option<Arc<dyn CarbonIntensityProvider>>>,
}

impl Default for CarbonConverter {
    fn default() -> Self {
        Self::new(CarbonConfig::default())
    }
}

impl fmt::Debug for CarbonConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CarbonConverter")
            .field("config", &self.config)
            .field("has_provider", &self.has_provider())
            .finish()
    }
}

impl CarbonConverter {
    /// Converter using only the static default.
    #[must_use]
    pub const fn new(config: CarbonConfig) -> Self {
        Self {
            config,
            provider: RwLock::new(None),
        }
    }

    /// Converter with a live provider registered from the start.
    #[must_use]
    pub fn with_provider<P>(self, provider: P) -> Self
    where
        P: CarbonIntensityProvider + 'static,
    {
        self.set_provider(provider);
        self
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &CarbonConfig {
        &self.config
    }

    /// Register (or replace) the live provider.
    pub fn set_provider<P>(&self, provider: P)
    where
        P: CarbonIntensityProvider + 'static,
    {
        let mut slot = self.provider.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::new(provider));
    }

    /// Remove the live provider; conversions use the static default again.
    pub fn clear_provider(&self) {
        let mut slot = self.provider.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    /// Check if a live provider is registered.
    #[must_use]
    pub fn has_provider(&self) -> bool {
        self.provider
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Pick the intensity for one conversion.
    #[must_use]
    pub fn resolve_intensity(&self, explicit: Option<f64>) -> ResolvedIntensity {
        if let Some(value) = explicit {
            return ResolvedIntensity {
                value,
                source: IntensitySource::Explicit,
            };
        }

        let live = self
            .provider
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let default = ResolvedIntensity {
            value: self.config.default_intensity_g_per_kwh,
            source: IntensitySource::Default,
        };

        let Some(live) = live else {
            return default;
        };

        match provider::fetch_bounded(live, self.config.provider_timeout()) {
            Ok(value) => {
                debug!(intensity = value, "live carbon intensity");
                ResolvedIntensity {
                    value,
                    source: IntensitySource::Live,
                }
            }
            Err(error) => {
                warn!(
                    %error,
                    fallback = default.value,
                    "carbon intensity provider failed, using static default"
                );
                default
            }
        }
    }

    /// Emissions for `energy_kwh`, resolving the intensity as described above.
    #[must_use]
    pub fn to_carbon(&self, energy_kwh: f64, intensity: Option<f64>) -> f64 {
        to_carbon(energy_kwh, self.resolve_intensity(intensity).value)
    }

    /// Energy and emissions for averaged usage.
    ///
    /// A hardware reading supersedes the model estimate; the model's CPU and
    /// memory terms are reported either way.
    #[must_use]
    pub fn enrich(
        &self,
        usage: ResourceUsage,
        model: &EnergyModel,
        intensity_override: Option<f64>,
        real_energy_override: Option<f64>,
    ) -> EnrichedRecord {
        let cpu_energy_kwh = model.cpu_energy_kwh(usage.runtime_s);
        let memory_energy_kwh =
            model.memory_energy_kwh(bytes_to_mb(usage.memory_bytes), usage.runtime_s);

        let (energy_kwh, energy_source) = match real_energy_override {
            Some(real) => (real, EnergySource::Hardware),
            None => (cpu_energy_kwh + memory_energy_kwh, EnergySource::Estimated),
        };

        let intensity = self.resolve_intensity(intensity_override);
        EnrichedRecord {
            energy_kwh,
            carbon_gco2: to_carbon(energy_kwh, intensity.value),
            energy_source,
            cpu_energy_kwh,
            memory_energy_kwh,
            intensity_g_per_kwh: intensity.value,
            intensity_source: intensity.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_to_carbon() {
        assert!((to_carbon(0.05, 475.0) - 23.75).abs() < 1e-12);
        assert_eq!(to_carbon(0.0, 475.0), 0.0);
    }

    #[test]
    fn test_resolution_order() {
        let converter = CarbonConverter::default().with_provider(StaticIntensity(120.0));

        let explicit = converter.resolve_intensity(Some(10.0));
        assert_eq!(explicit.source, IntensitySource::Explicit);
        assert_eq!(explicit.value, 10.0);

        let live = converter.resolve_intensity(None);
        assert_eq!(live.source, IntensitySource::Live);
        assert_eq!(live.value, 120.0);

        converter.clear_provider();
        let fallback = converter.resolve_intensity(None);
        assert_eq!(fallback.source, IntensitySource::Default);
        assert_eq!(fallback.value, 475.0);
    }

    #[test]
    fn test_failing_provider_falls_back() {
        let converter = CarbonConverter::default();
        converter.set_provider(|| -> crate::Result<f64> { Err(Error::ProviderFailed("503".into())) });
        let expected = to_carbon(0.01, 475.0);
        assert!((converter.to_carbon(0.01, None) - expected).abs() < 1e-15);
    }

    #[test]
    fn test_nan_provider_falls_back() {
        let converter = CarbonConverter::default().with_provider(StaticIntensity(f64::NAN));
        assert_eq!(
            converter.resolve_intensity(None).source,
            IntensitySource::Default
        );
    }

    #[test]
    fn test_provider_lifecycle() {
        let converter = CarbonConverter::default();
        assert!(!converter.has_provider());
        converter.set_provider(StaticIntensity(1.0));
        assert!(converter.has_provider());
        converter.set_provider(StaticIntensity(2.0));
        assert_eq!(converter.resolve_intensity(None).value, 2.0);
        converter.clear_provider();
        assert!(!converter.has_provider());
    }

    #[test]
    fn test_enrich_estimated() {
        let converter = CarbonConverter::default();
        let usage = ResourceUsage {
            runtime_s: 3600.0,
            memory_bytes: 0.0,
        };
        let record = converter.enrich(usage, &EnergyModel::default(), None, None);
        assert_eq!(record.energy_source, EnergySource::Estimated);
        assert!((record.energy_kwh - 0.05).abs() < 1e-15);
        assert!((record.carbon_gco2 - 23.75).abs() < 1e-12);
        assert_eq!(record.intensity_source, IntensitySource::Default);
    }

    #[test]
    fn test_enrich_hardware_supersedes_estimate() {
        let converter = CarbonConverter::default();
        let usage = ResourceUsage {
            runtime_s: 3600.0,
            memory_bytes: 1024.0 * 1024.0,
        };
        let record = converter.enrich(usage, &EnergyModel::default(), Some(100.0), Some(0.2));
        assert_eq!(record.energy_source, EnergySource::Hardware);
        assert_eq!(record.energy_kwh, 0.2);
        assert!((record.carbon_gco2 - 20.0).abs() < 1e-12);
        assert!(record.cpu_energy_kwh > 0.0);
        assert_eq!(record.intensity_source, IntensitySource::Explicit);
    }

    #[test]
    fn test_energy_source_display() {
        assert_eq!(EnergySource::Hardware.to_string(), "hardware");
        assert_eq!(EnergySource::Estimated.to_string(), "estimated");
    }
}
