//! Live carbon-intensity providers

use crate::{Error, Result};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

/// External grid carbon-intensity feed (gCO2/kWh).
///
/// Any `Fn() -> Result<f64>` closure is a provider.
///
/// # Example
///
/// ```rust
/// use carbon_optimizer::carbon::CarbonIntensityProvider;
///
/// let provider = || -> carbon_optimizer::Result<f64> { Ok(212.0) };
/// assert_eq!(provider.intensity_g_per_kwh()?, 212.0);
/// # Ok::<(), carbon_optimizer::Error>(())
/// ```
pub trait CarbonIntensityProvider: Send + Sync {
    /// Current intensity.
    ///
    /// # Errors
    /// Any error; the converter recovers by using its static default.
    fn intensity_g_per_kwh(&self) -> Result<f64>;
}

impl<F> CarbonIntensityProvider for F
where
    F: Fn() -> Result<f64> + Send + Sync,
{
    fn intensity_g_per_kwh(&self) -> Result<f64> {
        self()
    }
}

/// Provider that always reports the same value (regional averages, tests).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticIntensity(pub f64);

impl CarbonIntensityProvider for StaticIntensity {
    fn intensity_g_per_kwh(&self) -> Result<f64> {
        Ok(self.0)
    }
}

/// Ask `provider` for a value, giving up after `timeout`.
///
/// Outside an async runtime the lookup runs on tokio's blocking pool under a
/// private current-thread runtime, which is shut down in the background so a
/// hung feed is abandoned. Inside a runtime (`block_on` would panic there)
/// the lookup gets its own thread and a bounded channel wait instead.
/// Panics inside the provider surface as `ProviderFailed`.
pub(crate) fn fetch_bounded(
    provider: Arc<dyn CarbonIntensityProvider>,
    timeout: Duration,
) -> Result<f64> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return fetch_on_thread(provider, timeout);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    let outcome = runtime.block_on(async move {
        let lookup = tokio::task::spawn_blocking(move || provider.intensity_g_per_kwh());
        tokio::time::timeout(timeout, lookup).await
    });
    runtime.shutdown_background();

    match outcome {
        Err(_) => Err(Error::ProviderTimeout(timeout)),
        Ok(Err(join_error)) => Err(Error::ProviderFailed(format!(
            "provider panicked: {join_error}"
        ))),
        Ok(Ok(reading)) => reading.and_then(validate_intensity),
    }
}

fn fetch_on_thread(provider: Arc<dyn CarbonIntensityProvider>, timeout: Duration) -> Result<f64> {
    let (tx, rx) = mpsc::sync_channel(1);
    std::thread::Builder::new()
        .name("carbon-intensity".into())
        .spawn(move || {
            // Receiver may be gone after a timeout
            let _ = tx.send(provider.intensity_g_per_kwh());
        })?;

    match rx.recv_timeout(timeout) {
        Ok(reading) => reading.and_then(validate_intensity),
        Err(RecvTimeoutError::Timeout) => Err(Error::ProviderTimeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => {
            Err(Error::ProviderFailed("provider panicked".into()))
        }
    }
}

/// Reject readings that are not usable intensities.
pub(crate) fn validate_intensity(value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::ProviderFailed(format!(
            "not a valid intensity: {value}"
        )))
    }
}
