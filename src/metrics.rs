//! Metric reduction
//!
//! This module reduces a cleaned sample sequence into the session indices:
//! - Mean and maximum heart rate
//! - Mean HRV and HRV range
//! - RMSSD and SDNN (time-domain variability)
//!
//! Every statistic is available as a standalone function over `&[f64]`. All of
//! them reject empty input, and RMSSD/SDNN also reject a single value. A result
//! that overflows to infinity is an error, so no NaN or infinity can leak into
//! a report.

use crate::error::ComputeError;
use crate::types::{MetricsReport, Sample};
use tracing::info;

/// Placeholder recovery estimate reported for every session (minutes)
pub const RECOVERY_TIME_PLACEHOLDER_MIN: u32 = 30;

/// Minimum number of samples needed for successive-difference statistics
pub const MIN_SAMPLES_FOR_VARIABILITY: usize = 2;

/// Reducer for computing a metrics report
pub struct MetricsReducer;

impl MetricsReducer {
    /// Reduce samples into a report.
    ///
    /// Fails with [`ComputeError::EmptySeries`] for no samples and
    /// [`ComputeError::DegenerateInput`] for a single sample.
    pub fn reduce(samples: &[Sample]) -> Result<MetricsReport, ComputeError> {
        if samples.is_empty() {
            return Err(ComputeError::EmptySeries);
        }
        require_variability_samples(samples.len())?;

        let hr: Vec<f64> = samples.iter().map(|s| s.hr).collect();
        let hrv: Vec<f64> = samples.iter().map(|s| s.hrv).collect();

        let mean_hr = mean(&hr)?;
        let max_hr = max(&hr)?;
        let mean_hrv = mean(&hrv)?;
        let hrv_range = range(&hrv)?;
        let rmssd = rmssd(&hrv)?;
        let sdnn = sdnn(&hrv)?;

        let report = MetricsReport {
            mean_hr: ensure_finite("meanHR", round_to_tenth(mean_hr))?,
            max_hr,
            rmssd: ensure_finite("rmssd", round_to_tenth(rmssd))?,
            hrv_range: ensure_finite("hrvRange", round_to_tenth(hrv_range))?,
            mean_hrv: ensure_finite("meanHRV", round_to_tenth(mean_hrv))?,
            sdnn: ensure_finite("sdnn", round_to_tenth(sdnn))?,
            recovery_time_min: RECOVERY_TIME_PLACEHOLDER_MIN,
        };

        info!(
            samples = samples.len(),
            mean_hr = report.mean_hr,
            rmssd = report.rmssd,
            sdnn = report.sdnn,
            "reduced session metrics"
        );

        Ok(report)
    }
}

/// Round half away from zero to one decimal place
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Result<f64, ComputeError> {
    if values.is_empty() {
        return Err(ComputeError::EmptySeries);
    }
    ensure_finite("mean", values.iter().sum::<f64>() / values.len() as f64)
}

/// Largest value
pub fn max(values: &[f64]) -> Result<f64, ComputeError> {
    values
        .iter()
        .copied()
        .reduce(f64::max)
        .ok_or(ComputeError::EmptySeries)
}

/// Smallest value
pub fn min(values: &[f64]) -> Result<f64, ComputeError> {
    values
        .iter()
        .copied()
        .reduce(f64::min)
        .ok_or(ComputeError::EmptySeries)
}

/// max - min
pub fn range(values: &[f64]) -> Result<f64, ComputeError> {
    ensure_finite("range", max(values)? - min(values)?)
}

/// Root mean square of successive differences, divisor n - 1
pub fn rmssd(values: &[f64]) -> Result<f64, ComputeError> {
    if values.is_empty() {
        return Err(ComputeError::EmptySeries);
    }
    require_variability_samples(values.len())?;

    let sum_sq: f64 = values
        .windows(2)
        .map(|pair| {
            let diff = pair[1] - pair[0];
            diff * diff
        })
        .sum();

    ensure_finite("rmssd", (sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Sample standard deviation (Bessel-corrected)
pub fn sdnn(values: &[f64]) -> Result<f64, ComputeError> {
    let mean = mean(values)?;
    require_variability_samples(values.len())?;

    let sum_sq: f64 = values
        .iter()
        .map(|v| {
            let dev = v - mean;
            dev * dev
        })
        .sum();

    ensure_finite("sdnn", (sum_sq / (values.len() - 1) as f64).sqrt())
}

fn ensure_finite(statistic: &'static str, value: f64) -> Result<f64, ComputeError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ComputeError::NonFiniteResult { statistic })
    }
}

fn require_variability_samples(found: usize) -> Result<(), ComputeError> {
    if found < MIN_SAMPLES_FOR_VARIABILITY {
        return Err(ComputeError::DegenerateInput {
            required: MIN_SAMPLES_FOR_VARIABILITY,
            found,
        });
    }
    Ok(())
}
