//! Guidelines and risk assessment
//!
//! Pure derivations from a [`MetricsReport`]:
//! - Heart-rate guidelines (target, stop, rest)
//! - Sympathetic load from mean HR
//! - Parasympathetic withdrawal from RMSSD
//! - Post-exertional malaise (PEM) risk from mean HRV

use crate::types::{Assessment, Gauge, Guidelines, MetricsReport, RiskBand};

const TARGET_HR_FACTOR: f64 = 1.10;
const STOP_HR_FACTOR: f64 = 1.15;
const REST_MINUTES_FACTOR: f64 = 0.10;

// Mean HR (bpm): above HIGH is high load, above MODERATE is moderate
const SYMPATHETIC_HIGH_BPM: f64 = 85.0;
const SYMPATHETIC_MODERATE_BPM: f64 = 75.0;
const SYMPATHETIC_FULL_SCALE_BPM: f64 = 100.0;

// RMSSD (ms): below HIGH is high strain, below MODERATE is moderate
const PARASYMPATHETIC_HIGH_MS: f64 = 10.0;
const PARASYMPATHETIC_MODERATE_MS: f64 = 20.0;
const PARASYMPATHETIC_FULL_SCALE_MS: f64 = 30.0;

// Mean HRV (ms): below HIGH is high risk, below MODERATE is moderate
const PEM_HIGH_MS: f64 = 20.0;
const PEM_MODERATE_MS: f64 = 30.0;
const PEM_FULL_SCALE_MS: f64 = 50.0;

impl Guidelines {
    /// Derive guidelines from the report's (rounded) mean heart rate
    pub fn from_report(report: &MetricsReport) -> Self {
        let mean_hr = report.mean_hr;
        Self {
            target_hr_bpm: (mean_hr * TARGET_HR_FACTOR).round() as i64,
            stop_hr_bpm: (mean_hr * STOP_HR_FACTOR).round() as i64,
            rest_minutes: (mean_hr * REST_MINUTES_FACTOR).round() as i64,
        }
    }
}

impl Assessment {
    pub fn from_report(report: &MetricsReport) -> Self {
        Self {
            sympathetic_load: sympathetic_load(report.mean_hr),
            parasympathetic: parasympathetic(report.rmssd),
            pem_risk: pem_risk(report.mean_hrv),
        }
    }

    /// Highest band across all indicators
    pub fn worst_band(&self) -> RiskBand {
        [
            self.sympathetic_load.band,
            self.parasympathetic.band,
            self.pem_risk.band,
        ]
        .into_iter()
        .max_by_key(|band| band_rank(*band))
        .unwrap_or(RiskBand::Low)
    }
}

/// Sympathetic load: higher mean HR is worse
pub fn sympathetic_load(mean_hr: f64) -> Gauge {
    let band = if mean_hr > SYMPATHETIC_HIGH_BPM {
        RiskBand::High
    } else if mean_hr > SYMPATHETIC_MODERATE_BPM {
        RiskBand::Moderate
    } else {
        RiskBand::Low
    };

    Gauge {
        value: mean_hr,
        band,
        fill: fill_fraction(mean_hr, SYMPATHETIC_FULL_SCALE_BPM),
    }
}

/// Parasympathetic withdrawal: lower RMSSD is worse
pub fn parasympathetic(rmssd: f64) -> Gauge {
    let band = if rmssd < PARASYMPATHETIC_HIGH_MS {
        RiskBand::High
    } else if rmssd < PARASYMPATHETIC_MODERATE_MS {
        RiskBand::Moderate
    } else {
        RiskBand::Low
    };

    Gauge {
        value: rmssd,
        band,
        fill: fill_fraction(rmssd, PARASYMPATHETIC_FULL_SCALE_MS),
    }
}

/// PEM risk: lower mean HRV is worse
pub fn pem_risk(mean_hrv: f64) -> Gauge {
    let band = if mean_hrv < PEM_HIGH_MS {
        RiskBand::High
    } else if mean_hrv < PEM_MODERATE_MS {
        RiskBand::Moderate
    } else {
        RiskBand::Low
    };

    Gauge {
        value: mean_hrv,
        band,
        fill: fill_fraction(mean_hrv, PEM_FULL_SCALE_MS),
    }
}

fn fill_fraction(value: f64, full_scale: f64) -> f64 {
    (value / full_scale).clamp(0.0, 1.0)
}

fn band_rank(band: RiskBand) -> u8 {
    match band {
        RiskBand::Low => 0,
        RiskBand::Moderate => 1,
        RiskBand::High => 2,
    }
}
