//! Core types for the Holter Flux pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: parsed samples, parse statistics, the metrics report, derived
//! guidelines and risk assessment, and the encoded analysis payload.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Time string emitted when a row's timestamp cannot be parsed
pub const INVALID_TIME: &str = "Invalid Date";

/// One heart-rate observation from a session log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Time of day for display (`HH:MM:SS`, or [`INVALID_TIME`])
    pub time: String,
    /// Parsed wall-clock timestamp, absent when the field did not parse
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
    /// Heart rate (bpm), always finite
    pub hr: f64,
    /// Heart-rate variability (ms), zero when missing or unparsable
    pub hrv: f64,
}

impl Sample {
    /// Whether the timestamp field parsed
    pub fn has_valid_time(&self) -> bool {
        self.timestamp.is_some()
    }
}

/// Row accounting for one parse pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    /// Non-blank data rows seen after the header
    pub rows_read: usize,
    /// Rows kept as samples
    pub rows_retained: usize,
    /// Rows dropped because the HR field did not parse
    pub rows_dropped: usize,
    /// Blank rows skipped before parsing
    pub blank_rows: usize,
    /// Retained rows whose timestamp did not parse
    pub invalid_timestamps: usize,
}

/// Header names the row parser matched for each required column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumns {
    pub timestamp: String,
    pub hr: String,
    pub hrv: String,
}

/// Samples and statistics produced by the row parser
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSession {
    pub samples: Vec<Sample>,
    pub stats: ParseStats,
    pub columns: ResolvedColumns,
}

/// Aggregate indices for one session
///
/// Field names on the wire follow the monitor's display names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Mean heart rate (bpm), one decimal
    #[serde(rename = "meanHR")]
    pub mean_hr: f64,
    /// Maximum heart rate (bpm), exact
    #[serde(rename = "maxHR")]
    pub max_hr: f64,
    /// Root mean square of successive HRV differences (ms), one decimal
    pub rmssd: f64,
    /// max(HRV) - min(HRV) (ms), one decimal
    #[serde(rename = "hrvRange")]
    pub hrv_range: f64,
    /// Mean HRV including zero-defaulted readings (ms), one decimal
    #[serde(rename = "meanHRV")]
    pub mean_hrv: f64,
    /// Sample standard deviation of HRV (ms), one decimal
    pub sdnn: f64,
    /// Recovery estimate in minutes (placeholder constant)
    #[serde(rename = "recoveryTime")]
    pub recovery_time_min: u32,
}

/// Heart-rate guidelines derived from the mean heart rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guidelines {
    /// Target ceiling for activity (bpm)
    pub target_hr_bpm: i64,
    /// Stop activity above this rate (bpm)
    pub stop_hr_bpm: i64,
    /// Suggested rest duration (minutes)
    pub rest_minutes: i64,
}

/// Three-level risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Low => "low",
            RiskBand::Moderate => "moderate",
            RiskBand::High => "high",
        }
    }
}

/// One classified indicator with its gauge fill level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gauge {
    /// Metric value the band was computed from
    pub value: f64,
    pub band: RiskBand,
    /// Gauge fill fraction in [0, 1]
    pub fill: f64,
}

/// Autonomic load and post-exertional risk indicators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Sympathetic load from mean HR
    pub sympathetic_load: Gauge,
    /// Parasympathetic withdrawal from RMSSD
    pub parasympathetic: Gauge,
    /// Post-exertional malaise risk from mean HRV
    pub pem_risk: Gauge,
}

/// Caller-owned result of one analysis pass
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub samples: Vec<Sample>,
    pub report: MetricsReport,
    pub stats: ParseStats,
}

// ============================================================================
// Encoded payload
// ============================================================================

/// Versioned JSON payload for one analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisPayload {
    pub schema_version: String,
    pub producer: AnalysisProducer,
    pub computed_at_utc: String,
    pub source: AnalysisSource,
    pub metrics: MetricsReport,
    pub guidelines: Guidelines,
    pub assessment: Assessment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<Sample>>,
}

/// Producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Source data accounting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSource {
    pub rows_read: usize,
    pub rows_retained: usize,
    pub rows_dropped: usize,
    pub blank_rows: usize,
    pub invalid_timestamps: usize,
    /// First and last parsed timestamps, when any parsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_timestamp: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_timestamp: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_wire_names() {
        let report = MetricsReport {
            mean_hr: 80.0,
            max_hr: 90.0,
            rmssd: 10.0,
            hrv_range: 20.0,
            mean_hrv: 50.0,
            sdnn: 10.0,
            recovery_time_min: 30,
        };

        let value = serde_json::to_value(report).unwrap();
        assert_eq!(value["meanHR"], 80.0);
        assert_eq!(value["maxHR"], 90.0);
        assert_eq!(value["hrvRange"], 20.0);
        assert_eq!(value["meanHRV"], 50.0);
        assert_eq!(value["recoveryTime"], 30);
    }

    #[test]
    fn test_sample_omits_missing_timestamp() {
        let sample = Sample {
            time: INVALID_TIME.to_string(),
            timestamp: None,
            hr: 72.0,
            hrv: 0.0,
        };

        let value = serde_json::to_value(&sample).unwrap();
        assert!(value.get("timestamp").is_none());
        assert_eq!(value["time"], "Invalid Date");
        assert!(!sample.has_valid_time());
    }

    #[test]
    fn test_risk_band_serialization() {
        assert_eq!(serde_json::to_string(&RiskBand::Moderate).unwrap(), "\"moderate\"");
        assert_eq!(RiskBand::High.as_str(), "high");
    }
}
