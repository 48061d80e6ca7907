//! Analysis encoding
//!
//! This module encodes an [`Analysis`] into a versioned JSON payload carrying
//! producer metadata, parse accounting, the metrics report, guidelines and the
//! risk assessment.

use crate::error::ComputeError;
use crate::types::{
    Analysis, AnalysisPayload, AnalysisProducer, AnalysisSource, Assessment, Guidelines,
};
use crate::{FLUX_VERSION, PRODUCER_NAME};
use chrono::Utc;
use uuid::Uuid;

/// Current analysis payload schema version
pub const ANALYSIS_SCHEMA_VERSION: &str = "holter.analysis.v1";

/// Encoder for producing analysis payloads
pub struct ReportEncoder {
    instance_id: String,
    include_samples: bool,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
            include_samples: false,
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self {
            instance_id,
            include_samples: false,
        }
    }

    /// Embed the cleaned sample sequence in encoded payloads
    pub fn include_samples(mut self, include: bool) -> Self {
        self.include_samples = include;
        self
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Encode an analysis into a payload
    pub fn encode(&self, analysis: &Analysis) -> AnalysisPayload {
        let stats = &analysis.stats;
        let mut timestamps = analysis.samples.iter().filter_map(|s| s.timestamp);
        let first_timestamp = timestamps.next();
        let last_timestamp = timestamps.last().or(first_timestamp);

        AnalysisPayload {
            schema_version: ANALYSIS_SCHEMA_VERSION.to_string(),
            producer: AnalysisProducer {
                name: PRODUCER_NAME.to_string(),
                version: FLUX_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            source: AnalysisSource {
                rows_read: stats.rows_read,
                rows_retained: stats.rows_retained,
                rows_dropped: stats.rows_dropped,
                blank_rows: stats.blank_rows,
                invalid_timestamps: stats.invalid_timestamps,
                first_timestamp,
                last_timestamp,
            },
            metrics: analysis.report,
            guidelines: Guidelines::from_report(&analysis.report),
            assessment: Assessment::from_report(&analysis.report),
            samples: self.include_samples.then(|| analysis.samples.clone()),
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(&self, analysis: &Analysis) -> Result<String, ComputeError> {
        let payload = self.encode(analysis);
        Ok(serde_json::to_string(&payload)?)
    }

    /// Encode to pretty-printed JSON string
    pub fn encode_to_json_pretty(&self, analysis: &Analysis) -> Result<String, ComputeError> {
        let payload = self.encode(analysis);
        Ok(serde_json::to_string_pretty(&payload)?)
    }
}
