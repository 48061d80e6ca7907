//! Pipeline orchestration
//!
//! This module provides the public API for Holter Flux.
//! It runs the full pass from raw session log text to a metrics report and,
//! optionally, an encoded JSON payload.

use crate::adapters::{read_bounded, DelimitedLogAdapter, SessionLogAdapter};
use crate::config::EngineConfig;
use crate::encoder::ReportEncoder;
use crate::error::ComputeError;
use crate::metrics::MetricsReducer;
use crate::types::{Analysis, ParsedSession};
use std::io::Read;
use tracing::warn;

/// Analyze a session log with the default export format.
///
/// # Arguments
/// * `text` - Raw contents of a `;`-delimited monitor export
///
/// # Returns
/// The cleaned samples, the metrics report and parse accounting
///
/// # Example
/// ```ignore
/// let analysis = analyze_session_log(&std::fs::read_to_string("session.txt")?)?;
/// println!("RMSSD: {} ms", analysis.report.rmssd);
/// ```
pub fn analyze_session_log(text: &str) -> Result<Analysis, ComputeError> {
    let adapter = DelimitedLogAdapter::default();
    process_session_log(&adapter, text)
}

/// Analyze a session log and encode the result as a JSON payload.
///
/// # Example
/// ```ignore
/// let payload = session_log_to_json(raw_text)?;
/// ```
pub fn session_log_to_json(text: String) -> Result<String, ComputeError> {
    let analysis = analyze_session_log(&text)?;
    ReportEncoder::new().encode_to_json(&analysis)
}

/// Run one session log through the pipeline.
///
/// Pipeline stages:
/// 1. SessionLogAdapter - Decode rows into samples
/// 2. MetricsReducer - Reduce samples into a report
fn process_session_log(
    adapter: &dyn SessionLogAdapter,
    text: &str,
) -> Result<Analysis, ComputeError> {
    let parsed = adapter.parse(text)?;
    reduce_parsed(parsed)
}

fn reduce_parsed(parsed: ParsedSession) -> Result<Analysis, ComputeError> {
    let ParsedSession { samples, stats, .. } = parsed;

    if stats.rows_dropped > 0 {
        warn!(
            dropped = stats.rows_dropped,
            read = stats.rows_read,
            "rows without a valid heart rate were skipped"
        );
    }

    let report = MetricsReducer::reduce(&samples)?;

    Ok(Analysis {
        samples,
        report,
        stats,
    })
}

/// Configured processor for repeated analyses.
///
/// Holds only immutable settings; every call produces an independent
/// [`Analysis`], so one processor can serve concurrent callers by reference.
pub struct HolterProcessor {
    adapter: DelimitedLogAdapter,
    encoder: ReportEncoder,
}

impl Default for HolterProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl HolterProcessor {
    /// Create a new processor with default settings
    pub fn new() -> Self {
        Self {
            adapter: DelimitedLogAdapter::default(),
            encoder: ReportEncoder::new(),
        }
    }

    /// Create a processor from validated configuration
    pub fn with_config(config: EngineConfig) -> Result<Self, ComputeError> {
        let adapter = DelimitedLogAdapter::new(config.parser)?;
        Ok(Self {
            adapter,
            encoder: ReportEncoder::new().include_samples(config.include_samples),
        })
    }

    /// Create a processor from a JSON configuration document
    pub fn from_config_json(json: &str) -> Result<Self, ComputeError> {
        Self::with_config(EngineConfig::from_json(json)?)
    }

    /// Parse a stream only, reading no more than the configured input bound
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<ParsedSession, ComputeError> {
        let bytes = read_bounded(reader, self.adapter.max_input_bytes())?;
        self.adapter.parse_bytes(&bytes)
    }

    /// Analyze session log text
    pub fn analyze(&self, text: &str) -> Result<Analysis, ComputeError> {
        process_session_log(&self.adapter, text)
    }

    /// Analyze raw bytes, which must be UTF-8
    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<Analysis, ComputeError> {
        let parsed = self.adapter.parse_bytes(bytes)?;
        reduce_parsed(parsed)
    }

    /// Analyze a stream, reading no more than the configured input bound
    pub fn analyze_reader<R: Read>(&self, reader: R) -> Result<Analysis, ComputeError> {
        let parsed = self.parse_reader(reader)?;
        reduce_parsed(parsed)
    }

    /// Analyze raw bytes and encode to JSON
    pub fn analyze_bytes_to_json(&self, bytes: &[u8]) -> Result<String, ComputeError> {
        let analysis = self.analyze_bytes(bytes)?;
        self.encoder.encode_to_json(&analysis)
    }

    /// Upper bound on accepted input size in bytes
    pub fn max_input_bytes(&self) -> usize {
        self.adapter.max_input_bytes()
    }

    /// Analyze and encode to JSON
    pub fn analyze_to_json(&self, text: &str) -> Result<String, ComputeError> {
        let analysis = self.analyze(text)?;
        self.encoder.encode_to_json(&analysis)
    }

    pub fn encoder(&self) -> &ReportEncoder {
        &self.encoder
    }
}
