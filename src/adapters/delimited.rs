//! Delimited session log adapter
//!
//! Parses header-bearing, delimiter-separated exports (`;` by default) and maps
//! each row to a [`Sample`]. Rows whose heart rate does not parse are dropped
//! silently; HRV falls back to zero and never causes a drop.

use crate::config::ParserConfig;
use crate::error::ComputeError;
use crate::types::{ParseStats, ParsedSession, ResolvedColumns, Sample, INVALID_TIME};
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, trace};

use super::fields::{parse_hr, parse_hrv, parse_timestamp, render_time};
use super::{check_input_size, SessionLogAdapter};

const UTF8_BOM: char = '\u{feff}';

/// Adapter for delimiter-separated monitor exports
#[derive(Debug, Clone)]
pub struct DelimitedLogAdapter {
    config: ParserConfig,
}

impl Default for DelimitedLogAdapter {
    fn default() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }
}

impl DelimitedLogAdapter {
    /// Create an adapter with validated settings
    pub fn new(config: ParserConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl SessionLogAdapter for DelimitedLogAdapter {
    fn parse(&self, text: &str) -> Result<ParsedSession, ComputeError> {
        check_input_size(text.len(), self.config.max_input_bytes)?;

        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

        let mut reader = ReaderBuilder::new()
            .delimiter(self.config.delimiter_byte())
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(ComputeError::ParseError("missing header row".to_string()));
        }

        let layout = ColumnLayout::resolve(&headers, &self.config)?;

        let mut samples = Vec::new();
        // the csv reader skips empty lines without yielding a record
        let mut stats = ParseStats {
            blank_rows: count_empty_lines(text),
            ..ParseStats::default()
        };

        for record in reader.records() {
            let record = record?;

            if record.iter().all(|field| field.trim().is_empty()) {
                stats.blank_rows += 1;
                continue;
            }
            stats.rows_read += 1;

            match layout.parse_row(&record) {
                Some(sample) => {
                    if !sample.has_valid_time() {
                        stats.invalid_timestamps += 1;
                    }
                    samples.push(sample);
                }
                None => {
                    stats.rows_dropped += 1;
                    debug!(
                        line = record.position().map(|p| p.line()),
                        hr = record.get(layout.hr).unwrap_or_default(),
                        "dropping row with unparsable heart rate"
                    );
                }
            }
        }

        stats.rows_retained = samples.len();

        trace!(
            rows_read = stats.rows_read,
            rows_retained = stats.rows_retained,
            rows_dropped = stats.rows_dropped,
            "parsed session log"
        );

        Ok(ParsedSession {
            samples,
            stats,
            columns: layout.names(&headers),
        })
    }

    fn max_input_bytes(&self) -> usize {
        self.config.max_input_bytes
    }
}

/// Count physical lines that are empty and not inside a quoted field
fn count_empty_lines(text: &str) -> usize {
    let mut in_quotes = false;
    let mut count = 0;

    for line in text.lines() {
        if !in_quotes && line.is_empty() {
            count += 1;
        }
        if line.matches('"').count() % 2 == 1 {
            in_quotes = !in_quotes;
        }
    }

    count
}

/// Column indices of the required fields
struct ColumnLayout {
    timestamp: usize,
    hr: usize,
    hrv: usize,
}

impl ColumnLayout {
    fn resolve(headers: &StringRecord, config: &ParserConfig) -> Result<Self, ComputeError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name.trim());

        let timestamp = find(&config.timestamp_column)
            .or_else(|| {
                headers
                    .iter()
                    .position(|h| h.to_ascii_lowercase().contains("timestamp"))
            })
            .ok_or_else(|| ComputeError::MissingColumn(config.timestamp_column.clone()))?;

        let hr = find(&config.hr_column)
            .ok_or_else(|| ComputeError::MissingColumn(config.hr_column.clone()))?;

        let hrv = find(&config.hrv_column)
            .ok_or_else(|| ComputeError::MissingColumn(config.hrv_column.clone()))?;

        Ok(Self { timestamp, hr, hrv })
    }

    fn names(&self, headers: &StringRecord) -> ResolvedColumns {
        let name = |idx: usize| headers.get(idx).unwrap_or_default().trim().to_string();
        ResolvedColumns {
            timestamp: name(self.timestamp),
            hr: name(self.hr),
            hrv: name(self.hrv),
        }
    }

    /// Map one record to a sample, or `None` when its heart rate is unusable
    fn parse_row(&self, record: &StringRecord) -> Option<Sample> {
        let hr = record.get(self.hr).and_then(parse_hr)?;

        let timestamp = record.get(self.timestamp).and_then(parse_timestamp);
        let time = timestamp
            .as_ref()
            .map(render_time)
            .unwrap_or_else(|| INVALID_TIME.to_string());

        Some(Sample {
            time,
            timestamp,
            hr,
            hrv: parse_hrv(record.get(self.hrv)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "Phone timestamp;sensor timestamp [ns];HR [bpm];HRV [ms]";

    fn parse(text: &str) -> Result<ParsedSession, ComputeError> {
        DelimitedLogAdapter::default().parse(text)
    }

    #[test]
    fn test_parses_rows_in_order() {
        let text = format!(
            "{}\n2024-01-15T10:00:00.000;1;70;40\n2024-01-15T10:00:01.000;2;80;50\n2024-01-15T10:00:02.000;3;90;60\n",
            HEADER
        );

        let session = parse(&text).unwrap();
        let values: Vec<(f64, f64)> = session.samples.iter().map(|s| (s.hr, s.hrv)).collect();
        assert_eq!(values, vec![(70.0, 40.0), (80.0, 50.0), (90.0, 60.0)]);
        assert_eq!(session.samples[0].time, "10:00:00");
        assert_eq!(session.samples[2].time, "10:00:02");
        assert_eq!(session.stats.rows_read, 3);
        assert_eq!(session.stats.rows_retained, 3);
        assert_eq!(session.stats.rows_dropped, 0);
    }

    #[test]
    fn test_drops_unparsable_hr() {
        let text = format!(
            "{}\n2024-01-15T10:00:00;1;abc;40\n2024-01-15T10:00:01;2;75;45\n",
            HEADER
        );

        let session = parse(&text).unwrap();
        assert_eq!(session.samples.len(), 1);
        assert_eq!(session.samples[0].hr, 75.0);
        assert_eq!(session.stats.rows_dropped, 1);
        assert_eq!(session.stats.rows_read, 2);
    }

    #[test]
    fn test_missing_hrv_retained_as_zero() {
        let text = format!(
            "{}\n2024-01-15T10:00:00;1;70;\n2024-01-15T10:00:01;2;72\n",
            HEADER
        );

        let session = parse(&text).unwrap();
        assert_eq!(session.samples.len(), 2);
        assert!(session.samples.iter().all(|s| s.hrv == 0.0));
    }

    #[test]
    fn test_decimal_comma_hrv() {
        let text = format!(
            "{}\n2024-01-15T10:00:00;1;70;12,5\n2024-01-15T10:00:01;2;71;12.5\n",
            HEADER
        );

        let session = parse(&text).unwrap();
        assert_eq!(session.samples[0].hrv, 12.5);
        assert_eq!(session.samples[0].hrv, session.samples[1].hrv);
    }

    #[test]
    fn test_invalid_timestamp_keeps_row() {
        let text = format!("{}\nnot-a-date;1;70;40\n", HEADER);

        let session = parse(&text).unwrap();
        assert_eq!(session.samples.len(), 1);
        assert_eq!(session.samples[0].time, INVALID_TIME);
        assert_eq!(session.samples[0].timestamp, None);
        assert_eq!(session.stats.invalid_timestamps, 1);
    }

    #[test]
    fn test_blank_rows_skipped() {
        let text = format!(
            "{}\n2024-01-15T10:00:00;1;70;40\n\n;;;\n2024-01-15T10:00:01;2;72;41\n",
            HEADER
        );

        let session = parse(&text).unwrap();
        assert_eq!(session.samples.len(), 2);
        assert_eq!(session.stats.rows_read, 2);
        assert_eq!(session.stats.rows_dropped, 0);
        assert_eq!(session.stats.blank_rows, 2);
    }

    #[test]
    fn test_every_empty_line_is_counted() {
        let text = format!(
            "{}\n2024-01-15T10:00:00;1;70;40\n\n\n\n2024-01-15T10:00:01;2;72;41\r\n\r\n",
            HEADER
        );

        let session = parse(&text).unwrap();
        assert_eq!(session.stats.rows_read, 2);
        assert_eq!(session.stats.blank_rows, 4);
    }

    #[test]
    fn test_empty_line_inside_quoted_field_is_not_blank() {
        let text = format!(
            "{}\n2024-01-15T10:00:00;\"note\n\nmore\";70;40\n2024-01-15T10:00:01;2;72;41\n",
            HEADER
        );

        let session = parse(&text).unwrap();
        assert_eq!(session.stats.rows_read, 2);
        assert_eq!(session.stats.blank_rows, 0);
    }

    #[test]
    fn test_header_only_yields_empty_session() {
        let session = parse(&format!("{}\n", HEADER)).unwrap();
        assert!(session.samples.is_empty());
        assert_eq!(session.stats, ParseStats::default());
    }

    #[test]
    fn test_missing_hr_column_fails() {
        let result = parse("Phone timestamp;HRV [ms]\n2024-01-15T10:00:00;40\n");
        match result {
            Err(ComputeError::MissingColumn(name)) => assert_eq!(name, "HR [bpm]"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_hrv_column_fails() {
        let result = parse("Phone timestamp;HR [bpm]\n2024-01-15T10:00:00;70\n");
        assert!(matches!(result, Err(ComputeError::MissingColumn(_))));
    }

    #[test]
    fn test_empty_input_fails() {
        let result = parse("");
        assert!(matches!(result, Err(ComputeError::ParseError(_))));
    }

    #[test]
    fn test_comma_separated_file_is_rejected_by_default() {
        let result = parse("Phone timestamp,HR [bpm],HRV [ms]\n2024-01-15T10:00:00,70,40\n");
        assert!(matches!(result, Err(ComputeError::MissingColumn(_))));
    }

    #[test]
    fn test_timestamp_column_fallback() {
        let text = "Device Timestamp;HR [bpm];HRV [ms]\n2024-01-15T08:15:00;66;30\n";

        let session = parse(text).unwrap();
        assert_eq!(session.columns.timestamp, "Device Timestamp");
        assert_eq!(session.samples[0].time, "08:15:00");
    }

    #[test]
    fn test_bom_and_padded_headers() {
        let text = "\u{feff}Phone timestamp ; HR [bpm] ; HRV [ms]\n2024-01-15T10:00:00;70;40\n";

        let session = parse(text).unwrap();
        assert_eq!(
            session.columns,
            ResolvedColumns {
                timestamp: "Phone timestamp".to_string(),
                hr: "HR [bpm]".to_string(),
                hrv: "HRV [ms]".to_string(),
            }
        );
        assert_eq!(session.samples.len(), 1);
    }

    #[test]
    fn test_custom_delimiter_and_columns() {
        let config = ParserConfig {
            delimiter: ',',
            timestamp_column: "time".to_string(),
            hr_column: "hr".to_string(),
            hrv_column: "hrv".to_string(),
            ..Default::default()
        };
        let adapter = DelimitedLogAdapter::new(config).unwrap();

        let session = adapter
            .parse("time,hr,hrv\n2024-01-15 07:00:00,61,\"55,5\"\n")
            .unwrap();
        assert_eq!(session.samples[0].hr, 61.0);
        assert_eq!(session.samples[0].hrv, 55.5);
    }

    #[test]
    fn test_input_size_limit() {
        let config = ParserConfig {
            max_input_bytes: 16,
            ..Default::default()
        };
        let adapter = DelimitedLogAdapter::new(config).unwrap();

        let result = adapter.parse(&format!("{}\n2024-01-15T10:00:00;1;70;40\n", HEADER));
        assert!(matches!(
            result,
            Err(ComputeError::InputTooLarge { limit: 16, .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_bytes() {
        let mut bytes = format!("{}\n", HEADER).into_bytes();
        bytes.extend_from_slice(&[0xff, 0xfe, b';', b'7', b'0']);

        let result = DelimitedLogAdapter::default().parse_bytes(&bytes);
        assert!(matches!(result, Err(ComputeError::InvalidEncoding(_))));
    }
}
