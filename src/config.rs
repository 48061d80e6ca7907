//! Engine configuration
//!
//! Defaults match the monitor's export format. Every field can be overridden
//! from a JSON document; omitted fields keep their defaults.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};

/// Default upper bound on accepted input size (32 MiB)
pub const DEFAULT_MAX_INPUT_BYTES: usize = 32 * 1024 * 1024;

/// Row parser settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Field delimiter (single ASCII character)
    pub delimiter: char,
    /// Header name of the timestamp column
    pub timestamp_column: String,
    /// Header name of the heart-rate column
    pub hr_column: String,
    /// Header name of the HRV column
    pub hrv_column: String,
    /// Inputs larger than this are rejected before parsing
    pub max_input_bytes: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: ';',
            timestamp_column: "Phone timestamp".to_string(),
            hr_column: "HR [bpm]".to_string(),
            hrv_column: "HRV [ms]".to_string(),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

impl ParserConfig {
    /// Check the settings can drive a parse
    pub fn validate(&self) -> Result<(), ComputeError> {
        if !self.delimiter.is_ascii() || self.delimiter == '"' {
            return Err(ComputeError::ConfigError(format!(
                "delimiter must be a single ASCII character other than '\"', got {:?}",
                self.delimiter
            )));
        }

        for (field, name) in [
            ("timestamp_column", &self.timestamp_column),
            ("hr_column", &self.hr_column),
            ("hrv_column", &self.hrv_column),
        ] {
            if name.trim().is_empty() {
                return Err(ComputeError::ConfigError(format!("{} must not be empty", field)));
            }
        }

        if self.max_input_bytes == 0 {
            return Err(ComputeError::ConfigError(
                "max_input_bytes must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Delimiter as the byte the csv reader expects
    pub(crate) fn delimiter_byte(&self) -> u8 {
        // validate() guarantees ASCII
        self.delimiter as u8
    }
}

/// Top-level engine settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub parser: ParserConfig,
    /// Embed the cleaned sample sequence in encoded payloads
    pub include_samples: bool,
}

impl EngineConfig {
    /// Load and validate configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ComputeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        self.parser.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_match_export_format() {
        let config = ParserConfig::default();
        assert_eq!(config.delimiter, ';');
        assert_eq!(config.timestamp_column, "Phone timestamp");
        assert_eq!(config.hr_column, "HR [bpm]");
        assert_eq!(config.hrv_column, "HRV [ms]");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            EngineConfig::from_json(r#"{"parser": {"delimiter": ","}, "include_samples": true}"#)
                .unwrap();

        assert_eq!(config.parser.delimiter, ',');
        assert_eq!(config.parser.hr_column, "HR [bpm]");
        assert!(config.include_samples);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = EngineConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_non_ascii_delimiter() {
        let result = EngineConfig::from_json(r#"{"parser": {"delimiter": "§"}}"#);
        assert!(matches!(result, Err(ComputeError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_empty_column_name() {
        let config = ParserConfig {
            hr_column: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ComputeError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_zero_size_limit() {
        let config = ParserConfig {
            max_input_bytes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(ComputeError::JsonError(_))
        ));
    }
}
