//! Error types for Holter Flux

use thiserror::Error;

/// Errors that can occur during parsing or metric computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse session log: {0}")]
    ParseError(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Invalid text encoding: {0}")]
    InvalidEncoding(String),

    #[error("Malformed delimited data: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input too large: {size} bytes exceeds limit of {limit} bytes")]
    InputTooLarge { size: usize, limit: usize },

    #[error("No valid samples in session")]
    EmptySeries,

    #[error("Insufficient samples for computation: need at least {required}, found {found}")]
    DegenerateInput { required: usize, found: usize },

    #[error("Statistic {statistic} is not a finite number")]
    NonFiniteResult { statistic: &'static str },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ComputeError {
    /// True for errors that mean "wrong or broken file" rather than "not enough data"
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ComputeError::ParseError(_)
                | ComputeError::MissingColumn(_)
                | ComputeError::InvalidEncoding(_)
                | ComputeError::Csv(_)
                | ComputeError::InputTooLarge { .. }
        )
    }

    /// Stable machine-readable code for surfaces that report errors as JSON
    pub fn code(&self) -> &'static str {
        match self {
            ComputeError::ParseError(_) | ComputeError::Csv(_) => "PARSE_ERROR",
            ComputeError::MissingColumn(_) => "MISSING_COLUMN",
            ComputeError::InvalidEncoding(_) => "INVALID_ENCODING",
            ComputeError::InputTooLarge { .. } => "INPUT_TOO_LARGE",
            ComputeError::Io(_) => "IO_ERROR",
            ComputeError::EmptySeries => "EMPTY_SERIES",
            ComputeError::DegenerateInput { .. } => "DEGENERATE_INPUT",
            ComputeError::NonFiniteResult { .. } => "NON_FINITE_RESULT",
            ComputeError::ConfigError(_) => "CONFIG_ERROR",
            ComputeError::JsonError(_) => "JSON_ERROR",
        }
    }
}
