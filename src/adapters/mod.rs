//! Session log adapters
//!
//! This module provides adapters that decode raw monitor exports into an
//! ordered sequence of typed samples.

mod delimited;
pub mod fields;

pub use delimited::DelimitedLogAdapter;

use crate::error::ComputeError;
use crate::types::ParsedSession;
use std::io::Read;

/// Trait for session log adapters
pub trait SessionLogAdapter {
    /// Parse raw text into samples
    fn parse(&self, text: &str) -> Result<ParsedSession, ComputeError>;

    /// Upper bound on accepted input size in bytes
    fn max_input_bytes(&self) -> usize;

    /// Decode raw bytes as UTF-8 and parse them
    fn parse_bytes(&self, bytes: &[u8]) -> Result<ParsedSession, ComputeError> {
        check_input_size(bytes.len(), self.max_input_bytes())?;
        let text = std::str::from_utf8(bytes).map_err(|e| {
            ComputeError::InvalidEncoding(format!(
                "input is not valid UTF-8 (first invalid byte at offset {})",
                e.valid_up_to()
            ))
        })?;
        self.parse(text)
    }
}

pub(crate) fn check_input_size(size: usize, limit: usize) -> Result<(), ComputeError> {
    if size > limit {
        return Err(ComputeError::InputTooLarge { size, limit });
    }
    Ok(())
}

/// Read a whole input stream, failing once it grows past `limit` bytes.
///
/// At most `limit + 1` bytes are buffered, so an oversized stream is rejected
/// without being loaded.
pub fn read_bounded<R: Read>(reader: R, limit: usize) -> Result<Vec<u8>, ComputeError> {
    let mut buffer = Vec::new();
    reader
        .take((limit as u64).saturating_add(1))
        .read_to_end(&mut buffer)?;
    check_input_size(buffer.len(), limit)?;
    Ok(buffer)
}
