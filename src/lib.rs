//! Holter Flux - Compute engine for heart-rate and HRV session metrics
//!
//! Flux turns a wearable monitor's `;`-delimited export into a cleaned sample
//! series and a small set of autonomic indices through a deterministic
//! pipeline: row parsing → metric reduction → guidelines and risk assessment
//! → JSON encoding.
//!
//! ## Modules
//!
//! - **Row Parser** (`adapters`): decode rows into samples, tolerating sensor dropout
//! - **Metrics Reducer** (`metrics`): mean/max HR, RMSSD, SDNN, HRV range and mean

pub mod adapters;
pub mod assessment;
pub mod config;
pub mod encoder;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{EngineConfig, ParserConfig};
pub use error::ComputeError;
pub use metrics::MetricsReducer;
pub use pipeline::{analyze_session_log, session_log_to_json, HolterProcessor};
pub use types::{Analysis, MetricsReport, Sample};

/// Flux version embedded in all analysis payloads
pub const FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for analysis payloads
pub const PRODUCER_NAME: &str = "holter-flux";
