//! Holter CLI - Command-line interface for Holter Flux
//!
//! Commands:
//! - analyze: Compute metrics for a session log
//! - validate: Check a session log's header and row quality
//! - schema: Print the analysis output schema

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use holter_flux::config::EngineConfig;
use holter_flux::encoder::ANALYSIS_SCHEMA_VERSION;
use holter_flux::pipeline::HolterProcessor;
use holter_flux::types::{AnalysisPayload, ParsedSession};
use holter_flux::{ComputeError, FLUX_VERSION};

/// Holter - heart-rate and HRV metrics from wearable monitor exports
#[derive(Parser)]
#[command(name = "holter")]
#[command(version = FLUX_VERSION)]
#[command(about = "Compute HR/HRV session metrics from monitor exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute metrics for a session log
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "auto")]
        format: OutputFormat,

        /// Include the cleaned sample sequence in JSON output
        #[arg(long)]
        include_samples: bool,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check a session log's header and row quality
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the analysis output schema
    Schema {
        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Text on a terminal, JSON otherwise
    Auto,
    /// Human-readable summary
    Text,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), HolterCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            format,
            include_samples,
            config,
        } => cmd_analyze(&input, &output, format, include_samples, config.as_deref()),

        Commands::Validate {
            input,
            config,
            json,
        } => cmd_validate(&input, config.as_deref(), json),

        Commands::Schema { json_schema } => cmd_schema(json_schema),
    }
}

fn cmd_analyze(
    input: &Path,
    output: &Path,
    format: OutputFormat,
    include_samples: bool,
    config: Option<&Path>,
) -> Result<(), HolterCliError> {
    let mut engine_config = load_config(config)?;
    engine_config.include_samples |= include_samples;

    let processor = HolterProcessor::with_config(engine_config)?;
    let analysis = processor.analyze_reader(open_input(input, processor.max_input_bytes())?)?;
    let encoder = processor.encoder();

    let format = match format {
        OutputFormat::Auto if output.to_string_lossy() == "-" && atty::is(atty::Stream::Stdout) => {
            OutputFormat::Text
        }
        OutputFormat::Auto => OutputFormat::Json,
        other => other,
    };

    let output_data = match format {
        OutputFormat::Text => format_text(&encoder.encode(&analysis)),
        OutputFormat::JsonPretty => encoder.encode_to_json_pretty(&analysis)? + "\n",
        _ => encoder.encode_to_json(&analysis)? + "\n",
    };

    write_output(output, &output_data)
}

fn cmd_validate(input: &Path, config: Option<&Path>, json: bool) -> Result<(), HolterCliError> {
    let processor = HolterProcessor::with_config(load_config(config)?)?;
    let session = processor.parse_reader(open_input(input, processor.max_input_bytes())?)?;
    let report = ValidationReport::from(&session);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Timestamp column:   {}", report.timestamp_column);
        println!("HR column:          {}", report.hr_column);
        println!("HRV column:         {}", report.hrv_column);
        println!("Rows read:          {}", report.rows_read);
        println!("Rows retained:      {}", report.rows_retained);
        println!("Rows dropped:       {}", report.rows_dropped);
        println!("Blank rows:         {}", report.blank_rows);
        println!("Invalid timestamps: {}", report.invalid_timestamps);
        println!("Zero HRV readings:  {}", report.zero_hrv_samples);
    }

    match report.rows_retained {
        0 => Err(HolterCliError::Compute(ComputeError::EmptySeries)),
        1 => Err(HolterCliError::Compute(ComputeError::DegenerateInput {
            required: 2,
            found: 1,
        })),
        _ => Ok(()),
    }
}

fn cmd_schema(json_schema: bool) -> Result<(), HolterCliError> {
    if json_schema {
        println!("{}", get_output_json_schema());
    } else {
        println!("Output Schema: {}", ANALYSIS_SCHEMA_VERSION);
        println!();
        println!("- schema_version: Payload schema identifier");
        println!("- producer: {{ name, version, instance_id }}");
        println!("- computed_at_utc: RFC 3339 computation time");
        println!("- source: {{ rows_read, rows_retained, rows_dropped, blank_rows, invalid_timestamps, first_timestamp, last_timestamp }}");
        println!("- metrics: {{ meanHR, maxHR, rmssd, hrvRange, meanHRV, sdnn, recoveryTime }}");
        println!("- guidelines: {{ target_hr_bpm, stop_hr_bpm, rest_minutes }}");
        println!("- assessment: {{ sympathetic_load, parasympathetic, pem_risk }} each {{ value, band, fill }}");
        println!("- samples (optional): [{{ time, timestamp, hr, hrv }}]");
    }

    Ok(())
}

// Helper functions

fn load_config(path: Option<&Path>) -> Result<EngineConfig, HolterCliError> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading engine configuration");
            let json = fs::read_to_string(path)?;
            Ok(EngineConfig::from_json(&json)?)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn open_input(input: &Path, limit: usize) -> Result<Box<dyn Read>, HolterCliError> {
    if input.to_string_lossy() == "-" {
        return Ok(Box::new(io::stdin()));
    }

    let size = fs::metadata(input)?.len();
    if size > limit as u64 {
        return Err(ComputeError::InputTooLarge {
            size: usize::try_from(size).unwrap_or(usize::MAX),
            limit,
        }
        .into());
    }
    Ok(Box::new(fs::File::open(input)?))
}

fn write_output(output: &Path, data: &str) -> Result<(), HolterCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn format_text(payload: &AnalysisPayload) -> String {
    let m = &payload.metrics;
    let g = &payload.guidelines;
    let a = &payload.assessment;
    let s = &payload.source;

    let mut lines = vec![
        "Session Metrics".to_string(),
        "===============".to_string(),
        format!("Mean HR:        {} bpm", m.mean_hr),
        format!("Max HR:         {} bpm", m.max_hr),
        format!("RMSSD:          {} ms", m.rmssd),
        format!("SDNN:           {} ms", m.sdnn),
        format!("Mean HRV:       {} ms", m.mean_hrv),
        format!("HRV range:      {} ms", m.hrv_range),
        format!("Recovery time:  {} min", m.recovery_time_min),
        String::new(),
        "Assessment".to_string(),
        "==========".to_string(),
        format!("Sympathetic load:  {}", a.sympathetic_load.band.as_str()),
        format!("Parasympathetic:   {}", a.parasympathetic.band.as_str()),
        format!("PEM risk:          {}", a.pem_risk.band.as_str()),
        String::new(),
        "Guidelines".to_string(),
        "==========".to_string(),
        format!("Target: {} bpm", g.target_hr_bpm),
        format!("Stop:   {} bpm", g.stop_hr_bpm),
        format!("Rest:   {} min", g.rest_minutes),
        String::new(),
        format!(
            "Rows: {} read, {} retained, {} dropped",
            s.rows_read, s.rows_retained, s.rows_dropped
        ),
    ];

    if let (Some(first), Some(last)) = (s.first_timestamp, s.last_timestamp) {
        lines.push(format!("Span: {} to {}", first, last));
    }

    lines.join("\n") + "\n"
}

fn get_output_json_schema() -> String {
    let gauge = serde_json::json!({
        "type": "object",
        "properties": {
            "value": { "type": "number" },
            "band": { "type": "string", "enum": ["low", "moderate", "high"] },
            "fill": { "type": "number", "minimum": 0, "maximum": 1 }
        }
    });

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": ANALYSIS_SCHEMA_VERSION,
        "description": "Holter session analysis payload",
        "type": "object",
        "required": ["schema_version", "producer", "computed_at_utc", "source", "metrics", "guidelines", "assessment"],
        "properties": {
            "schema_version": { "type": "string", "const": ANALYSIS_SCHEMA_VERSION },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "computed_at_utc": { "type": "string", "format": "date-time" },
            "source": {
                "type": "object",
                "properties": {
                    "rows_read": { "type": "integer" },
                    "rows_retained": { "type": "integer" },
                    "rows_dropped": { "type": "integer" },
                    "blank_rows": { "type": "integer" },
                    "invalid_timestamps": { "type": "integer" },
                    "first_timestamp": { "type": "string" },
                    "last_timestamp": { "type": "string" }
                }
            },
            "metrics": {
                "type": "object",
                "required": ["meanHR", "maxHR", "rmssd", "hrvRange", "meanHRV", "sdnn", "recoveryTime"],
                "properties": {
                    "meanHR": { "type": "number" },
                    "maxHR": { "type": "number" },
                    "rmssd": { "type": "number" },
                    "hrvRange": { "type": "number" },
                    "meanHRV": { "type": "number" },
                    "sdnn": { "type": "number" },
                    "recoveryTime": { "type": "integer" }
                }
            },
            "guidelines": {
                "type": "object",
                "properties": {
                    "target_hr_bpm": { "type": "integer" },
                    "stop_hr_bpm": { "type": "integer" },
                    "rest_minutes": { "type": "integer" }
                }
            },
            "assessment": {
                "type": "object",
                "properties": {
                    "sympathetic_load": gauge,
                    "parasympathetic": gauge,
                    "pem_risk": gauge
                }
            },
            "samples": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "time": { "type": "string" },
                        "timestamp": { "type": "string" },
                        "hr": { "type": "number" },
                        "hrv": { "type": "number" }
                    }
                }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum HolterCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
}

impl From<io::Error> for HolterCliError {
    fn from(e: io::Error) -> Self {
        HolterCliError::Io(e)
    }
}

impl From<ComputeError> for HolterCliError {
    fn from(e: ComputeError) -> Self {
        HolterCliError::Compute(e)
    }
}

impl From<serde_json::Error> for HolterCliError {
    fn from(e: serde_json::Error) -> Self {
        HolterCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<HolterCliError> for CliError {
    fn from(e: HolterCliError) -> Self {
        match e {
            HolterCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            HolterCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            HolterCliError::Compute(e) => {
                let hint = match &e {
                    ComputeError::EmptySeries | ComputeError::DegenerateInput { .. } => {
                        "Insufficient data: record a longer session".to_string()
                    }
                    ComputeError::ConfigError(_) => "Check the configuration file".to_string(),
                    ComputeError::NonFiniteResult { .. } => {
                        "Check the HR and HRV columns for implausible values".to_string()
                    }
                    _ if e.is_parse_error() => {
                        "Ensure the file is a ';'-separated export with 'Phone timestamp', 'HR [bpm]' and 'HRV [ms]' columns"
                            .to_string()
                    }
                    _ => "Run 'holter validate' for details".to_string(),
                };
                CliError {
                    code: e.code().to_string(),
                    message: e.to_string(),
                    hint: Some(hint),
                }
            }
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    timestamp_column: String,
    hr_column: String,
    hrv_column: String,
    rows_read: usize,
    rows_retained: usize,
    rows_dropped: usize,
    blank_rows: usize,
    invalid_timestamps: usize,
    zero_hrv_samples: usize,
}

impl From<&ParsedSession> for ValidationReport {
    fn from(session: &ParsedSession) -> Self {
        ValidationReport {
            timestamp_column: session.columns.timestamp.clone(),
            hr_column: session.columns.hr.clone(),
            hrv_column: session.columns.hrv.clone(),
            rows_read: session.stats.rows_read,
            rows_retained: session.stats.rows_retained,
            rows_dropped: session.stats.rows_dropped,
            blank_rows: session.stats.blank_rows,
            invalid_timestamps: session.stats.invalid_timestamps,
            zero_hrv_samples: session.samples.iter().filter(|s| s.hrv == 0.0).count(),
        }
    }
}
