//! wellscan - Deterministic Well-Log Anomaly Screening
//!
//! Command-line front end over the `wellscan` library. Requests are JSON
//! `AnalysisRequest` documents read from a file or stdin; results are
//! printed to stdout as JSON, logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Deterministic report + insight
//! wellscan interpret --input request.json
//!
//! # Add an LLM (or fallback) interpretation
//! cat request.json | wellscan narrate --input - --pretty
//!
//! # Ask a question about the interval
//! wellscan ask --input request.json --question "Where is the strongest GR response?" --detail 4
//!
//! # Print the effective configuration
//! wellscan --config wellscan.toml show-config
//! ```
//!
//! # Environment Variables
//!
//! - `WELLSCAN_CONFIG`: Path to a TOML config file (default search: ./wellscan.toml)
//! - `GROQ_API_KEY` / `OPENAI_API_KEY`: LLM provider keys (Groq preferred)
//! - `LLM_PRIMARY`: Model override for the selected provider
//! - `RUST_LOG`: Logging level (default: info)
//! - `WELLSCAN_LOG_JSON`: Emit JSON log lines (same as `--log-json`)

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use wellscan::llm::{
    chat_with_data, interpret_with_fallback, ChatContext, InterpretationContext,
    InterpretationOutcome, ProviderHandle, ProviderSettings,
};
use wellscan::types::{AnalysisOutput, DeterministicReport, Insight};
use wellscan::{analyze, AnalysisRequest, InterpretEnvelope, WellscanConfig};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "wellscan")]
#[command(about = "Deterministic, explainable anomaly screening for well-log curves")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (overrides WELLSCAN_CONFIG and ./wellscan.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Indent JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true, env = "WELLSCAN_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Run the deterministic analysis and print report + insight
    Interpret {
        /// Request JSON file, or "-" for stdin
        #[arg(long, value_name = "PATH")]
        input: String,
    },
    /// As `interpret`, plus an LLM (or deterministic fallback) interpretation
    Narrate {
        /// Request JSON file, or "-" for stdin
        #[arg(long, value_name = "PATH")]
        input: String,
    },
    /// Ask a question about the analyzed interval
    Ask {
        /// Request JSON file, or "-" for stdin
        #[arg(long, value_name = "PATH")]
        input: String,

        /// Question for the assistant
        #[arg(long, default_value = "")]
        question: String,

        /// Answer detail level, 1 (terse) to 5 (thorough)
        #[arg(long, default_value_t = 3)]
        detail: i64,
    },
    /// Print the effective configuration as TOML (API keys masked)
    ShowConfig,
}

/// `narrate` output: the interpret envelope plus the interpretation.
#[derive(Serialize)]
struct NarrateEnvelope {
    ok: bool,
    deterministic: DeterministicReport,
    insight: Insight,
    interpretation: InterpretationOutcome,
}

// ============================================================================
// Helpers
// ============================================================================

fn load_config(path: Option<&Path>) -> Result<WellscanConfig> {
    match path {
        Some(p) => WellscanConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => Ok(WellscanConfig::load()),
    }
}

fn read_request(input: &str) -> Result<AnalysisRequest> {
    let raw = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read request file {input}"))?
    };
    let request: AnalysisRequest =
        serde_json::from_str(&raw).context("Request is not a valid AnalysisRequest document")?;
    debug!(
        well = %request.well_id,
        rows = request.rows.len(),
        curves = request.curves.len(),
        "Request loaded"
    );
    Ok(request)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize output")?;
    println!("{text}");
    Ok(())
}

fn provider_handle(config: &WellscanConfig) -> Option<ProviderHandle> {
    let settings = ProviderSettings::from_env(&config.llm);
    let handle = ProviderHandle::build(&settings);
    if handle.is_none() {
        info!("No usable LLM API key, deterministic fallbacks will be used");
    }
    handle
}

/// Chat context grounded in the deterministic results.
fn chat_context(
    request: &AnalysisRequest,
    output: &AnalysisOutput,
    question: String,
    detail: i64,
) -> Result<ChatContext> {
    let (from, to) = request.depth_window();
    let mut ctx = ChatContext::new(request.well_id.clone(), from, to);
    ctx.curves = request.unique_curves();
    ctx.question = question;
    ctx.detail_level = detail;
    ctx.rows = request.rows.clone();

    let det = &output.deterministic;
    if let Value::Object(stats) = serde_json::to_value(&det.curve_statistics)
        .context("Failed to serialize curve statistics")?
    {
        ctx.statistics = stats;
    }
    let evidence = json!({
        "anomalyScore": det.anomaly_score,
        "detectionConfidence": det.detection_confidence,
        "severityBand": det.severity_band,
        "eventCount": det.event_count,
        "intervalFindings": det.interval_findings,
        "dataQuality": det.data_quality,
        "insight": output.insight,
    });
    if let Value::Object(map) = evidence {
        ctx.evidence = map;
    }
    Ok(ctx)
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Initialize logging (stderr keeps stdout clean JSON)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let logger = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if args.log_json {
        logger.json().init();
    } else {
        logger.init();
    }

    let config = load_config(args.config.as_deref())?;

    match args.command {
        SubCommand::Interpret { input } => {
            let request = read_request(&input)?;
            let output = analyze(&request, &config);
            print_json(&InterpretEnvelope::from(output), args.pretty)?;
        }
        SubCommand::Narrate { input } => {
            let request = read_request(&input)?;
            let output = analyze(&request, &config);
            let handle = provider_handle(&config);
            let ctx = InterpretationContext::from_request(&request);
            let interpretation = interpret_with_fallback(handle.as_ref(), &ctx).await;
            print_json(
                &NarrateEnvelope {
                    ok: true,
                    deterministic: output.deterministic,
                    insight: output.insight,
                    interpretation,
                },
                args.pretty,
            )?;
        }
        SubCommand::Ask {
            input,
            question,
            detail,
        } => {
            let request = read_request(&input)?;
            let output = analyze(&request, &config);
            let handle = provider_handle(&config);
            let ctx = chat_context(&request, &output, question, detail)?;
            let reply = chat_with_data(handle.as_ref(), &ctx).await;
            print_json(&reply, args.pretty)?;
        }
        SubCommand::ShowConfig => {
            let text = config
                .redacted()
                .to_toml()
                .context("Failed to serialize configuration")?;
            print!("{text}");
        }
    }

    Ok(())
}
