//! Binary entry point for `chw-assistant`.
//!
//! A health worker signs in as the configured worker, then either asks one
//! question with `--ask` or works interactively: questions go to the triage
//! responder (rule table or LLM gateway), and slash commands record and browse
//! patient cases. Spans are exported over OTLP alongside the console log.

use clap::Parser;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt};
use chw_assistant::base::{config::Config, types::Void};

/// Chw-assistant: protocol guidance and a case log for community health workers.
///
/// Answers maternal and child health questions, flags answers that need
/// immediate referral, and keeps the worker's patient cases. Settings come from
/// `.hidden/config.toml` (or `--config`) and `CHW_ASSISTANT_*` variables; set
/// `worker_id` to choose who signs in. Without `--ask`, type `/help` for the
/// case commands.
#[derive(Parser, Debug)]
#[command(version, author, about, long_about = None)]
struct Args {
    /// Override the config file path (optional).
    ///
    /// By default, the assistant will look for a config file at `.hidden/config.toml`
    /// in the current directory.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
    /// Increase log verbosity (-v, -vv, etc.).
    ///
    /// Use multiple times to increase verbosity:
    /// - No flag: INFO level
    /// - -v: DEBUG level
    /// - -vv or more: TRACE level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Ask a single question, print the answer, and exit.
    ///
    /// High-risk answers are printed under a `HIGH RISK ALERT` banner.
    #[arg(long)]
    ask: Option<String>,
}

/// Main entry point for the chw-assistant binary.
///
/// Sets up logging based on verbosity, loads configuration, and signs the
/// configured worker in.
#[tokio::main]
async fn main() -> Void {
    let args = Args::parse();

    // Construct the level filter.

    let level = match args.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let level_filter = tracing_subscriber::filter::LevelFilter::from_level(level);

    // Prepare the log layer.

    let stdout = tracing_subscriber::fmt::layer()
        .without_time()
        .with_ansi(true)
        .with_level(true)
        .with_file(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    // Prepare the otlp layer.

    let exporter = opentelemetry_otlp::SpanExporter::builder().with_http().with_protocol(Protocol::HttpBinary).build()?;
    let tracer = opentelemetry_sdk::trace::SdkTracerProvider::builder().with_simple_exporter(exporter).build().tracer("chw-assistant");
    let otel = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry().with(otel).with(level_filter).with(stdout).init();

    let config = Config::load(args.config.as_deref())?;

    chw_assistant::start(config, args.ask.as_deref()).await
}
