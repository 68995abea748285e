//! Diligent - LLM-assisted host security introspection
//!
//! The `diligent` command runs a catalog of diagnostic commands, asks a
//! language model whether each output looks suspicious, and chases the
//! follow-up commands it proposes.
//!
//! ## Commands
//!
//! - `run`: Analyze every check for this OS and write the report
//! - `checks`: List the check catalog
//! - `history`: Show reports persisted in the store

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

use diligent_core::oracle::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use diligent_core::{
    builtin_catalog, detect_os, emit_report_persisted, render_summary_text, write_report_json,
    AnalysisEngine, Check, CommandRunner, EngineConfig, OpenAiOracle, Oracle, OracleConfig,
    OsChecks, OsFamily, Report, RunDriver, RunResult, ShellRunner,
};
use diligent_state::{format_log_date, ReportLog, SurrealReportLog};

#[derive(Parser)]
#[command(name = "diligent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "LLM-assisted host security introspection", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every check for this OS and write the report
    Run(RunArgs),

    /// List the checks that would run
    Checks(CatalogArgs),

    /// Show reports persisted in the store
    History {
        /// Maximum number of reports to list
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Print the full report with this id instead of the list
        #[arg(long)]
        show: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
struct CatalogArgs {
    /// JSON catalog file with "macOS", "windows" and "linux" check lists
    #[arg(long, env = "DILIGENT_CATALOG")]
    catalog: Option<PathBuf>,

    /// Operating system to analyze (default: detected)
    #[arg(long, env = "DILIGENT_OS")]
    os: Option<OsFamily>,
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    #[command(flatten)]
    catalog: CatalogArgs,

    /// Where to write the JSON report
    #[arg(short, long, env = "DILIGENT_OUTPUT", default_value = "report.json")]
    output: PathBuf,

    /// Skip appending the report to the store
    #[arg(long)]
    no_store: bool,

    /// Root checks analyzed concurrently
    #[arg(long, env = "DILIGENT_PARALLELISM", default_value = "1")]
    parallelism: usize,

    /// Deepest follow-up level below a root check
    #[arg(long, env = "DILIGENT_MAX_FOLLOWUPS", default_value = "5")]
    max_followups: usize,

    /// Characters of command output sent to the model
    #[arg(long, env = "DILIGENT_MAX_OUTPUT_CHARS", default_value = "3000")]
    max_output_chars: usize,

    /// Per-command timeout in seconds
    #[arg(long, env = "DILIGENT_COMMAND_TIMEOUT_SECS", default_value = "10")]
    command_timeout_secs: u64,

    /// Per-request model timeout in seconds
    #[arg(long, env = "DILIGENT_ORACLE_TIMEOUT_SECS", default_value = "60")]
    oracle_timeout_secs: u64,

    /// Chat Completions model
    #[arg(long, env = "DILIGENT_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Chat Completions base URL
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// API key for the model endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

impl RunArgs {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_followups: self.max_followups,
            max_output_chars: self.max_output_chars,
            command_timeout: Duration::from_secs(self.command_timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    diligent_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run(args) => cmd_run(args).await,
        Commands::Checks(args) => cmd_checks(&args),
        Commands::History { limit, show } => cmd_history(limit, show.as_deref()).await,
    }
}

/// Resolve the OS and its check list from the flags.
fn resolve_checks(args: &CatalogArgs) -> Result<(OsFamily, Vec<Check>)> {
    let os = args.os.unwrap_or_else(detect_os);
    if os == OsFamily::Unsupported {
        bail!(
            "unsupported operating system '{}'; pass --os macos|linux|windows",
            std::env::consts::OS
        );
    }

    let catalog = match &args.catalog {
        Some(path) => OsChecks::load(path)
            .with_context(|| format!("Failed to load catalog {:?}", path))?,
        None => builtin_catalog(),
    };

    Ok((os, catalog.for_os(os).to_vec()))
}

/// Run all checks and persist the report
async fn cmd_run(args: RunArgs) -> Result<()> {
    let api_key = args
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .context("OPENAI_API_KEY is not set")?;

    let (os, checks) = resolve_checks(&args.catalog)?;

    let store: Option<Box<dyn ReportLog>> = if args.no_store {
        None
    } else {
        let log = SurrealReportLog::from_env()
            .await
            .context("Failed to open report store")?;
        Some(Box::new(log))
    };

    let oracle = OpenAiOracle::new(
        OracleConfig::new(api_key, os)
            .with_base_url(args.base_url.clone())
            .with_model(args.model.clone())
            .with_timeout_secs(args.oracle_timeout_secs),
    )
    .context("Failed to build model client")?;

    let result = execute_run(
        &args,
        os,
        &checks,
        Arc::new(ShellRunner),
        Arc::new(oracle),
        store.as_deref(),
    )
    .await?;

    print!("{}", render_summary_text(&result.report));
    println!("Report written to {}", args.output.display());
    Ok(())
}

/// Drive one run and hand the report to both sinks.
async fn execute_run(
    args: &RunArgs,
    os: OsFamily,
    checks: &[Check],
    runner: Arc<dyn CommandRunner>,
    oracle: Arc<dyn Oracle>,
    store: Option<&dyn ReportLog>,
) -> Result<RunResult> {
    info!("Analyzing {} checks for {}", checks.len(), os);

    let started = Utc::now();
    let engine = AnalysisEngine::new(runner, oracle, args.engine_config());
    let driver = RunDriver::new(engine).with_parallelism(args.parallelism);
    let result = driver.run(os, checks).await;

    write_report_json(&args.output, &result.report)?;
    emit_report_persisted("file", &args.output.display().to_string());

    if let Some(store) = store {
        let content = result
            .report
            .to_pretty_json()
            .context("Failed to serialize report")?;
        let record = store
            .append(&format_log_date(&started), &content)
            .await
            .context("Failed to append report to store")?;
        emit_report_persisted("store", &record.id);
    }

    Ok(result)
}

/// List the catalog for an OS
fn cmd_checks(args: &CatalogArgs) -> Result<()> {
    let (os, checks) = resolve_checks(args)?;

    println!("{} checks for {}:", checks.len(), os);
    for (i, check) in checks.iter().enumerate() {
        println!();
        println!("{:>3}. {}", i + 1, check.command);
        println!("     {}", check.prompt);
    }
    Ok(())
}

/// Show stored reports
async fn cmd_history(limit: usize, show: Option<&str>) -> Result<()> {
    let log = SurrealReportLog::from_env()
        .await
        .context("Failed to open report store")?;
    print_history(&log, limit, show).await
}

async fn print_history(log: &dyn ReportLog, limit: usize, show: Option<&str>) -> Result<()> {
    if let Some(id) = show {
        let record = log.get(id).await.context("Failed to load report")?;
        println!("{}", record.content);
        return Ok(());
    }

    let records = log.recent(limit).await.context("Failed to list reports")?;
    if records.is_empty() {
        println!("No reports stored");
        return Ok(());
    }

    for record in records {
        println!(
            "{}  {}  {}  {}",
            record.id,
            record.date,
            record.digest.short(),
            summarize_content(&record.content)
        );
    }
    Ok(())
}

/// One-line summary of a stored report.
fn summarize_content(content: &str) -> String {
    match serde_json::from_str::<Report>(content) {
        Ok(report) => format!(
            "{} checks, {} flagged, {} alerts",
            report.items.len(),
            report.flagged_count(),
            report.alerts().len()
        ),
        Err(_) => "unreadable report".to_string(),
    }
}
