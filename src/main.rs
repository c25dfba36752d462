use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::{error, info, warn};

use liftcoach::error::ErrorSeverity;
use liftcoach::export::{self, markdown, ExportFormat};
use liftcoach::hevy::{self, HevyClient};
use liftcoach::import;
use liftcoach::logging::{init_logging, LogFormat, LogLevel};
use liftcoach::{AppConfig, CoachError, CoachingReport};

/// liftcoach - Progressive-overload coaching for Hevy workout logs
///
/// Fetches workout events from the Hevy API and turns them into a coaching
/// report: per-exercise verdicts, progression trends, plateau detection and
/// weight suggestions for the next session.
#[derive(Parser)]
#[command(name = "liftcoach")]
#[command(version)]
#[command(about = "Progressive-overload coaching reports", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT", global = true)]
    log_format: Option<LogFormat>,

    /// Also write JSON logs to this file
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FetchArgs {
    /// Number of days to fetch (defaults to the configured value)
    #[arg(long)]
    days: Option<u32>,

    /// Output JSON file for fetched events
    #[arg(long, default_value = "hevy_events.json")]
    outfile: PathBuf,
}

#[derive(Args)]
struct ReportArgs {
    /// Only analyze the last N days
    #[arg(long)]
    retention_days: Option<u32>,

    /// Report format (markdown, json)
    #[arg(short, long, default_value = "markdown")]
    format: ExportFormat,

    /// Report file (defaults to liftcoach_report_<timestamp>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also save the analyzed sets as CSV
    #[arg(long, value_name = "FILE")]
    save_csv: Option<PathBuf>,

    /// Reference date for the retention window (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch recent workout events from the Hevy API
    Fetch(FetchArgs),

    /// Analyze a saved event file and write the coaching report
    Analyze {
        /// Input file (Hevy event JSON or set CSV)
        #[arg(long, default_value = "hevy_events.json")]
        infile: PathBuf,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Fetch, then analyze the fetched events
    Run {
        #[command(flatten)]
        fetch: FetchArgs,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Show or create the configuration file
    Config {
        /// Print the effective configuration
        #[arg(short, long)]
        show: bool,

        /// Write a default configuration file
        #[arg(short, long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };

    config.logging.level = LogLevel::from_verbosity(config.logging.level, cli.verbose);
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    if let Some(path) = &cli.log_file {
        config.logging.file_path = Some(path.clone());
    }
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Fetch(args) => {
            fetch(&args, &config).await?;
        }
        Commands::Analyze { infile, report } => {
            analyze(&infile, &report, &mut config)?;
        }
        Commands::Run { fetch: args, report } => {
            if fetch(&args, &config).await? {
                analyze(&args.outfile, &report, &mut config)?;
            }
        }
        Commands::Config { show, init } => {
            manage_config(cli.config.as_deref(), &config, show, init)?;
        }
    }

    Ok(())
}

/// Returns false when the API had no events to save
async fn fetch(args: &FetchArgs, config: &AppConfig) -> Result<bool> {
    let client = HevyClient::from_env(config.api.clone()).map_err(CoachError::from)?;
    let days = args.days.unwrap_or(config.api.fetch_days);

    eprintln!("{}", format!("Fetching workout events from the last {} days...", days).cyan());
    let events = client
        .fetch_recent_events(days)
        .await
        .map_err(CoachError::from)?;

    if events.is_empty() {
        warn!(days, "No workout events found");
        eprintln!("{}", "No workout events found".yellow());
        return Ok(false);
    }

    let count = hevy::save_events(events, &args.outfile)?;
    eprintln!(
        "{}",
        format!("✓ Saved {} events to {}", count, args.outfile.display()).green()
    );
    Ok(true)
}

fn analyze(infile: &Path, args: &ReportArgs, config: &mut AppConfig) -> Result<()> {
    if let Some(days) = args.retention_days {
        config.coaching.retention_days = days;
    }
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let log = import::load_log(infile, &config.coaching, today)?;
    if log.records.is_empty() {
        warn!(path = %infile.display(), "No working sets left after filtering");
        eprintln!(
            "{}",
            format!(
                "No relevant exercise data in the last {} days",
                config.coaching.retention_days
            )
            .yellow()
        );
        return Ok(());
    }

    let report = CoachingReport::build(&log, config, today);

    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "liftcoach_report_{}.{}",
            Local::now().format("%Y%m%d_%H%M%S"),
            args.format.extension()
        ))
    });

    let rendered = export::export_report(&report, args.format, &output)
        .with_context(|| format!("Failed to write report to {}", output.display()))?;

    if args.format == ExportFormat::Markdown {
        print_last_session_table(&report);
    }
    println!("{}", rendered);
    eprintln!("{}", format!("✓ Report saved to {}", output.display()).green());

    if let Some(csv_path) = &args.save_csv {
        export::csv::export_set_records(&log.records, csv_path)
            .with_context(|| format!("Failed to write CSV to {}", csv_path.display()))?;
        eprintln!("{}", format!("✓ Sets saved to {}", csv_path.display()).green());
    }

    info!(exercises = report.exercises.len(), "Analysis complete");
    Ok(())
}

#[derive(Tabled)]
struct VerdictRow {
    #[tabled(rename = "Exercise")]
    exercise: String,
    #[tabled(rename = "Sets")]
    sets: u32,
    #[tabled(rename = "Weight")]
    weight: String,
    #[tabled(rename = "Reps")]
    reps: String,
    #[tabled(rename = "Peak RPE")]
    peak_rpe: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Verdict")]
    verdict: &'static str,
    #[tabled(rename = "Next session")]
    next: String,
}

fn print_last_session_table(report: &CoachingReport) {
    let Some(last) = &report.last_workout else {
        return;
    };

    let rows: Vec<VerdictRow> = last
        .exercises
        .iter()
        .map(|e| VerdictRow {
            exercise: e.exercise.clone(),
            sets: e.summary.set_count,
            weight: format!("{}kg", e.summary.mean_weight.round_dp(1).normalize()),
            reps: e.summary.mean_reps.round_dp(1).normalize().to_string(),
            peak_rpe: e
                .summary
                .peak_rpe
                .map(|r| r.normalize().to_string())
                .unwrap_or_else(|| "-".to_string()),
            target: e
                .rep_range
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string()),
            verdict: markdown::verdict_label(&e.verdict),
            next: markdown::suggestion(&e.verdict),
        })
        .collect();

    println!(
        "{}",
        format!("Last session: {} ({})", last.title, last.date).bold()
    );
    println!("{}\n", Table::new(rows).with(Style::rounded()));
}

fn manage_config(path: Option<&Path>, config: &AppConfig, show: bool, init: bool) -> Result<()> {
    if init {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(AppConfig::default_config_path);
        if path.exists() {
            bail!("Config file already exists: {}", path.display());
        }
        AppConfig::default().save_to_file(&path)?;
        println!("{}", format!("✓ Wrote default config to {}", path.display()).green());
    }

    if show || !init {
        let rendered = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
        println!("{}", rendered);
    }

    Ok(())
}

fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<CoachError>() {
        Some(coach_err) => {
            match coach_err.severity() {
                ErrorSeverity::Warning => warn!(error = %coach_err, "Command finished with warnings"),
                ErrorSeverity::Critical | ErrorSeverity::Error => {
                    error!(error = %coach_err, retryable = coach_err.is_retryable(), "Command failed")
                }
            }
            eprintln!("{} {}", "✗".red().bold(), coach_err.user_message().red());
        }
        None => {
            error!(error = %err, "Command failed");
            eprintln!("{} {:#}", "✗".red().bold(), err);
        }
    }
}
