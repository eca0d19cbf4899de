use anyhow::{Context, Result};
use clap::Parser;
use resume_screen::config::Settings;
use resume_screen::{BatchReport, JobRoleSpec};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Score parsed resumes against a job role and print a ranked report
#[derive(Debug, Parser)]
#[command(name = "resume-screen", version, about)]
struct Args {
    /// Job role JSON file
    #[arg(long, required_unless_present = "print_config")]
    job: Option<PathBuf>,

    /// JSON array of resume extracts
    #[arg(long, required_unless_present = "print_config")]
    resumes: Option<PathBuf>,

    /// Configuration file (defaults to config/default.toml and config/local.toml)
    #[arg(long, env = "SCREENER_CONFIG")]
    config: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn init_logging(settings: &Settings) {
    // LOG_LEVEL and LOG_FORMAT override the configuration file
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.pretty().init();
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("Failed to load configuration")?;

    if args.print_config {
        print!("{}", toml::to_string_pretty(&settings)?);
        return Ok(());
    }

    init_logging(&settings);
    info!("Starting resume screening...");

    let (Some(job_path), Some(resumes_path)) = (&args.job, &args.resumes) else {
        anyhow::bail!("--job and --resumes are required");
    };
    let job: JobRoleSpec = read_json(job_path)?;
    let resumes: Vec<serde_json::Value> = read_json(resumes_path)?;

    let screener = settings
        .build_screener()
        .context("Failed to initialize embedding provider")?;
    let config = settings.scoring_config();
    info!(
        "Screener initialized ({} workers, weights: {:?})",
        screener.workers(),
        config.weights
    );

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing resumes already in progress");
            ctrl_c.cancel();
        }
    });

    let items = screener
        .evaluate_batch_values_with_cancel(resumes, &job, &config, cancel)
        .await?;
    let cancelled = items.iter().filter(|item| item.is_cancelled()).count();
    if cancelled > 0 {
        warn!("{} resumes were not evaluated", cancelled);
    }
    let results = items.into_iter().filter_map(|item| item.into_result()).collect();

    let report = BatchReport::new(job.title.clone(), results);
    info!(
        "Shortlisted {} of {} resumes",
        report.shortlisted_count, report.total_resumes
    );

    let output = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", output);

    Ok(())
}
