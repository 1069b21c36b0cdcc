//! Command line entry point for the review pipeline
//!
//! Loads a JSON snapshot of applications, reviewers and reviews, recalculates
//! every application with the configured thresholds, and reports the result.
//! This is the bulk recompute used after the thresholds change.

use anyhow::Result;
use clap::Parser;
use review_pipeline::config::AppConfig;
use review_pipeline::review::{InMemoryReviewStore, ReviewService, ReviewSnapshot};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Review Pipeline - recalculate review state for every application
#[derive(Parser)]
#[command(
    name = "review-pipeline",
    version,
    about = "Recalculate multi-round review eligibility and ratings",
    long_about = "Loads a review snapshot, re-runs the eligibility and rating engine on every \
                 application with the configured thresholds, and writes the recalculated \
                 snapshot back out."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Snapshot to recalculate
    #[arg(short, long, value_name = "FILE", help = "Path to a JSON review snapshot")]
    snapshot: Option<PathBuf>,

    /// Where to write the recalculated snapshot
    #[arg(short, long, value_name = "FILE", help = "Write the recalculated snapshot here")]
    output: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Print one line per application after the run
    #[arg(long, help = "Print each application's status, ratings and pending round")]
    summary: bool,

    /// Print metrics after the run
    #[arg(long, help = "Print Prometheus metrics after recalculation")]
    metrics: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without recalculating")]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Display startup banner with the active thresholds
fn display_startup_banner(config: &AppConfig) {
    let engine = &config.engine;
    info!("Review Pipeline {}", review_pipeline::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!(
        "   Round 0: {} yes to pass, {} no to blacklist",
        engine.yeses_needed, engine.nos_needed
    );
    info!(
        "   Reviews per round: {} (round 1), {} (round 2)",
        engine.max_reviews_round_one, engine.max_reviews_round_two
    );
    info!(
        "   Round 1: low threshold {}, third review band [{}, {}) above {} apart",
        engine.rating_r1_low_threshold,
        engine.needed_rating_for_third_review_round1,
        engine.needed_rating_to_round2,
        engine.needed_difference_for_third_review_round1
    );
    info!("   Notifications: {}", config.notifications.enabled);
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    review_pipeline::config::validate_config(&config)?;
    Ok(config)
}

fn run(args: &Args, config: &AppConfig) -> Result<()> {
    let snapshot_path = args
        .snapshot
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("A snapshot is required unless --dry-run is given"))?;

    info!("Loading snapshot from: {}", snapshot_path.display());
    let snapshot = ReviewSnapshot::load(snapshot_path)?;

    let store = Arc::new(InMemoryReviewStore::new());
    snapshot.load_into(store.as_ref())?;

    let service = ReviewService::from_config(config, store.clone())?;
    let report = service.recalculate_all()?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if args.summary {
        print_summary(&service)?;
    }

    if let Some(output) = &args.output {
        let recalculated = ReviewSnapshot::from_store(store.as_ref())?;
        recalculated.save(output)?;
        info!("Wrote recalculated snapshot to: {}", output.display());
    }

    if args.metrics {
        print!("{}", service.metrics().render()?);
    }

    if report.failed > 0 {
        anyhow::bail!("{} applications failed to recalculate", report.failed);
    }

    Ok(())
}

/// Print the recalculated state of every non-deleted application
fn print_summary(service: &ReviewService) -> Result<()> {
    for application in service.applications()? {
        let pending = application
            .state()
            .pending_round()
            .map(|round| round.to_string())
            .unwrap_or_else(|| "none".to_string());
        println!(
            "{}\t{}\t{}\trating1={:.1}\trating2={:.1}\tpending={}",
            application.id,
            application.full_name,
            application.status,
            application.rating1_display(),
            application.rating2_display(),
            pending
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    if args.dry_run {
        info!("Configuration validation successful");
        info!("Dry run completed - exiting without recalculating");
        return Ok(());
    }

    if let Err(e) = run(&args, &config) {
        error!("Recalculation failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
