//! Shelf-Scout main entry point
//!
//! This is the command-line interface for the Shelf-Scout product scraper.

use clap::Parser;
use shelf_scout::config::{load_config_with_hash, validate, Config};
use shelf_scout::crawler::{run_crawl, RunOutcome};
use shelf_scout::output::write_outputs;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Shelf-Scout: a polite product-page scraper
///
/// Shelf-Scout fetches product pages from one e-commerce site while
/// respecting its robots.txt and pacing every request, and writes one
/// normalized record per page.
#[derive(Parser, Debug)]
#[command(name = "shelf-scout")]
#[command(version)]
#[command(about = "A polite product-page scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Extra product URLs, appended to the configured list
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be scraped without any network access
    #[arg(long)]
    dry_run: bool,

    /// Write the JSON output here instead of the configured path
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => (cfg, hash),
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Command-line URLs go through the same checks as configured ones
    if !cli.urls.is_empty() {
        config.urls.extend(cli.urls);
        validate(&config)?;
    }
    if let Some(path) = cli.output {
        config.output.json_path = path.to_string_lossy().into_owned();
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelf_scout=info,warn"),
            1 => EnvFilter::new("shelf_scout=debug,info"),
            2 => EnvFilter::new("shelf_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what would be scraped
fn handle_dry_run(config: &Config) {
    println!("=== Shelf-Scout Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Base URL: {}", config.crawler.base_url);
    println!("  Policy URL: {}", config.crawler.policy_url());
    println!(
        "  Delay: {}s - {}s",
        config.crawler.min_delay_seconds, config.crawler.max_delay_seconds
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_seconds);
    println!("  Max retries: {}", config.crawler.max_retries);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  JSON: {}", config.output.json_path);
    if let Some(db) = &config.output.database_path {
        println!("  Database: {}", db);
    }

    println!("\nProduct URLs ({}):", config.urls.len());
    for url in &config.urls {
        println!("  - {}", url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current page");
            signal_token.cancel();
        }
    });

    let result = run_crawl(&config, cancel).await?;

    if let RunOutcome::Aborted { kind, reason } = &result.outcome {
        tracing::error!(%kind, %reason, "Run aborted by crawl policy");
        return Err(format!("Run aborted ({}): {}", kind, reason).into());
    }

    write_outputs(&config.output, &result)?;

    println!("\nScraped {} products:", result.records.len());
    for record in &result.records {
        println!("- {} (${})", record.name, record.price);
    }
    if !result.failures.is_empty() {
        println!("\nFailed URLs ({}):", result.failures.len());
        for failure in &result.failures {
            println!("- {} [{}] {}", failure.url, failure.kind, failure.reason);
        }
    }
    if result.outcome == RunOutcome::Cancelled {
        println!("\nRun cancelled before all URLs were processed");
    }

    Ok(())
}
