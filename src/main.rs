//! Shopscout main entry point
//!
//! This is the command-line interface for the Shopscout product URL crawler.

use anyhow::{Context, Result};
use clap::Parser;
use shopscout::config::{load_config_with_hash, validate, Config, FetcherBackend};
use shopscout::output::{LogStatusHook, SummarySink};
use shopscout::{normalize_root, start_crawl, CrawlOrchestrator};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Shopscout: a product URL discovery crawler
///
/// Shopscout crawls each given e-commerce domain breadth-first and reports
/// the pages that look like product detail pages, based on their URL and on
/// the structure of their HTML.
#[derive(Parser, Debug)]
#[command(name = "shopscout")]
#[command(version = "1.0.0")]
#[command(about = "Discovers product page URLs on e-commerce sites", long_about = None)]
struct Cli {
    /// Domains to crawl (e.g. example.com or https://shop.example.com)
    #[arg(value_name = "DOMAIN", required = true)]
    domains: Vec<String>,

    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum pages visited per domain (overrides the configuration)
    #[arg(short = 'n', long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    max_pages: Option<u32>,

    /// Fetch backend: http or browser (overrides the configuration)
    #[arg(short, long, value_name = "BACKEND")]
    backend: Option<FetcherBackend>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = load_configuration(cli.config.as_ref())?;

    if let Some(backend) = cli.backend {
        config.fetcher.backend = backend;
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages_per_domain = Some(max_pages);
    }

    if cli.dry_run {
        handle_dry_run(&config, &cli.domains)
    } else {
        handle_crawl(config, cli.domains).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shopscout=info,warn"),
            1 => EnvFilter::new("shopscout=debug,info"),
            2 => EnvFilter::new("shopscout=trace,debug"),
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

/// Loads the configuration file, or the built-in defaults when none is given
fn load_configuration(path: Option<&PathBuf>) -> Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using built-in defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, domains: &[String]) -> Result<()> {
    validate(config).context("Invalid configuration")?;

    println!("=== Shopscout Dry Run ===\n");

    println!("Crawler Configuration:");
    match config.crawler.max_pages_per_domain {
        Some(pages) => println!("  Max pages per domain: {}", pages),
        None => println!("  Max pages per domain: unbounded"),
    }
    println!("  Request timeout: {}ms", config.crawler.request_timeout_ms);
    println!(
        "  Retries: {} ({}ms apart)",
        config.crawler.max_retries, config.crawler.retry_delay_ms
    );
    match config.crawler.requests_per_second {
        Some(rate) => println!("  Requests per second: {}", rate),
        None => println!("  Requests per second: unlimited"),
    }
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );

    println!("\nFetcher:");
    println!("  Backend: {}", config.fetcher.backend);
    println!("  User agent: {}", config.fetcher.user_agent);
    if config.fetcher.backend == FetcherBackend::Browser {
        println!("  Headless: {}", config.fetcher.browser.headless);
        println!("  Settle time: {}ms", config.fetcher.browser.settle_ms);
    }

    println!("\nClassifier:");
    println!(
        "  Thresholds: high {}, mid {}, low {}",
        config.classifier.high_threshold,
        config.classifier.mid_threshold,
        config.classifier.low_threshold
    );
    println!(
        "  Require product URL: {}",
        config.classifier.require_product_url
    );

    println!("\nDomains ({}):", domains.len());
    let mut valid = 0;
    for domain in domains {
        match normalize_root(domain) {
            Ok(root) => {
                valid += 1;
                println!("  - {} -> {}", domain, root);
            }
            Err(e) => println!("  - {} (invalid: {})", domain, e),
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling {} of {} domains", valid, domains.len());

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, domains: Vec<String>) -> Result<()> {
    tracing::info!(
        "Backend: {}, domains: {}",
        config.fetcher.backend,
        domains.len()
    );

    let orchestrator =
        Arc::new(CrawlOrchestrator::new(config).context("Invalid configuration")?);

    let handle = start_crawl(
        orchestrator,
        domains,
        None,
        Arc::new(SummarySink),
        Arc::new(LogStatusHook),
    )
    .await
    .context("Failed to start crawl")?;

    tracing::info!("Started job {}", handle.job_id());
    let result = handle.wait().await?;

    if !result.domains.is_empty() && result.domains.values().all(|d| d.failed) {
        anyhow::bail!("No domain could be crawled");
    }

    Ok(())
}
