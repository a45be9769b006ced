//! Press-Scout main entry point
//!
//! This is the command-line interface for the Press-Scout press-release crawler.

use anyhow::{bail, Context};
use clap::Parser;
use press_scout::config::{load_config_with_hash, load_seed_file, validate_seed, Config};
use press_scout::crawler::{CrawlEngine, CrawlSettings, HttpFetcher};
use press_scout::llm::{
    seed_store_from_env, ChatCompletionsClient, CredentialRotator, Dispatcher, RetryPolicy,
};
use press_scout::normalize_url;
use press_scout::output::{generate_markdown_summary, print_statistics, RunStatistics};
use press_scout::pipeline::{run_seed_jobs, JobRunner};
use press_scout::storage::open_credential_store;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Press-Scout: discovers press releases on corporate websites
///
/// Press-Scout crawls each seed site for news-like pages, walks pagination, and sends
/// the extracted text to a language model, writing results per seed.
#[derive(Parser, Debug)]
#[command(name = "press-scout")]
#[command(version)]
#[command(about = "Press-release discovery crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Additional seed URL (repeatable)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// File with one seed URL per line (# starts a comment)
    #[arg(long, value_name = "PATH")]
    seeds_file: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Re-run seeds whose output directory already exists
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env before anything reads the environment
    if let Ok(path) = dotenvy::dotenv() {
        eprintln!("Loaded environment from {}", path.display());
    }

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let seeds = collect_seeds(&config, &cli.seeds, cli.seeds_file.as_deref())?;
    if seeds.is_empty() {
        bail!("no seed URLs given in the config, --seed or --seeds-file");
    }

    if cli.dry_run {
        handle_dry_run(&config, &seeds);
        return Ok(());
    }

    handle_run(config, config_hash, seeds, cli.fresh).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("press_scout=info,warn"),
            1 => EnvFilter::new("press_scout=debug,info"),
            2 => EnvFilter::new("press_scout=trace,debug"),
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

/// Merges config, CLI and file seeds, normalized and deduplicated in that order
fn collect_seeds(
    config: &Config,
    cli_seeds: &[String],
    seeds_file: Option<&Path>,
) -> anyhow::Result<Vec<Url>> {
    let mut raw: Vec<String> = config.seeds.clone();

    for seed in cli_seeds {
        validate_seed(seed).with_context(|| format!("invalid --seed {}", seed))?;
        raw.push(seed.clone());
    }

    if let Some(path) = seeds_file {
        let from_file = load_seed_file(path)
            .with_context(|| format!("failed to read seeds from {}", path.display()))?;
        raw.extend(from_file);
    }

    let mut seeds: Vec<Url> = Vec::with_capacity(raw.len());
    for seed in raw {
        let url = normalize_url(&seed).with_context(|| format!("invalid seed {}", seed))?;
        if !seeds.contains(&url) {
            seeds.push(url);
        }
    }

    Ok(seeds)
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, seeds: &[Url]) {
    println!("=== Press-Scout Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  User agent: {}", config.crawler.user_agent);
    println!(
        "  Max concurrent fetches per job: {}",
        config.crawler.max_concurrent_fetches
    );
    println!("  Job timeout: {}s", config.crawler.job_timeout_secs);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Workers: {}", config.jobs.workers);

    println!("\nLanguage Model:");
    println!("  Endpoint: {}", config.llm.base_url);
    println!("  Model: {}", config.llm.model);
    println!("  Chunk size: {} chars", config.llm.chunk_size);
    println!(
        "  Retries: {} attempts, backoff {}s x 2^n within [{}s, {}s]",
        config.llm.max_attempts,
        config.llm.backoff_multiplier_secs,
        config.llm.backoff_min_secs,
        config.llm.backoff_max_secs
    );

    println!("\nCredentials:");
    println!("  Database: {}", config.credentials.database_path);
    println!("  Cooldown threshold: {}", config.credentials.cooldown_threshold);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Summary: {}", config.output.summary_path);

    println!("\nSeeds ({}):", seeds.len());
    for seed in seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would process {} seed URLs", seeds.len());
}

/// Handles the main run: crawl and dispatch every seed, then report
async fn handle_run(
    config: Config,
    config_hash: String,
    seeds: Vec<Url>,
    fresh: bool,
) -> anyhow::Result<()> {
    let mut store = open_credential_store(Path::new(&config.credentials.database_path))
        .context("failed to open credential store")?;
    seed_store_from_env(&mut store, &config.credentials.keys_env)?;
    let rotator = Arc::new(CredentialRotator::new(
        Box::new(store),
        config.credentials.cooldown_threshold,
    )?);

    let fetcher = HttpFetcher::new(&config.crawler).context("failed to build HTTP client")?;
    let engine = CrawlEngine::new(Arc::new(fetcher), CrawlSettings::from(&config.crawler));

    let endpoint =
        ChatCompletionsClient::new(&config.llm).context("failed to build model client")?;
    let dispatcher = Dispatcher::new(
        Arc::new(endpoint),
        rotator,
        RetryPolicy::from(&config.llm),
        config.llm.chunk_size,
    );

    if fresh {
        tracing::info!("Fresh run: seeds with existing output will be processed again");
    }
    let runner = Arc::new(JobRunner::new(
        engine,
        dispatcher,
        &config.output.directory,
        fresh,
    ));

    let mut stats = RunStatistics::new(config_hash);
    for summary in run_seed_jobs(runner, seeds, config.jobs.workers).await {
        stats.record(summary);
    }
    stats.finish();

    print_statistics(&stats);
    generate_markdown_summary(&stats, Path::new(&config.output.summary_path))
        .context("failed to write run summary")?;
    tracing::info!("Run summary written to {}", config.output.summary_path);

    Ok(())
}
