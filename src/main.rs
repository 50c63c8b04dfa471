//! # newsharvest CLI
//!
//! Command-line entry point for the news harvester.
//!
//! - `run` (the default): search every topic, fetch new articles, merge them
//!   into the dataset and update the fingerprint store
//! - `plan`: print the search URLs a run would request, without network I/O
//!
//! Settings come from the built-in defaults, then an optional JSON file given
//! with `--config`, then individual command-line flags.

mod telemetry;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use newsharvest::crawler::{CrawlerConfig, CrawlerConfigBuilder, HttpFetcher};
use newsharvest::dataset::XlsxStore;
use newsharvest::planner::{DateWindow, plan};
use newsharvest::runner::{RunController, TopicProgress};
use telemetry::OtelGuard;
use tokio::sync::mpsc;
use tracing::{error, instrument};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Incrementally harvest news articles for a set of search topics",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Options for the default `run` command
    #[command(flatten)]
    run: RunArgs,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search, fetch and merge new articles into the dataset
    Run(RunArgs),

    /// Print the planned search URLs without fetching anything
    Plan(PlanArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct RunArgs {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset spreadsheet path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fingerprint store path
    #[arg(short, long)]
    fingerprints: Option<PathBuf>,

    /// Years to look back from today
    #[arg(short, long)]
    years: Option<u32>,

    /// Result pages per topic
    #[arg(short, long)]
    pages: Option<u32>,

    /// Delay between requests in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Document fetches in flight at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Retries for transient network failures
    #[arg(long)]
    retries: Option<u32>,

    /// Search topic; repeat to replace the built-in catalogue
    #[arg(short, long = "topic")]
    topics: Vec<String>,
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Output format (text|json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _otel: OtelGuard = telemetry::init_tracing_subscriber(cli.log_dir.as_deref())?;

    let result = match cli.command {
        Some(Commands::Run(args)) => run_command(args).await,
        Some(Commands::Plan(args)) => plan_command(args),
        None => run_command(cli.run).await,
    };

    if let Err(e) = &result {
        error!("Run failed: {:#}", e);
    }
    result
}

/// Layer the config file and command-line flags over the defaults
fn build_config(args: &RunArgs) -> anyhow::Result<CrawlerConfig> {
    let base = match &args.config {
        Some(path) => CrawlerConfig::read_config(path)?,
        None => CrawlerConfig::default(),
    };

    let mut builder = CrawlerConfigBuilder::from_config(base);
    if let Some(path) = &args.output {
        builder = builder.output_path(path);
    }
    if let Some(path) = &args.fingerprints {
        builder = builder.fingerprints_path(path);
    }
    if let Some(years) = args.years {
        builder = builder.years_to_search(years);
    }
    if let Some(pages) = args.pages {
        builder = builder.pages_per_topic(pages);
    }
    if let Some(delay_ms) = args.delay_ms {
        builder = builder.delay_ms(delay_ms);
    }
    if let Some(concurrency) = args.concurrency {
        builder = builder.fetch_concurrency(concurrency);
    }
    if let Some(retries) = args.retries {
        builder = builder.max_retries(retries);
    }
    if !args.topics.is_empty() {
        builder = builder.topics(args.topics.iter().cloned());
    }

    let config = builder.build();
    config.validate()?;
    Ok(config)
}

#[instrument(skip(args))]
async fn run_command(args: RunArgs) -> anyhow::Result<()> {
    let config = build_config(&args)?;
    let window = DateWindow::ending_today(config.years_to_search);

    println!(
        "Searching {} topics from {} to {} ({} pages each)",
        config.topics.len(),
        window.start(),
        window.end(),
        config.pages_per_topic
    );

    let fetcher = HttpFetcher::new(&config)?;
    let dataset = XlsxStore::new(&config.output_path);

    // Create a channel for progress updates
    let (progress_sender, mut progress_receiver) = mpsc::channel::<TopicProgress>(100);

    let progress_bar = ProgressBar::new(config.topics.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} topics ({eta}) {msg}")?
            .progress_chars("##-"),
    );
    progress_bar.set_message("Searching...");

    let start_time = Instant::now();

    // Ends when the controller drops its sender
    let progress_handle = tokio::spawn({
        let progress_bar = progress_bar.clone();
        async move {
            while let Some(update) = progress_receiver.recv().await {
                progress_bar.inc(1);
                progress_bar.set_message(format!(
                    "'{}': {} new, {} duplicates",
                    update.topic, update.stats.accepted, update.stats.duplicates
                ));
            }
            progress_bar.finish_with_message("Search completed");
        }
    });

    let result = RunController::new(&config, &fetcher, &fetcher, &dataset)
        .with_progress(progress_sender)
        .run(window)
        .await;

    let _ = progress_handle.await;
    let summary = result?;
    let elapsed = start_time.elapsed();

    println!("Run completed in {:.2?}", elapsed);
    println!("New articles collected: {}", summary.new_records);
    println!(
        "Total rows in {}: {}",
        dataset.path().display(),
        summary.total_records
    );
    println!(
        "Total fingerprints in {}: {}",
        config.fingerprints_path.display(),
        summary.total_fingerprints
    );

    let stats = summary.stats;
    println!(
        "Pages: {} requested, {} failed; topics skipped: {}",
        stats.pages_requested, stats.pages_failed, stats.topics_failed
    );
    println!(
        "Links: {} discovered, {} already collected",
        stats.links_discovered, stats.links_already_seen
    );
    println!(
        "Documents: {} fetched, {} failed, {} too short, {} duplicates",
        stats.documents_fetched, stats.documents_failed, stats.too_short, stats.duplicates
    );

    Ok(())
}

fn plan_command(args: PlanArgs) -> anyhow::Result<()> {
    let config = build_config(&args.run)?;
    let window = DateWindow::ending_today(config.years_to_search);

    let mut urls = Vec::new();
    for topic in &config.topics {
        for request in plan(topic, &window, config.pages_per_topic) {
            urls.push(request.to_url(&config.search_base_url)?.to_string());
        }
    }

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&urls)?);
    } else {
        for url in &urls {
            println!("{}", url);
        }
    }

    Ok(())
}
