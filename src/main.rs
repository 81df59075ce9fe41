use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use tracing::Level;

use race_ranker::cache::{CacheConfig, CacheStatus, ResultCache, DEFAULT_STALE_TTL, DEFAULT_TTL};
use race_ranker::fetch::{fetch_batch, FetchOptions, DEFAULT_CONCURRENCY, DEFAULT_FETCH_TIMEOUT};
use race_ranker::source::{FileEventSource, HttpEventSource, RoutedEventSource};
use race_ranker::RankerError;

const EXIT_SUCCESS: i32 = 0;
const EXIT_NETWORK: i32 = 2;
const EXIT_OUTPUT: i32 = 3;
const EXIT_CONFIG: i32 = 4;

/// Soft limit for one whole batch, on top of the per-event timeout
const BATCH_DEADLINE: Duration = Duration::from_secs(120);

#[derive(Parser, Debug)]
#[command(name = "race-ranker")]
#[command(about = "Score and rank race entrants with confidence bands", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging and per-component breakdowns
    #[arg(short, long)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/race-ranker/config.yaml)
    #[arg(short, long)]
    config: Option<String>,

    /// Reference date for freshness scoring and cache key (defaults to today)
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Do not read or write the persisted result cache
    #[arg(long)]
    no_cache: bool,

    /// Remove the persisted result cache before running
    #[arg(long)]
    clear_cache: bool,

    /// Print the batch as JSON instead of a table
    #[arg(long, conflicts_with = "tsv")]
    json: bool,

    /// Print tab-separated rows for scripting
    #[arg(long)]
    tsv: bool,

    /// Also write the batch JSON to this file
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let start_time = Instant::now();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    race_ranker::telemetry::init_tracing(cli.log_json, level);

    // Load config
    let config_path = cli.config.map(PathBuf::from);
    let config = match race_ranker::config::load_config(config_path.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate the whole file at startup
    if let Err(errors) = config.validate() {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    if config.tasks.is_empty() {
        eprintln!("No tasks configured in config file.");
        eprintln!("Add tasks to ~/.config/race-ranker/config.yaml:");
        eprintln!("  tasks:");
        eprintln!("    - source_url: https://cards.example.com/ascot-1430.json");
        eprintln!("      event_key: ascot-1430");
        std::process::exit(EXIT_CONFIG);
    }

    // Durations were checked by validate()
    let fetch_timeout = config.fetch_timeout().ok().flatten().unwrap_or(DEFAULT_FETCH_TIMEOUT);
    let cache_ttl = config.cache_ttl().ok().flatten().unwrap_or(DEFAULT_TTL);
    let scoring = config.scoring.clone().unwrap_or_default();
    let as_of = cli.date.unwrap_or_else(|| chrono::Local::now().date_naive());
    let options = FetchOptions {
        concurrency: config.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
        fetch_timeout,
        as_of,
    };

    tracing::debug!(tasks = config.tasks.len(), concurrency = options.concurrency, ?fetch_timeout, %as_of, "loaded config");

    // Relative file tasks resolve against the config file's directory
    let base_dir = config_path
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(race_ranker::config::get_config_dir);
    let http = match HttpEventSource::within_deadline(fetch_timeout) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Failed to create HTTP client: {:#}", e);
            std::process::exit(EXIT_NETWORK);
        }
    };
    let source = RoutedEventSource::new(http, FileEventSource::new(base_dir));

    let cache_config = CacheConfig {
        enabled: !cli.no_cache,
        path: race_ranker::cache::get_cache_path(),
        ttl: cache_ttl,
        stale_ttl: DEFAULT_STALE_TTL.max(cache_ttl),
    };
    if cli.clear_cache {
        if let Err(e) = race_ranker::cache::clear_cache(&cache_config.path) {
            eprintln!("Failed to clear cache: {:#}", e);
        }
    }
    let cache = ResultCache::new(&cache_config);

    let show_progress = !cli.verbose && std::io::stderr().is_terminal();
    let progress = |done: usize, total: usize| {
        if show_progress {
            eprint!("\rFetched {}/{} events", done, total);
        }
    };

    let key = as_of.to_string();
    let tasks = config.tasks.clone();
    let result = cache
        .get_or_compute(&key, || async {
            match tokio::time::timeout(
                BATCH_DEADLINE,
                fetch_batch(&key, &source, tasks, &scoring, &options, Some(&progress)),
            )
            .await
            {
                Ok(batch) => batch,
                Err(_) => anyhow::bail!("batch did not finish within {:?}", BATCH_DEADLINE),
            }
        })
        .await;
    if show_progress {
        eprintln!();
    }

    let (batch, status) = match result {
        Ok(found) => found,
        Err(e) => {
            match e.downcast_ref::<RankerError>() {
                Some(RankerError::NothingRetrieved { .. }) => {
                    eprintln!("No data available: {}", e);
                    eprintln!("Check your network connection and task URLs.");
                }
                _ => eprintln!("Ranking failed: {:#}", e),
            }
            std::process::exit(EXIT_NETWORK);
        }
    };

    match status {
        CacheStatus::Stale => {
            let age = race_ranker::output::format_age(Utc::now() - batch.generated_at);
            eprintln!("Warning: fresh data unavailable, showing results computed {} ago", age);
        }
        CacheStatus::Fresh | CacheStatus::Persisted => {
            tracing::debug!(?status, generated_at = %batch.generated_at, "served from cache");
        }
        CacheStatus::Computed => {}
    }

    if cli.json {
        match serde_json::to_string_pretty(batch.as_ref()) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize batch: {}", e);
                std::process::exit(EXIT_OUTPUT);
            }
        }
    } else if cli.tsv {
        println!("{}", race_ranker::output::format_tsv(&batch));
    } else {
        let use_colors = race_ranker::output::should_use_colors();
        println!("{}", race_ranker::output::format_batch(&batch, use_colors));

        if cli.verbose {
            for event in &batch.events {
                println!();
                println!("{}", race_ranker::output::format_event_header(event, use_colors));
                for scored in &event.entrants {
                    println!("{}", race_ranker::output::format_entrant_detail(scored, use_colors));
                }
            }
        }
    }

    if let Some(out) = &cli.out {
        if let Err(e) = race_ranker::report::save_batch(out, &batch) {
            eprintln!("{:#}", e);
            std::process::exit(EXIT_OUTPUT);
        }
    }

    if cli.verbose {
        eprintln!();
        eprintln!("Total: {} events in {:?}", batch.events.len(), start_time.elapsed());
    }

    std::process::exit(EXIT_SUCCESS);
}
