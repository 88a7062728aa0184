mod dataset;
mod error;
mod fetch;
mod normalize;
mod parser;
mod record;
mod search;
mod settings;
mod site;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::info;

use fetch::{ChromeFetcher, FetcherKind, HttpFetcher};
use search::SearchOptions;
use settings::Settings;
use site::Site;

#[derive(Parser)]
#[command(name = "indeed_scraper", about = "Job listing scraper for Indeed search results")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every keyword x location search and merge into the dataset
    Run {
        /// Search keyword (repeatable; default from settings)
        #[arg(short, long = "keyword")]
        keywords: Vec<String>,
        /// Search location (repeatable; default from settings)
        #[arg(short, long = "location")]
        locations: Vec<String>,
        /// Dataset CSV to merge into
        #[arg(short, long)]
        dataset: Option<PathBuf>,
        /// Page fetcher backend
        #[arg(short, long, value_enum)]
        fetcher: Option<FetcherKind>,
        /// Drop rows whose job_url is already present (newest row wins)
        #[arg(long)]
        dedupe: bool,
        /// Keep salaries the set-bit plausibility filter would zero out
        #[arg(long)]
        no_salary_filter: bool,
        /// Keep going when a detail page cannot be read
        #[arg(long)]
        skip_failed_details: bool,
        /// Show the browser window
        #[arg(long)]
        headful: bool,
    },
    /// Re-normalize date and hire-count columns of an existing dataset
    Clean {
        #[arg(short, long)]
        dataset: Option<PathBuf>,
    },
    /// Show dataset statistics
    Stats {
        #[arg(short, long)]
        dataset: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;

    let result = match cli.command {
        Commands::Run {
            keywords,
            locations,
            dataset,
            fetcher,
            dedupe,
            no_salary_filter,
            skip_failed_details,
            headful,
        } => {
            if !keywords.is_empty() {
                settings.keywords = keywords;
            }
            if !locations.is_empty() {
                settings.locations = locations;
            }
            if let Some(path) = dataset {
                settings.dataset_path = path;
            }
            if let Some(kind) = fetcher {
                settings.fetcher = kind;
            }
            if no_salary_filter {
                settings.salary_min_set_bits = 0;
            }
            settings.dedupe |= dedupe;
            settings.skip_failed_details |= skip_failed_details;
            settings.headless &= !headful;
            run(&settings).await
        }
        Commands::Clean { dataset: path } => {
            let path = path.unwrap_or(settings.dataset_path);
            let rows = dataset::clean(&path)?;
            println!("Cleaned {} rows in {}", rows, path.display());
            Ok(())
        }
        Commands::Stats { dataset: path } => {
            let path = path.unwrap_or(settings.dataset_path);
            let s = dataset::stats(&path)?;
            println!("Rows:             {}", s.rows);
            println!("With job_url:     {}", s.with_url);
            println!("With description: {}", s.with_description);
            println!("Duplicate URLs:   {}", s.duplicate_urls);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run(settings: &Settings) -> anyhow::Result<()> {
    let queries = site::cross_product(&settings.keywords, &settings.locations);
    if queries.is_empty() {
        println!("Nothing to search: need at least one keyword and one location.");
        return Ok(());
    }

    let filter = settings.salary_filter();
    let options = SearchOptions {
        site: Site::new(&settings.site),
        waits: settings.waits(),
        salary_filter: filter.as_ref(),
        skip_failed_details: settings.skip_failed_details,
    };

    info!(
        "Running {} queries with the {:?} fetcher",
        queries.len(),
        settings.fetcher
    );
    let output = match settings.fetcher {
        FetcherKind::Chrome => {
            let headless = settings.headless;
            search::run_queries(&queries, || ChromeFetcher::launch(headless), &options).await
        }
        FetcherKind::Http => search::run_queries(&queries, HttpFetcher::new, &options).await,
    };

    println!(
        "Scraped {} records from {}/{} queries",
        output.records.len(),
        output.completed,
        queries.len()
    );

    if output.should_persist() {
        let summary = dataset::merge(&settings.dataset_path, output.records, settings.dedupe)?;
        println!(
            "Saved {} new + {} previous rows to {} ({} total, {} duplicates dropped).",
            summary.new_rows,
            summary.previous_rows,
            settings.dataset_path.display(),
            summary.total,
            summary.dropped_duplicates,
        );
    }

    match output.failure {
        Some((query, e)) => Err(anyhow::Error::new(e).context(format!("search {} failed", query))),
        None => Ok(()),
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
