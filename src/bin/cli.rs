//! Job aggregator CLI
//!
//! Local entry point for running searches and checking configuration.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use job_aggregator::{
    Aggregator, Query,
    config::load_config,
    error::Result,
    models::{Config, Country},
    utils::{ReqwestFetch, SystemClock},
};

/// jobs - Job listings aggregator
#[derive(Parser, Debug)]
#[command(
    name = "jobs",
    version,
    about = "Aggregated job search across several providers"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search every available provider
    Search {
        /// Free-text query
        text: String,

        /// Country code from the allow-list (empty for worldwide)
        #[arg(short = 'C', long, default_value = "")]
        country: String,

        /// 1-based result page
        #[arg(short, long)]
        page: Option<usize>,

        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },

    /// List providers in priority order
    Providers,

    /// Validate the configuration file
    Validate,

    /// List supported countries
    Countries,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn build_aggregator(config: &Config) -> Result<Aggregator> {
    let http = Arc::new(ReqwestFetch::from_config(&config.http)?);
    Aggregator::from_config(config, http, Arc::new(SystemClock))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Search {
            text,
            country,
            page,
            json,
        } => {
            let config = load_config(&cli.config)?;
            let aggregator = build_aggregator(&config)?;
            let query = Query::new(&text, &country, page)?;

            let results = aggregator.get_listings(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
                return Ok(());
            }

            if results.is_empty() {
                log::info!("No listings found for {}", query);
                return Ok(());
            }
            for listing in &results.listings {
                let location = listing.location();
                println!(
                    "{} | {} | {} [{}]",
                    listing.title,
                    listing.employer_name,
                    if location.is_empty() { "-" } else { location.as_str() },
                    listing.source
                );
                if let Some(link) = &listing.apply_link {
                    println!("    {}", link);
                }
            }
            log::info!(
                "Page {} of {} listings from {}{}",
                results.page,
                results.total,
                results.source,
                if results.is_stale { " (stale)" } else { "" }
            );
        }

        Command::Providers => {
            let config = load_config(&cli.config)?;
            let aggregator = build_aggregator(&config)?;
            for (rank, provider) in aggregator.providers().iter().enumerate() {
                println!(
                    "{}. {} ({})",
                    rank + 1,
                    provider.name(),
                    if provider.is_available() {
                        "available"
                    } else {
                        "unavailable"
                    }
                );
            }
        }

        Command::Validate => {
            log::info!("Validating {}...", cli.config.display());

            let config = Config::load(&cli.config)?;
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Countries => {
            for country in Country::all() {
                println!("{}  {}", country.code, country.name);
            }
        }
    }

    Ok(())
}
