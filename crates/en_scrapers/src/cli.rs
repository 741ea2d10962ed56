use clap::{Args, Subcommand};
use en_core::{Error, Result, Source};
use tracing::info;

use crate::pipeline::Pipeline;

#[derive(Args, Debug, Clone)]
pub struct ScraperArgs {
    #[command(subcommand)]
    pub command: Option<ScraperCommands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ScraperCommands {
    /// Scrape all sources (or only the given ones) and save new articles
    Run {
        /// Limit the run to a source (nikkei, yahoo, toyokeizai); repeatable
        #[arg(long = "source", value_parser = parse_source)]
        sources: Vec<Source>,
    },
    /// List available scrapers
    List,
    /// Print one source's headlines without saving them
    Preview {
        #[arg(value_parser = parse_source)]
        source: Source,
    },
}

impl Default for ScraperCommands {
    fn default() -> Self {
        Self::Run { sources: Vec::new() }
    }
}

fn parse_source(value: &str) -> std::result::Result<Source, String> {
    value.parse().map_err(|e: Error| e.to_string())
}

pub async fn handle_command(command: ScraperCommands, pipeline: &Pipeline) -> Result<()> {
    match command {
        ScraperCommands::Run { sources } => {
            let filter = (!sources.is_empty()).then_some(sources.as_slice());
            let report = pipeline.run_with(filter).await?;
            info!(
                scraped_at = %report.scraped_at,
                candidates = report.candidates,
                inserted = ?report.inserted,
                removed = ?report.removed,
                failed = ?report.failed_sources,
                "Run complete"
            );
        }
        ScraperCommands::List => {
            println!("Available scrapers:");
            for scraper in pipeline.manager().get_scrapers() {
                println!(
                    "  {:<12} {:<8} {}",
                    scraper.cli_names().join(","),
                    scraper.source().label(),
                    scraper.listing_url()
                );
            }
        }
        ScraperCommands::Preview { source } => {
            let headlines = pipeline.preview(source).await?;
            println!("{}: {} headlines", source, headlines.len());
            for headline in headlines {
                println!("- {} - {}", headline.title, headline.url);
            }
        }
    }
    Ok(())
}
