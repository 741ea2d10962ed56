pub mod cli;
pub mod fetcher;
pub mod logging;
pub mod manager;
pub mod pipeline;
pub mod scrapers;

pub use manager::{FetchReport, ScraperManager, SourceOutcome};
pub use pipeline::{Pipeline, RunReport, RunStage};

pub use cli::{handle_command, ScraperArgs, ScraperCommands};
pub use scrapers::Scraper;

pub mod prelude {
    pub use super::fetcher::{PageFetcher, PageSession};
    pub use super::scrapers::Scraper;
    pub use en_core::{Article, Error, Result, Source};
}
