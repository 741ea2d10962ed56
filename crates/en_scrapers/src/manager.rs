use std::sync::Arc;
use std::time::Duration;

use en_core::{ArticleCandidate, Error, Headline, Result, Source};
use futures::future::join_all;

use crate::fetcher::{PageFetcher, DEFAULT_NAV_TIMEOUT};
use crate::logging::Logger;
use crate::scrapers::{get_scraper_factories, Scraper, ScraperFactory};

type BoxedScraper = Box<dyn Scraper>;

/// What one adapter produced in a run.
#[derive(Debug)]
pub struct SourceOutcome {
    pub source: Source,
    pub result: Result<Vec<Headline>>,
}

/// Every adapter's outcome, collected after all of them finished.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub outcomes: Vec<SourceOutcome>,
}

impl FetchReport {
    pub fn failed_sources(&self) -> Vec<Source> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| o.source)
            .collect()
    }

    pub fn headline_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(Vec::len)
            .sum()
    }

    /// Successful headlines tagged with their source, in adapter order.
    pub fn into_candidates(self) -> Vec<ArticleCandidate> {
        self.outcomes
            .into_iter()
            .filter_map(|o| {
                let source = o.source;
                o.result
                    .ok()
                    .map(|headlines| headlines.into_iter().map(move |h| ArticleCandidate::new(source, h)))
            })
            .flatten()
            .collect()
    }
}

pub struct ScraperManager {
    fetcher: Arc<dyn PageFetcher>,
    factories: Vec<ScraperFactory>,
    nav_timeout: Duration,
    logger: Logger,
}

impl ScraperManager {
    /// A manager with every known news site registered.
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        let mut manager = Self::empty(fetcher);
        manager.factories = get_scraper_factories();
        manager
    }

    pub fn empty(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            factories: Vec::new(),
            nav_timeout: DEFAULT_NAV_TIMEOUT,
            logger: Logger::new(),
        }
    }

    pub fn with_nav_timeout(mut self, nav_timeout: Duration) -> Self {
        self.nav_timeout = nav_timeout;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn add_scraper_factory(&mut self, factory: ScraperFactory) {
        self.factories.push(factory);
    }

    pub fn fetcher_name(&self) -> &str {
        self.fetcher.name()
    }

    pub fn get_scrapers(&self) -> Vec<BoxedScraper> {
        self.factories.iter().map(|f| f()).collect()
    }

    pub fn get_scraper_for_source(&self, source: Source) -> Result<BoxedScraper> {
        self.get_scrapers()
            .into_iter()
            .find(|s| s.source() == source)
            .ok_or_else(|| Error::Scraping(format!("No scraper registered for {}", source)))
    }

    /// Runs every registered adapter concurrently and waits for all of them.
    pub async fn fetch_all(&self) -> FetchReport {
        self.fetch(self.get_scrapers()).await
    }

    /// Like [`fetch_all`](Self::fetch_all), restricted to `sources`.
    pub async fn fetch_sources(&self, sources: &[Source]) -> FetchReport {
        let scrapers = self
            .get_scrapers()
            .into_iter()
            .filter(|s| sources.contains(&s.source()))
            .collect();
        self.fetch(scrapers).await
    }

    /// Headlines of a single source, failing if its adapter fails.
    pub async fn fetch_one(&self, source: Source) -> Result<Vec<Headline>> {
        let scraper = self.get_scraper_for_source(source)?;
        self.run_scraper(scraper.as_ref()).await.result
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.fetcher.shutdown().await
    }

    async fn fetch(&self, scrapers: Vec<BoxedScraper>) -> FetchReport {
        let runs = scrapers.iter().map(|s| self.run_scraper(s.as_ref()));
        FetchReport {
            outcomes: join_all(runs).await,
        }
    }

    async fn run_scraper(&self, scraper: &dyn Scraper) -> SourceOutcome {
        let source = scraper.source();
        let logger = self.logger.clone().with_prefix(format!("[{}]", source));
        logger.debug(&format!("Loading {}", scraper.listing_url()));

        let result = match self.fetcher.open_session().await {
            Ok(mut session) => {
                let result = scraper.fetch_headlines(session.as_mut(), self.nav_timeout).await;
                if let Err(e) = session.close().await {
                    logger.warn(&format!("Failed to close session: {}", e));
                }
                result
            }
            Err(e) => Err(e),
        };

        match &result {
            Ok(headlines) => logger.info(&format!("Collected {} headlines", headlines.len())),
            Err(e) => logger.error(&format!("Scrape failed: {}", e)),
        }

        SourceOutcome { source, result }
    }
}
