use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use en_core::clock::{retention_cutoff, JstClock};
use en_core::{dedup_by_url, Article, ArticleStorage, Clock, Headline, Result, Source};
use tracing::{debug, error, info, warn};

use crate::manager::ScraperManager;

/// Where a run currently is. Only a failure before `SchemaReady` aborts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    SchemaReady,
    Scraping,
    Collected,
    Retained,
    Persisted,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Summary of one completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub scraped_at: DateTime<FixedOffset>,
    /// Distinct urls handed to the insert
    pub candidates: usize,
    /// `None` when the retention sweep failed
    pub removed: Option<u64>,
    /// `None` when the insert failed
    pub inserted: Option<u64>,
    pub failed_sources: Vec<Source>,
}

/// Schema setup, concurrent scrape, retention sweep and idempotent insert, in that order.
pub struct Pipeline {
    storage: Arc<dyn ArticleStorage>,
    manager: ScraperManager,
    clock: Arc<dyn Clock>,
}

impl Pipeline {
    pub fn new(storage: Arc<dyn ArticleStorage>, manager: ScraperManager) -> Self {
        Self {
            storage,
            manager,
            clock: Arc::new(JstClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn manager(&self) -> &ScraperManager {
        &self.manager
    }

    pub fn storage(&self) -> &Arc<dyn ArticleStorage> {
        &self.storage
    }

    pub async fn run(&self) -> Result<RunReport> {
        self.run_with(None).await
    }

    /// Runs the pipeline, optionally limited to some sources.
    pub async fn run_with(&self, sources: Option<&[Source]>) -> Result<RunReport> {
        let mut stage = RunStage::Idle;

        if let Err(e) = self.storage.ensure_schema().await {
            error!(%stage, "Database setup failed, not scraping: {}", e);
            return Err(e);
        }
        advance(&mut stage, RunStage::SchemaReady);

        advance(&mut stage, RunStage::Scraping);
        let report = match sources {
            Some(sources) => self.manager.fetch_sources(sources).await,
            None => self.manager.fetch_all().await,
        };
        if let Err(e) = self.manager.shutdown().await {
            warn!("Failed to shut down {} fetcher: {}", self.manager.fetcher_name(), e);
        }
        advance(&mut stage, RunStage::Collected);

        let failed_sources = report.failed_sources();
        let candidates = dedup_by_url(report.into_candidates());
        info!(
            candidates = candidates.len(),
            failed = failed_sources.len(),
            "Scraping finished"
        );

        let scraped_at = self.clock.now();

        let removed = match self.storage.delete_older_than(retention_cutoff(scraped_at)).await {
            Ok(removed) => {
                if removed > 0 {
                    info!(removed, "Deleted articles past the retention window");
                }
                Some(removed)
            }
            Err(e) => {
                error!("Retention sweep failed: {}", e);
                None
            }
        };
        advance(&mut stage, RunStage::Retained);

        let articles: Vec<Article> = candidates
            .into_iter()
            .map(|c| c.stamp(scraped_at))
            .collect();
        let inserted = if articles.is_empty() {
            info!("No articles to save");
            Some(0)
        } else {
            match self.storage.insert_new(&articles).await {
                Ok(inserted) => {
                    info!(
                        inserted,
                        skipped = (articles.len() as u64).saturating_sub(inserted),
                        "Saved articles"
                    );
                    Some(inserted)
                }
                Err(e) => {
                    error!("Saving articles failed: {}", e);
                    None
                }
            }
        };
        advance(&mut stage, RunStage::Persisted);
        advance(&mut stage, RunStage::Idle);

        Ok(RunReport {
            scraped_at,
            candidates: articles.len(),
            removed,
            inserted,
            failed_sources,
        })
    }

    /// Scrapes one source without touching storage.
    pub async fn preview(&self, source: Source) -> Result<Vec<Headline>> {
        let result = self.manager.fetch_one(source).await;
        if let Err(e) = self.manager.shutdown().await {
            warn!("Failed to shut down {} fetcher: {}", self.manager.fetcher_name(), e);
        }
        result
    }
}

fn advance(stage: &mut RunStage, next: RunStage) {
    debug!(from = %stage, to = %next, "Pipeline stage");
    *stage = next;
}
