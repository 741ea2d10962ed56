use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use en_core::{Article, ArticleStorage, Result};
use tokio::sync::RwLock;

use crate::StorageBackend;

#[derive(Debug, Clone)]
struct StoredRow {
    id: i64,
    article: Article,
}

#[derive(Debug, Default)]
struct MemoryStore {
    next_id: i64,
    rows: Vec<StoredRow>,
}

impl MemoryStore {
    fn insert_new(&mut self, articles: &[Article]) -> u64 {
        let mut inserted = 0;
        for article in articles {
            if self.rows.iter().any(|row| row.article.url == article.url) {
                continue;
            }
            self.next_id += 1;
            self.rows.push(StoredRow {
                id: self.next_id,
                article: article.clone(),
            });
            inserted += 1;
        }
        inserted
    }

    fn delete_older_than(&mut self, cutoff: DateTime<FixedOffset>) -> u64 {
        let before = self.rows.len();
        self.rows.retain(|row| row.article.scraped_at >= cutoff);
        (before - self.rows.len()) as u64
    }

    fn latest(&self, limit: usize) -> Vec<Article> {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            b.article
                .scraped_at
                .cmp(&a.article.scraped_at)
                .then(b.id.cmp(&a.id))
        });
        rows.into_iter().take(limit).map(|row| row.article).collect()
    }
}

/// Process-local article table. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    store: RwLock<MemoryStore>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn find_by_url(&self, url: &str) -> Option<Article> {
        self.store
            .read()
            .await
            .rows
            .iter()
            .find(|row| row.article.url == url)
            .map(|row| row.article.clone())
    }
}

impl StorageBackend for MemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should always be available"
    }
}

#[async_trait]
impl ArticleStorage for MemoryStorage {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<FixedOffset>) -> Result<u64> {
        Ok(self.store.write().await.delete_older_than(cutoff))
    }

    async fn insert_new(&self, articles: &[Article]) -> Result<u64> {
        Ok(self.store.write().await.insert_new(articles))
    }

    async fn latest(&self, limit: i64) -> Result<Vec<Article>> {
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(self.store.read().await.latest(limit))
    }
}
