use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::types::Article;
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Create the `news_articles` table if it does not exist yet
    async fn ensure_schema(&self) -> Result<()>;

    /// Delete every article scraped strictly before `cutoff`, returning how many went
    async fn delete_older_than(&self, cutoff: DateTime<FixedOffset>) -> Result<u64>;

    /// Insert the batch, skipping any article whose url is already stored.
    /// Returns the number of rows actually written.
    async fn insert_new(&self, articles: &[Article]) -> Result<u64>;

    /// Newest articles first, at most `limit` of them
    async fn latest(&self, limit: i64) -> Result<Vec<Article>>;

    async fn close(&self) {}
}
