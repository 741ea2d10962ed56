use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use en_core::clock::jst;
use en_core::{Article, ArticleStorage, DatabaseConfig, Error, Result, Source};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use tracing::{debug, error};

use crate::StorageBackend;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS news_articles (
        id SERIAL PRIMARY KEY,
        source VARCHAR(50) NOT NULL,
        title TEXT NOT NULL,
        url TEXT UNIQUE NOT NULL,
        scraped_at TIMESTAMP WITH TIME ZONE NOT NULL
    )
"#;

/// Rows per INSERT statement; keeps bind parameters far below the protocol limit.
const INSERT_CHUNK: usize = 500;

pub struct PostgresStorage {
    pool: PgPool,
}

impl StorageBackend for PostgresStorage {
    fn get_error_message() -> &'static str {
        "PostgreSQL should be reachable with POSTGRES_USER/POSTGRES_PASSWORD/POSTGRES_DB at DB_HOST:DB_PORT"
    }
}

impl PostgresStorage {
    /// Builds a lazily connecting pool; the first query opens the connection.
    pub fn connect(config: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);
        Self::with_options(options)
    }

    pub fn from_url(url: &str) -> Result<Self> {
        let options = PgConnectOptions::from_str(url)
            .map_err(|e| Error::Config(format!("Invalid PostgreSQL URL: {}", e)))?;
        Ok(Self::with_options(options))
    }

    fn with_options(options: PgConnectOptions) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_lazy_with(options);
        Self { pool }
    }
}

fn row_to_article(row: &PgRow) -> Result<Article> {
    let source: String = row
        .try_get("source")
        .map_err(|e| Error::Database(format!("Failed to read source: {}", e)))?;
    let scraped_at: DateTime<Utc> = row
        .try_get("scraped_at")
        .map_err(|e| Error::Database(format!("Failed to read scraped_at: {}", e)))?;

    Ok(Article {
        source: Source::from_str(&source)
            .map_err(|e| Error::Storage(format!("Unexpected source column value: {}", e)))?,
        title: row
            .try_get("title")
            .map_err(|e| Error::Database(format!("Failed to read title: {}", e)))?,
        url: row
            .try_get("url")
            .map_err(|e| Error::Database(format!("Failed to read url: {}", e)))?,
        scraped_at: scraped_at.with_timezone(&jst()),
    })
}

#[async_trait]
impl ArticleStorage for PostgresStorage {
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await.map_err(|e| {
            error!("{}", Self::get_error_message());
            Error::Database(format!("Failed to create news_articles: {}", e))
        })?;
        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<FixedOffset>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM news_articles WHERE scraped_at < $1")
            .bind(cutoff.with_timezone(&Utc))
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to delete old articles: {}", e)))?;
        Ok(result.rows_affected())
    }

    async fn insert_new(&self, articles: &[Article]) -> Result<u64> {
        if articles.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Database(format!("Failed to open transaction: {}", e)))?;

        let mut inserted = 0;
        for chunk in articles.chunks(INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO news_articles (source, title, url, scraped_at) ");
            builder.push_values(chunk, |mut row, article| {
                row.push_bind(article.source.label())
                    .push_bind(article.title.clone())
                    .push_bind(article.url.clone())
                    .push_bind(article.scraped_at.with_timezone(&Utc));
            });
            builder.push(" ON CONFLICT (url) DO NOTHING");

            let result = builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| Error::Database(format!("Failed to insert articles: {}", e)))?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| Error::Database(format!("Failed to commit articles: {}", e)))?;
        debug!(batch = articles.len(), inserted, "Batch insert finished");

        Ok(inserted)
    }

    async fn latest(&self, limit: i64) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            r#"
            SELECT source, title, url, scraped_at FROM news_articles
            ORDER BY scraped_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to read latest articles: {}", e)))?;

        rows.iter().map(row_to_article).collect()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
