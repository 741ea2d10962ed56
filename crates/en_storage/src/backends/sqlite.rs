use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use en_core::clock::jst;
use en_core::{Article, ArticleStorage, Error, Result, Source};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::StorageBackend;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS news_articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source TEXT NOT NULL,
        title TEXT NOT NULL,
        url TEXT NOT NULL UNIQUE,
        scraped_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS news_articles_scraped_at ON news_articles (scraped_at)",
];

/// SQLite caps bound parameters per statement; 4 columns per row.
const INSERT_CHUNK: usize = 200;

/// UTC with fixed precision, so comparing the text compares the instants.
fn encode_timestamp(at: &DateTime<FixedOffset>) -> String {
    at.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(raw: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&jst()))
        .map_err(|e| Error::Storage(format!("Failed to parse date {}: {}", raw, e)))
}

pub struct SqliteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl StorageBackend for SqliteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database file should be writable (see --sqlite-path)"
    }
}

impl SqliteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    let source: String = row
        .try_get("source")
        .map_err(|e| Error::Database(format!("Failed to read source: {}", e)))?;
    let scraped_at: String = row
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
        scraped_at: decode_timestamp(&scraped_at)?,
    })
}

#[async_trait]
impl ArticleStorage for SqliteStorage {
    async fn ensure_schema(&self) -> Result<()> {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&self.pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }
        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<FixedOffset>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM news_articles WHERE scraped_at < ?")
            .bind(encode_timestamp(&cutoff))
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
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("INSERT INTO news_articles (source, title, url, scraped_at) ");
            builder.push_values(chunk, |mut row, article| {
                row.push_bind(article.source.label())
                    .push_bind(article.title.clone())
                    .push_bind(article.url.clone())
                    .push_bind(encode_timestamp(&article.scraped_at));
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

        Ok(inserted)
    }

    async fn latest(&self, limit: i64) -> Result<Vec<Article>> {
        let rows = sqlx::query(
            r#"
            SELECT source, title, url, scraped_at FROM news_articles
            ORDER BY scraped_at DESC, id DESC
            LIMIT ?
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
