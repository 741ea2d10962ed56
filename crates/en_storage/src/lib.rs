use std::path::Path;
use std::sync::Arc;

use en_core::{ArticleStorage, DatabaseConfig, Error, Result};
use tracing::error;

pub mod backends;

pub use backends::*;

pub trait StorageBackend {
    /// Hint printed when the backend cannot be reached
    fn get_error_message() -> &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum StorageKind {
    #[default]
    Postgres,
    Sqlite,
    Memory,
}

pub async fn create_storage(
    kind: StorageKind,
    database: &DatabaseConfig,
    sqlite_path: &Path,
) -> Result<Arc<dyn ArticleStorage>> {
    match kind {
        #[cfg(feature = "postgres")]
        StorageKind::Postgres => Ok(Arc::new(PostgresStorage::connect(database))),
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => {
            let storage = SqliteStorage::new_with_path(sqlite_path).await.map_err(|e| {
                error!("{}", SqliteStorage::get_error_message());
                e
            })?;
            Ok(Arc::new(storage))
        }
        StorageKind::Memory => Ok(Arc::new(MemoryStorage::new())),
        #[allow(unreachable_patterns)]
        other => Err(Error::Config(format!(
            "Storage backend {:?} was not compiled in",
            other
        ))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageKind};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_kind_is_postgres() {
        assert_eq!(StorageKind::default(), StorageKind::Postgres);
    }

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = create_storage(StorageKind::Memory, &DatabaseConfig::default(), Path::new(""))
            .await
            .unwrap();
        storage.ensure_schema().await.unwrap();
        assert!(storage.latest(5).await.unwrap().is_empty());
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_create_sqlite_storage() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("articles.db");
        let storage = create_storage(StorageKind::Sqlite, &DatabaseConfig::default(), &path)
            .await
            .unwrap();
        storage.ensure_schema().await.unwrap();
        storage.close().await;
        assert!(path.exists());
    }
}
