use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use en_core::{ArticleStorage, Result, ServerConfig};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let state = Arc::new(state);

    let news = Router::new()
        .route("/news", get(handlers::list_news))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::require_api_key,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .merge(news)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(config: ServerConfig, storage: Arc<dyn ArticleStorage>) -> Result<()> {
    if config.api_key.is_none() {
        info!("No API key configured, /news is open");
    }
    let app = create_app(AppState {
        storage,
        api_key: config.api_key,
    });

    let listener = TcpListener::bind(config.addr).await?;
    info!("Listening on {}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState};
    pub use en_core::{Article, Error, Result};
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{DateTime, Duration, FixedOffset, TimeZone};
    use en_core::clock::jst;
    use en_core::{Article, Error, Source};
    use en_storage::MemoryStorage;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn seeded_storage() -> Arc<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::new());
        let base = jst().with_ymd_and_hms(2025, 8, 1, 9, 0, 0).unwrap();
        let articles: Vec<Article> = (0..5)
            .map(|i| Article {
                source: Source::ALL[i % 3],
                title: format!("headline {}", i),
                url: format!("https://news.example/{}", i),
                scraped_at: base + Duration::hours(i as i64),
            })
            .collect();
        storage.insert_new(&articles).await.unwrap();
        storage
    }

    async fn get_json(app: Router, uri: &str, api_key: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().uri(uri);
        if let Some(key) = api_key {
            request = request.header("X-API-Key", key);
        }
        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_root() {
        let app = create_app(AppState {
            storage: Arc::new(MemoryStorage::new()),
            api_key: None,
        });
        let (status, body) = get_json(app, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Economic News API is running");
    }

    #[tokio::test]
    async fn test_news_newest_first_with_limit() {
        let app = create_app(AppState {
            storage: seeded_storage().await,
            api_key: None,
        });
        let (status, body) = get_json(app, "/news?limit=2", None).await;
        assert_eq!(status, StatusCode::OK);

        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["url"], "https://news.example/4");
        assert_eq!(rows[0]["source"], "Yahoo");
        assert_eq!(rows[0]["scraped_at"], "2025-08-01T13:00:00+09:00");
        assert_eq!(rows[1]["url"], "https://news.example/3");
        assert_eq!(rows[1]["source"], "日経");
        assert_eq!(rows[0].as_object().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_news_default_limit() {
        let app = create_app(AppState {
            storage: seeded_storage().await,
            api_key: None,
        });
        let (_, body) = get_json(app, "/news", None).await;
        assert_eq!(body.as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_news_requires_api_key_when_configured() {
        let app = create_app(AppState {
            storage: seeded_storage().await,
            api_key: Some("s3cret".to_string()),
        });

        let (status, body) = get_json(app.clone(), "/news", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Invalid API key");

        let (status, _) = get_json(app.clone(), "/news", Some("wrong")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = get_json(app.clone(), "/news?limit=1", Some("s3cret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = get_json(app, "/", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    struct BrokenStorage;

    #[async_trait::async_trait]
    impl ArticleStorage for BrokenStorage {
        async fn ensure_schema(&self) -> Result<()> {
            Ok(())
        }

        async fn delete_older_than(&self, _cutoff: DateTime<FixedOffset>) -> Result<u64> {
            Ok(0)
        }

        async fn insert_new(&self, _articles: &[Article]) -> Result<u64> {
            Ok(0)
        }

        async fn latest(&self, _limit: i64) -> Result<Vec<Article>> {
            Err(Error::Database("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_news_storage_failure_is_500() {
        let app = create_app(AppState {
            storage: Arc::new(BrokenStorage),
            api_key: None,
        });
        let (status, body) = get_json(app, "/news", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .contains("connection refused"));
    }
}
