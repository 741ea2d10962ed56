use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use en_core::Article;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

use crate::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const DEFAULT_LIMIT: i64 = 30;

#[derive(Serialize)]
pub struct ErrorResponse {
    detail: String,
}

/// Failure surfaced to API clients as `{"detail": ...}`.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Internal(en_core::Error),
}

impl From<en_core::Error> for ApiError {
    fn from(err: en_core::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Invalid API key".to_string()),
            ApiError::Internal(err) => {
                error!("Request failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Economic News API is running" }))
}

pub async fn list_news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let articles = state.storage.latest(query.limit.max(0)).await?;
    Ok(Json(articles))
}

pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.api_key.as_deref() {
        let provided = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            return Err(ApiError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}
