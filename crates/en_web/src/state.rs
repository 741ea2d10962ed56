use std::sync::Arc;

use en_core::ArticleStorage;

pub struct AppState {
    pub storage: Arc<dyn ArticleStorage>,
    /// Shared secret expected in `X-API-Key`; `None` leaves `/news` open
    pub api_key: Option<String>,
}
