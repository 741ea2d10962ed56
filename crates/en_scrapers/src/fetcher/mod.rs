//! Page loading backends.
//!
//! A [`PageFetcher`] hands out one [`PageSession`] per adapter run. Sessions
//! are owned exclusively by the adapter that opened them and must be closed
//! by it whether or not the load succeeded.

use std::time::Duration;

use async_trait::async_trait;
use en_core::Result;

#[cfg(feature = "browser")]
pub mod browser;
pub mod http;

#[cfg(test)]
pub(crate) mod fixture;

#[cfg(feature = "browser")]
pub use browser::{BrowserFetcher, BrowserOptions};
pub use http::HttpFetcher;

/// Default bound on a single listing page load.
pub const DEFAULT_NAV_TIMEOUT: Duration = Duration::from_secs(60);

#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigate to `url` and return the loaded document's HTML.
    async fn load(&mut self, url: &str, timeout: Duration) -> Result<String>;

    async fn close(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    fn name(&self) -> &str;

    async fn open_session(&self) -> Result<Box<dyn PageSession>>;

    /// Release anything shared between sessions. Called once all sessions are closed.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}
