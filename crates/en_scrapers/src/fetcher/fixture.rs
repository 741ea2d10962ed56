use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use en_core::{Error, Result};

use super::{PageFetcher, PageSession};

#[derive(Debug, Clone)]
enum Canned {
    Html(String),
    Fail(String),
    Hang,
}

#[derive(Debug, Default)]
pub struct SessionCounters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub shutdowns: AtomicUsize,
}

/// Serves canned pages keyed by URL; unknown URLs fail like a dead host.
#[derive(Clone, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, Canned>,
    delay: Duration,
    pub counters: Arc<SessionCounters>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), Canned::Html(html.to_string()));
        self
    }

    pub fn with_failure(mut self, url: &str, message: &str) -> Self {
        self.pages.insert(url.to_string(), Canned::Fail(message.to_string()));
        self
    }

    /// The load never finishes on its own; only the navigation timeout ends it.
    pub fn with_hang(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), Canned::Hang);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

struct StaticSession {
    pages: HashMap<String, Canned>,
    delay: Duration,
    counters: Arc<SessionCounters>,
}

#[async_trait]
impl PageSession for StaticSession {
    async fn load(&mut self, url: &str, timeout: Duration) -> Result<String> {
        let page = self.pages.get(url).cloned();
        let delay = self.delay;
        let load = async move {
            tokio::time::sleep(delay).await;
            match page {
                Some(Canned::Html(html)) => Ok(html),
                Some(Canned::Fail(message)) => Err(Error::Navigation(message)),
                Some(Canned::Hang) => futures::future::pending::<Result<String>>().await,
                None => Err(Error::Navigation(format!("No route to {}", url))),
            }
        };
        tokio::time::timeout(timeout, load)
            .await
            .map_err(|_| Error::Navigation(format!("Timed out loading {}", url)))?
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    fn name(&self) -> &str {
        "static"
    }

    async fn open_session(&self) -> Result<Box<dyn PageSession>> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticSession {
            pages: self.pages.clone(),
            delay: self.delay,
            counters: self.counters.clone(),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        self.counters.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
