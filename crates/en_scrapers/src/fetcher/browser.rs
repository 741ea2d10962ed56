use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use en_core::{Error, Result};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{PageFetcher, PageSession};

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Show the browser window
    pub headed: bool,
    /// Disable for containers that cannot provide a sandbox
    pub sandbox: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headed: false,
            sandbox: true,
        }
    }
}

struct Running {
    browser: Browser,
    handler: JoinHandle<()>,
}

/// Headless Chromium driven over the DevTools protocol.
///
/// The browser is launched on the first session of a run and torn down by
/// [`PageFetcher::shutdown`]; the next run launches a fresh one.
pub struct BrowserFetcher {
    options: BrowserOptions,
    running: Mutex<Option<Running>>,
}

impl BrowserFetcher {
    pub fn new(options: BrowserOptions) -> Self {
        Self {
            options,
            running: Mutex::new(None),
        }
    }

    async fn launch(&self) -> Result<Running> {
        let mut builder = BrowserConfig::builder();
        if self.options.headed {
            builder = builder.with_head();
        }
        if !self.options.sandbox {
            builder = builder.no_sandbox();
        }
        let config = builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .build()
            .map_err(|e| Error::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::Browser(format!("Failed to launch browser: {}", e)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        info!("Headless browser launched");
        Ok(Running { browser, handler })
    }
}

struct BrowserSession {
    page: Page,
}

#[async_trait]
impl PageSession for BrowserSession {
    async fn load(&mut self, url: &str, timeout: Duration) -> Result<String> {
        debug!(url, "Navigating");
        tokio::time::timeout(timeout, self.page.goto(url))
            .await
            .map_err(|_| Error::Navigation(format!("Timed out after {:?} loading {}", timeout, url)))?
            .map_err(|e| Error::Navigation(format!("Failed to load {}: {}", url, e)))?;

        self.page
            .content()
            .await
            .map_err(|e| Error::Navigation(format!("Failed to read content of {}: {}", url, e)))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.page
            .close()
            .await
            .map_err(|e| Error::Browser(format!("Failed to close page: {}", e)))
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    fn name(&self) -> &str {
        "browser"
    }

    async fn open_session(&self) -> Result<Box<dyn PageSession>> {
        let mut running = self.running.lock().await;
        if running.is_none() {
            *running = Some(self.launch().await?);
        }
        let browser = &running
            .as_ref()
            .ok_or_else(|| Error::Browser("Browser not running".to_string()))?
            .browser;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::Browser(format!("Failed to open page: {}", e)))?;
        Ok(Box::new(BrowserSession { page }))
    }

    async fn shutdown(&self) -> Result<()> {
        let Some(mut running) = self.running.lock().await.take() else {
            return Ok(());
        };

        let closed = running.browser.close().await;
        if let Err(e) = running.browser.wait().await {
            warn!("Browser process did not exit cleanly: {}", e);
        }
        running.handler.abort();
        closed.map_err(|e| Error::Browser(format!("Failed to close browser: {}", e)))?;

        info!("Headless browser closed");
        Ok(())
    }
}
