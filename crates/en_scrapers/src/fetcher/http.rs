use std::time::Duration;

use async_trait::async_trait;
use en_core::{Error, Result};
use reqwest::{Client, ClientBuilder};
use tracing::debug;

use super::{PageFetcher, PageSession};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Plain GET requests; no script execution.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .build()?;
        Ok(Self { client })
    }
}

struct HttpSession {
    client: Client,
}

fn navigation_error(url: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Navigation(format!("Timed out loading {}", url))
    } else {
        Error::Navigation(format!("Failed to load {}: {}", url, err))
    }
}

#[async_trait]
impl PageSession for HttpSession {
    async fn load(&mut self, url: &str, timeout: Duration) -> Result<String> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| navigation_error(url, e))?;
        response.text().await.map_err(|e| navigation_error(url, e))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn open_session(&self) -> Result<Box<dyn PageSession>> {
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{}/list", addr)
    }

    #[tokio::test]
    async fn test_load_returns_body() {
        let url = serve_once("HTTP/1.1 200 OK", "<p>hello</p>").await;
        let fetcher = HttpFetcher::new().unwrap();
        let mut session = fetcher.open_session().await.unwrap();
        let html = session.load(&url, Duration::from_secs(5)).await.unwrap();
        assert_eq!(html, "<p>hello</p>");
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_error_status_is_navigation_error() {
        let url = serve_once("HTTP/1.1 503 Service Unavailable", "down").await;
        let fetcher = HttpFetcher::new().unwrap();
        let mut session = fetcher.open_session().await.unwrap();
        let err = session.load(&url, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, Error::Navigation(_)));
    }
}
