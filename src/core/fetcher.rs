use crate::core::{ConfigProvider, FetchOutcome, FetchedPage, Fetcher};
use crate::utils::error::{ProbeError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("site-probe/", env!("CARGO_PKG_VERSION"));

/// reqwest 實作。每次呼叫只發一個請求，不重試
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str, max_redirects: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(max_redirects))
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProbeError::ConfigError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        Self::new(
            config.request_timeout(),
            config.user_agent(),
            config.max_redirects(),
        )
    }

    async fn try_fetch(&self, url: &str) -> std::result::Result<FetchedPage, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status_code = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;

        Ok(FetchedPage {
            status_code,
            body,
            headers,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        tracing::debug!("GET {}", url);

        match self.try_fetch(url).await {
            Ok(page) => {
                tracing::debug!(
                    "GET {} -> {} ({} bytes)",
                    url,
                    page.status_code,
                    page.body.len()
                );
                FetchOutcome::Success(page)
            }
            Err(e) => {
                tracing::debug!("GET {} failed: {}", url, e);
                FetchOutcome::Failure {
                    reason: describe_error(&e),
                }
            }
        }
    }
}

fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else if error.is_redirect() {
        "too many redirects".to_string()
    } else if error.is_builder() {
        format!("malformed request: {}", error)
    } else {
        error.to_string()
    }
}
