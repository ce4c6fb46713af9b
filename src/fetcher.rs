use std::time::Duration;

use reqwest::Client;
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;
use tracing::debug;

use crate::config::FetcherConfig;
use crate::models::PageSnapshot;
use crate::utils::error::{AppError, Result};

/// Plain HTTP fetcher producing the classifier's input. A browser-like
/// User-Agent is part of the configuration because storefronts routinely
/// serve interstitials to default library agents.
pub struct PageFetcher {
    client: Client,
    config: FetcherConfig,
}

impl PageFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;
        Ok(Self { client, config })
    }

    /// Fetch one page and snapshot its text, retrying transient failures
    /// on a fixed delay up to the configured number of attempts.
    pub async fn fetch(&self, url: &str) -> Result<PageSnapshot> {
        let strategy = FixedInterval::from_millis(self.config.retry_delay_ms)
            .take(self.config.retry_attempts as usize);

        let body = Retry::spawn(strategy, || self.fetch_once(url)).await?;
        Ok(PageSnapshot::new(&body))
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        debug!(url, "fetching product page");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch {
                url: url.to_string(),
                message: format!("status {}", status),
            });
        }

        Ok(response.text().await?)
    }
}
