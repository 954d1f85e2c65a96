//! Single-shot page fetch. Retrying is the poll loop's job, not ours.

use std::time::Duration;

use slotwatch_common::error::WatchError;

/// Browser-like User-Agent; some booking sites refuse obvious bots.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

pub struct PageFetcher {
    client: reqwest::Client,
    url: String,
}

impl PageFetcher {
    pub fn new(url: String, timeout: Duration) -> Result<Self, WatchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| WatchError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the target page and return its body.
    pub async fn fetch(&self) -> Result<String, WatchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WatchError::Network(format!("page request timed out: {e}"))
                } else {
                    WatchError::Network(format!("page request failed: {e}"))
                }
            })?
            .error_for_status()
            .map_err(|e| WatchError::Network(format!("page returned error status: {e}")))?;

        let body = response
            .text()
            .await
            .map_err(|e| WatchError::Network(format!("failed to read page body: {e}")))?;

        tracing::debug!(url = %self.url, bytes = body.len(), "Fetched target page");
        Ok(body)
    }
}
