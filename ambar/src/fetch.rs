//! Remote retrieval of the configuration and compose template.

use ambar_shared::errors::{AmbarError, AmbarResult};
use async_trait::async_trait;
use std::time::Duration;

/// Retrieves a text resource. Binary outcome: the body, or an error.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> AmbarResult<String>;
}

/// HTTP(S) fetcher backed by reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> AmbarResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("ambar/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AmbarError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> AmbarResult<String> {
        let fail = |reason: String| AmbarError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?
            .error_for_status()
            .map_err(|e| fail(e.to_string()))?;

        let body = response.text().await.map_err(|e| fail(e.to_string()))?;
        tracing::debug!(url = %url, bytes = body.len(), "Fetched resource");
        Ok(body)
    }
}
