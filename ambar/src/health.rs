//! Readiness polling after `start`.

use ambar_shared::constants::wait;
use ambar_shared::errors::{AmbarError, AmbarResult};
use async_trait::async_trait;
use std::time::{Duration, Instant};

/// Answers whether a service endpoint is up.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn check(&self, url: &str) -> bool;
}

/// Any HTTP response (whatever the status) counts as up; connection
/// failures do not.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new() -> AmbarResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| AmbarError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn check(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(resp) => {
                tracing::debug!(url, status = %resp.status(), "Health probe answered");
                true
            }
            Err(e) => {
                tracing::trace!(url, error = %e, "Health probe not ready");
                false
            }
        }
    }
}

/// What `start` does after bringing services up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Return immediately.
    Skip,
    /// Poll the frontend until it answers or `timeout` elapses.
    Poll { timeout: Duration, interval: Duration },
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy::Poll {
            timeout: Duration::from_secs(wait::DEFAULT_TIMEOUT_SECS),
            interval: Duration::from_secs(wait::DEFAULT_INTERVAL_SECS),
        }
    }
}

impl WaitPolicy {
    pub fn poll_for(timeout: Duration) -> Self {
        WaitPolicy::Poll {
            timeout,
            interval: Duration::from_secs(wait::DEFAULT_INTERVAL_SECS),
        }
    }
}

/// Poll `probe` until it reports `url` up, bounded by `timeout`.
///
/// Returns how long the wait took.
pub async fn wait_until_ready(
    probe: &dyn HealthProbe,
    url: &str,
    timeout: Duration,
    interval: Duration,
) -> AmbarResult<Duration> {
    let started = Instant::now();
    let poll = async {
        loop {
            if probe.check(url).await {
                return;
            }
            tokio::time::sleep(interval).await;
        }
    };

    tokio::time::timeout(timeout, poll).await.map_err(|_| {
        AmbarError::Timeout(format!(
            "{url} did not respond within {}s",
            timeout.as_secs_f32()
        ))
    })?;
    Ok(started.elapsed())
}
