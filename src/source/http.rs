use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use tokio_retry::{strategy::ExponentialBackoff, Retry};

use super::EventSource;
use crate::card::{EventCard, FetchTask};

/// Pause before the single retry
const RETRY_DELAY: Duration = Duration::from_millis(250);

/// Per-request timeout that leaves room for both attempts and the backoff
/// inside one task deadline. Deadlines too short to retry go to one attempt.
pub fn attempt_timeout(deadline: Duration) -> Duration {
    let split = deadline.saturating_sub(RETRY_DELAY) / 2;
    if split.is_zero() {
        deadline
    } else {
        split
    }
}

/// Fetches pre-parsed event JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpEventSource {
    client: reqwest::Client,
}

/// Failure of a single attempt, tagged with whether another try makes sense
#[derive(Debug)]
enum Attempt {
    Retryable(anyhow::Error),
    Fatal(anyhow::Error),
}

impl HttpEventSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Ok(Self::new(super::create_client(timeout)?))
    }

    /// Client sized so a timed-out first attempt still leaves time to retry
    /// before `deadline` expires.
    pub fn within_deadline(deadline: Duration) -> Result<Self> {
        Self::with_timeout(attempt_timeout(deadline))
    }

    async fn attempt(&self, url: &str) -> std::result::Result<EventCard, Attempt> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Attempt::Retryable(anyhow!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let err = anyhow!("{} returned {}", url, status);
            return Err(if is_retryable(status) {
                Attempt::Retryable(err)
            } else {
                Attempt::Fatal(err)
            });
        }

        response
            .json::<EventCard>()
            .await
            .map_err(|e| Attempt::Fatal(anyhow!("invalid event JSON from {}: {}", url, e)))
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn fetch(&self, task: &FetchTask) -> Result<EventCard> {
        // One retry at most, and only for transport errors or retryable statuses
        let retry_strategy = ExponentialBackoff::from_millis(RETRY_DELAY.as_millis() as u64)
            .max_delay(Duration::from_secs(2))
            .take(1);

        let url = task.source_url.as_str();
        let event_key = task.event_key.as_str();
        let result = Retry::spawn(retry_strategy, move || async move {
            match self.attempt(url).await {
                Ok(card) => Ok(Ok(card)),
                Err(Attempt::Retryable(e)) => {
                    tracing::debug!(event = %event_key, error = %e, "retryable fetch failure");
                    Err(e)
                }
                Err(Attempt::Fatal(e)) => Ok(Err(e)),
            }
        })
        .await;

        let card = result
            .and_then(|inner| inner)
            .with_context(|| format!("Failed to fetch event {}", task.event_key))?;
        Ok(card)
    }

    fn name(&self) -> &str {
        "http"
    }
}
