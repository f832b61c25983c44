//! Webhook delivery with exponential-backoff retry.
//!
//! [`WebhookDelivery`] sends an alert message as JSON to an external URL via
//! HTTP POST, optionally authenticated with a bearer token. Failed attempts
//! are retried twice with exponential backoff (1 s, 2 s).

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use netmon_core::monitoring::{Notifier, NotifyError};

/// Default retry delays (exponential backoff: 1s, 2s).
const DEFAULT_RETRY_DELAYS: [Duration; 2] = [Duration::from_secs(1), Duration::from_secs(2)];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// WebhookDelivery
// ---------------------------------------------------------------------------

/// Delivers alert messages to a single webhook endpoint.
pub struct WebhookDelivery {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    retry_delays: Vec<Duration>,
}

impl WebhookDelivery {
    /// Create a delivery service for `url` with a pre-configured HTTP client.
    pub fn new(url: impl Into<String>, token: Option<String>) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
            token,
            retry_delays: DEFAULT_RETRY_DELAYS.to_vec(),
        })
    }

    /// Replace the backoff schedule. One retry is made per entry.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    /// Deliver a message with retry.
    ///
    /// Returns `Ok(())` on the first successful attempt, otherwise the error
    /// of the final attempt.
    pub async fn deliver(&self, message: &str) -> Result<(), WebhookError> {
        let payload = serde_json::json!({
            "text": message,
            "timestamp": Utc::now().to_rfc3339(),
        });

        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            match self.try_send(&payload).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        url = %self.url,
                        error = %e,
                        "Webhook delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(*delay).await;
                }
            }
        }

        // Final attempt after the last backoff.
        match self.try_send(&payload).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(
                    url = %self.url,
                    error = %e,
                    "Webhook delivery failed after all retries"
                );
                Err(e)
            }
        }
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, payload: &serde_json::Value) -> Result<(), WebhookError> {
        let mut request = self.client.post(&self.url).json(payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookDelivery {
    async fn publish(&self, message: &str) -> Result<(), NotifyError> {
        self.deliver(message)
            .await
            .map_err(|e| NotifyError::with_source(format!("Webhook delivery failed: {e}"), e))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
