//! Seams to the external collaborators: bandwidth measurement and alert
//! delivery.

use async_trait::async_trait;

use crate::bandwidth::Bandwidth;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A bandwidth measurement could not be taken.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SampleError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl SampleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// An alert could not be delivered.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct NotifyError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl NotifyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Takes one throughput measurement of the monitored link.
///
/// Latency is unbounded; callers must not assume a time budget.
#[async_trait]
pub trait Sampler: Send + Sync {
    async fn measure(&self) -> Result<Bandwidth, SampleError>;
}

/// Publishes an alert message to the notification channel.
///
/// Delivery is not assumed to be idempotent.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, message: &str) -> Result<(), NotifyError>;
}
