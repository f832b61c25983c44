//! One check: sample, classify, maybe alert.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::bandwidth::{format_speed, Bandwidth};
use crate::error::CoreError;
use crate::types::Timestamp;

use super::config::MonitorConfig;
use super::state::{AlertState, Verdict};
use super::traits::{Notifier, NotifyError, SampleError, Sampler};

/// Result of a single successful check, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Outcome {
    pub bandwidth: Bandwidth,
    pub degraded: bool,
    pub consecutive_degraded: u64,
    pub alerted: bool,
}

/// Errors that end a check early.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// The sampler failed; alert state was not touched.
    #[error("Bandwidth sample unavailable: {0}")]
    SampleUnavailable(#[from] SampleError),

    /// The notifier failed; the degraded count was updated but the alert
    /// was not recorded as sent.
    #[error("Alert notification failed: {0}")]
    NotificationFailed(#[from] NotifyError),
}

/// Owns the alert state and decides, per sample, whether to notify.
///
/// Designed to be shared as `Arc<AlertEvaluator>`. State mutation and the
/// notification it may trigger happen under one lock; the sampler runs
/// outside it.
pub struct AlertEvaluator {
    config: MonitorConfig,
    effective: Bandwidth,
    sampler: Arc<dyn Sampler>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<AlertState>,
}

impl std::fmt::Debug for AlertEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertEvaluator")
            .field("config", &self.config)
            .field("effective", &self.effective)
            .finish_non_exhaustive()
    }
}

impl AlertEvaluator {
    /// Validate `config` and create an evaluator with empty state.
    pub fn new(
        config: MonitorConfig,
        sampler: Arc<dyn Sampler>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let effective = config.effective_expected();

        tracing::info!(
            download = %format_speed(effective.download),
            upload = %format_speed(effective.upload),
            "Minimum expected speed",
        );

        Ok(Self {
            config,
            effective,
            sampler,
            notifier,
            state: Mutex::new(AlertState::new()),
        })
    }

    /// Speed below which a sample counts as degraded.
    pub fn effective_expected(&self) -> Bandwidth {
        self.effective
    }

    /// Copy of the current alert state.
    pub async fn snapshot(&self) -> AlertState {
        *self.state.lock().await
    }

    /// Take one sample and update alert state, notifying on a threshold
    /// crossing when the cooldown allows it.
    pub async fn check(&self, now: Timestamp) -> Result<Outcome, CheckError> {
        tracing::debug!("Starting check");

        let bandwidth = self.sampler.measure().await?;
        tracing::info!(
            download = %format_speed(bandwidth.download),
            upload = %format_speed(bandwidth.upload),
            "Current speed",
        );

        let degraded = bandwidth.falls_below(&self.effective);
        let threshold = self.config.consecutive_threshold;

        let mut state = self.state.lock().await;
        let verdict = state.record_sample(degraded, now, threshold, self.config.alert_cooldown);
        let consecutive_degraded = state.consecutive_degraded();

        if degraded {
            tracing::warn!(
                consecutive_degraded,
                threshold,
                "Detected bandwidth under minimal expected",
            );
        }

        let alerted = match verdict {
            Verdict::Healthy => {
                tracing::debug!("Everything working as expected");
                false
            }
            Verdict::Degraded => false,
            Verdict::CoolingDown => {
                tracing::info!(
                    last_alert = ?state.last_alert(),
                    "Threshold reached inside cooldown window, alert suppressed",
                );
                false
            }
            Verdict::AlertDue => {
                tracing::warn!("Bandwidth low for too long, sending alert");
                let message = self.config.message.render(&bandwidth);
                tracing::debug!(message = %message, "Formatted alert");

                self.notifier.publish(&message).await?;
                state.mark_alerted(now);
                true
            }
        };
        drop(state);

        tracing::debug!("Finished check");

        Ok(Outcome {
            bandwidth,
            degraded,
            consecutive_degraded,
            alerted,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
