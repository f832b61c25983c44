//! Check scheduling.
//!
//! A timer task produces one tick per poll interval into a bounded channel
//! of capacity 1. A single worker task drains the channel and runs
//! [`AlertEvaluator::check`] for each tick, so checks never overlap and a
//! slow check never delays the timer. When a check is still running and a
//! tick is already queued, further ticks are skipped.
//!
//! Each check runs in its own task, so a panicking check is logged and the
//! next tick runs normally.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use netmon_core::monitoring::AlertEvaluator;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;

/// Drives an [`AlertEvaluator`] on a fixed interval until cancelled.
pub struct Scheduler {
    evaluator: Arc<AlertEvaluator>,
    poll_interval: Duration,
    shutdown_timeout: Duration,
}

impl Scheduler {
    pub fn new(
        evaluator: Arc<AlertEvaluator>,
        poll_interval: Duration,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            evaluator,
            poll_interval,
            shutdown_timeout,
        }
    }

    /// Run the scheduling loop.
    ///
    /// The first check fires immediately. Returns once `cancel` is
    /// triggered and the in-flight check has finished, or after
    /// `shutdown_timeout`, whichever comes first. `poll_interval` must be
    /// non-zero.
    pub async fn run(self, cancel: CancellationToken) {
        let (tick_tx, tick_rx) = mpsc::channel::<()>(1);
        let mut worker = tokio::spawn(run_worker(
            Arc::clone(&self.evaluator),
            tick_rx,
            cancel.clone(),
        ));

        tracing::info!(
            interval_secs = self.poll_interval.as_secs(),
            "Bandwidth monitor started"
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Bandwidth monitor stopping");
                    break;
                }
                _ = interval.tick() => {
                    match tick_tx.try_send(()) {
                        Ok(()) => {}
                        Err(TrySendError::Full(())) => {
                            tracing::warn!("Previous check still running, skipping tick");
                        }
                        Err(TrySendError::Closed(())) => {
                            tracing::error!("Check worker exited unexpectedly");
                            break;
                        }
                    }
                }
            }
        }

        drop(tick_tx);

        match tokio::time::timeout(self.shutdown_timeout, &mut worker).await {
            Ok(Ok(())) => tracing::info!("Check worker stopped"),
            Ok(Err(e)) => tracing::error!(error = %e, "Check worker panicked"),
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.shutdown_timeout.as_secs(),
                    "In-flight check did not finish in time, aborting"
                );
                worker.abort();
            }
        }
    }
}

/// Run one check per received tick until the channel closes or `cancel`
/// fires. A check that has already started is always allowed to finish.
async fn run_worker(
    evaluator: Arc<AlertEvaluator>,
    mut ticks: mpsc::Receiver<()>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            tick = ticks.recv() => {
                if tick.is_none() {
                    break;
                }
            }
        }

        let evaluator = Arc::clone(&evaluator);
        // Aborting the worker on shutdown also aborts the check it is awaiting.
        let check = AbortOnDropHandle::new(tokio::spawn(async move {
            evaluator.check(Utc::now()).await
        }));

        match check.await {
            Ok(Ok(outcome)) => {
                tracing::debug!(
                    degraded = outcome.degraded,
                    consecutive_degraded = outcome.consecutive_degraded,
                    alerted = outcome.alerted,
                    "Check complete"
                );
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Bandwidth check failed");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Bandwidth check task panicked");
            }
        }
    }
}
