//! Pure alert state machine -- no I/O, no locking.
//!
//! The caller feeds one degraded/healthy verdict per sample and commits an
//! alert only after it was actually delivered.

use std::time::Duration;

use serde::Serialize;

use crate::types::Timestamp;

/// What a single sample means for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Sample at or above the effective threshold; the run was reset.
    Healthy,
    /// Degraded, but this is not the threshold crossing.
    Degraded,
    /// Threshold crossing reached while the cooldown is still running.
    /// No alert will be sent for this run.
    CoolingDown,
    /// Threshold crossing with cooldown elapsed: an alert should be sent.
    AlertDue,
}

/// Consecutive-degradation counter and last alert time.
///
/// The counter is deliberately *not* capped at the threshold: alert
/// eligibility is `count == threshold`, so a sustained outage produces one
/// crossing, not one alert per cooldown window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertState {
    consecutive_degraded: u64,
    last_alert: Option<Timestamp>,
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Length of the current trailing run of degraded samples.
    pub fn consecutive_degraded(&self) -> u64 {
        self.consecutive_degraded
    }

    /// When the last alert was successfully sent, if ever.
    pub fn last_alert(&self) -> Option<Timestamp> {
        self.last_alert
    }

    /// Apply one sample and report whether an alert is due.
    ///
    /// Does not touch `last_alert`; call [`mark_alerted`](Self::mark_alerted)
    /// once the notification went out.
    pub fn record_sample(
        &mut self,
        degraded: bool,
        now: Timestamp,
        threshold: u64,
        cooldown: Duration,
    ) -> Verdict {
        if !degraded {
            self.consecutive_degraded = 0;
            return Verdict::Healthy;
        }

        self.consecutive_degraded = self.consecutive_degraded.saturating_add(1);

        if self.consecutive_degraded != threshold {
            return Verdict::Degraded;
        }

        if self.cooldown_elapsed(now, cooldown) {
            Verdict::AlertDue
        } else {
            Verdict::CoolingDown
        }
    }

    /// Record a delivered alert.
    pub fn mark_alerted(&mut self, now: Timestamp) {
        self.last_alert = Some(now);
    }

    /// `true` if no alert was sent yet or at least `cooldown` has passed.
    ///
    /// A `now` earlier than the last alert (clock stepped back) counts as
    /// not elapsed.
    pub fn cooldown_elapsed(&self, now: Timestamp, cooldown: Duration) -> bool {
        match self.last_alert {
            None => true,
            Some(last) => now
                .signed_duration_since(last)
                .to_std()
                .map(|elapsed| elapsed >= cooldown)
                .unwrap_or(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn at_minute(minute: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minute)
    }

    /// Feed `samples` (true = degraded) two minutes apart, committing every
    /// due alert, and return the 1-based indices that alerted.
    fn run(
        state: &mut AlertState,
        samples: &[bool],
        threshold: u64,
        cooldown: Duration,
    ) -> Vec<usize> {
        let mut alerted = Vec::new();
        for (i, degraded) in samples.iter().enumerate() {
            let now = at_minute(i as i64 * 2);
            if state.record_sample(*degraded, now, threshold, cooldown) == Verdict::AlertDue {
                state.mark_alerted(now);
                alerted.push(i + 1);
            }
        }
        alerted
    }

    #[test]
    fn starts_empty() {
        let state = AlertState::new();
        assert_eq!(state.consecutive_degraded(), 0);
        assert_eq!(state.last_alert(), None);
    }

    #[test]
    fn counter_tracks_trailing_degraded_run() {
        let samples = [true, true, false, true, true, true, false, false, true];
        let mut state = AlertState::new();
        for (i, degraded) in samples.iter().enumerate() {
            state.record_sample(*degraded, at_minute(i as i64), 100, HOUR);
            let trailing = samples[..=i].iter().rev().take_while(|d| **d).count() as u64;
            assert_eq!(state.consecutive_degraded(), trailing, "after sample {}", i + 1);
        }
    }

    #[test]
    fn counter_is_not_capped_at_threshold() {
        let mut state = AlertState::new();
        run(&mut state, &[true; 7], 3, HOUR);
        assert_eq!(state.consecutive_degraded(), 7);
    }

    #[test]
    fn isolated_blip_never_alerts() {
        let mut state = AlertState::new();
        let alerted = run(&mut state, &[true, false, true, false, true, false], 2, HOUR);
        assert!(alerted.is_empty());
        assert_eq!(state.last_alert(), None);
    }

    #[test]
    fn threshold_of_one_alerts_on_first_degraded_sample() {
        let mut state = AlertState::new();
        let alerted = run(&mut state, &[false, true, true], 1, HOUR);
        assert_eq!(alerted, vec![2]);
    }

    #[test]
    fn sustained_outage_alerts_once() {
        let mut state = AlertState::new();
        let alerted = run(&mut state, &[true; 20], 3, Duration::ZERO);
        assert_eq!(alerted, vec![3]);
    }

    #[test]
    fn alerts_again_after_recovery_and_new_run() {
        // Samples are two minutes apart; zero cooldown isolates the run logic.
        let samples = [true, true, true, true, false, true, true, true];
        let mut state = AlertState::new();
        let alerted = run(&mut state, &samples, 3, Duration::ZERO);
        assert_eq!(alerted, vec![3, 8]);
    }

    #[test]
    fn crossing_inside_cooldown_is_missed_for_whole_run() {
        let samples = [true, true, true, false, true, true, true, true, true];
        let mut state = AlertState::new();
        let alerted = run(&mut state, &samples, 3, HOUR);

        // Second crossing (sample 7) is 8 minutes after the first alert.
        assert_eq!(alerted, vec![3]);
        assert_eq!(state.consecutive_degraded(), 5);
    }

    #[test]
    fn crossing_reports_cooling_down() {
        let mut state = AlertState::new();
        state.mark_alerted(at_minute(0));

        assert_eq!(state.record_sample(true, at_minute(1), 2, HOUR), Verdict::Degraded);
        assert_eq!(state.record_sample(true, at_minute(2), 2, HOUR), Verdict::CoolingDown);
        assert_eq!(state.record_sample(true, at_minute(3), 2, HOUR), Verdict::Degraded);
    }

    #[test]
    fn cooldown_boundary_is_inclusive() {
        let mut state = AlertState::new();
        state.mark_alerted(at_minute(0));

        assert!(!state.cooldown_elapsed(at_minute(59), HOUR));
        assert!(state.cooldown_elapsed(at_minute(60), HOUR));
    }

    #[test]
    fn clock_going_backwards_keeps_cooldown_active() {
        let mut state = AlertState::new();
        state.mark_alerted(at_minute(120));
        assert!(!state.cooldown_elapsed(at_minute(0), Duration::ZERO));
    }

    #[test]
    fn uncommitted_alert_stays_eligible_for_cooldown() {
        let mut state = AlertState::new();
        assert_eq!(state.record_sample(true, at_minute(0), 1, HOUR), Verdict::AlertDue);
        // Delivery failed: nothing committed.
        assert_eq!(state.last_alert(), None);
        assert!(state.cooldown_elapsed(at_minute(1), HOUR));
    }
}
