//! Immutable monitoring parameters.

use std::time::Duration;

use crate::bandwidth::Bandwidth;
use crate::error::CoreError;
use crate::template::MessageTemplate;

/// Fraction of the expected speed below which a sample counts as degraded.
pub const DEFAULT_SENSITIVITY_RATIO: f64 = 0.4;

/// Consecutive degraded samples required before an alert is eligible.
pub const DEFAULT_CONSECUTIVE_THRESHOLD: u64 = 5;

/// Minimum time between two sent alerts.
pub const DEFAULT_ALERT_COOLDOWN: Duration = Duration::from_secs(3 * 60 * 60);

/// Time between two checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(120);

/// Monitoring parameters, validated once and then shared read-only.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Baseline speed the link is provisioned for.
    pub expected: Bandwidth,
    /// In `(0, 1]`.
    pub sensitivity_ratio: f64,
    /// At least 1.
    pub consecutive_threshold: u64,
    pub alert_cooldown: Duration,
    pub message: MessageTemplate,
    /// Must be non-zero.
    pub poll_interval: Duration,
}

impl MonitorConfig {
    /// Build a config with default ratio, threshold, cooldown and interval.
    pub fn new(expected: Bandwidth, message: MessageTemplate) -> Self {
        Self {
            expected,
            sensitivity_ratio: DEFAULT_SENSITIVITY_RATIO,
            consecutive_threshold: DEFAULT_CONSECUTIVE_THRESHOLD,
            alert_cooldown: DEFAULT_ALERT_COOLDOWN,
            message,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Check every range constraint, reporting the first violation.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (direction, value) in [
            ("download", self.expected.download),
            ("upload", self.expected.upload),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::Validation(format!(
                    "Expected {direction} speed must be a non-negative number (got {value})"
                )));
            }
        }

        let ratio = self.sensitivity_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(CoreError::Validation(format!(
                "Sensitivity ratio must be in (0, 1] (got {ratio})"
            )));
        }

        if self.consecutive_threshold == 0 {
            return Err(CoreError::Validation(
                "Consecutive threshold must be at least 1".to_string(),
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(CoreError::Validation(
                "Poll interval must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Speed below which a sample is degraded: `expected * sensitivity_ratio`.
    pub fn effective_expected(&self) -> Bandwidth {
        self.expected.scaled(self.sensitivity_ratio)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
