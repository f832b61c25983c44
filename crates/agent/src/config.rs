//! Agent configuration loaded from environment variables.
//!
//! | Variable                       | Required | Default      | Description                              |
//! |--------------------------------|----------|--------------|------------------------------------------|
//! | `NETMON_EXPECTED_DOWNLOAD`     | yes      | --           | Expected download, e.g. `50m`            |
//! | `NETMON_EXPECTED_UPLOAD`       | yes      | --           | Expected upload, e.g. `10m`              |
//! | `NETMON_CREDENTIALS`           | yes      | --           | Path to the webhook credential JSON file |
//! | `NETMON_MESSAGE`               | yes      | --           | Alert template, e.g. `Slow: {download}`  |
//! | `NETMON_INTERVAL_SECS`         | no       | `120`        | Seconds between checks                   |
//! | `NETMON_SENSITIVITY`           | no       | `0.4`        | Fraction of expected speed, in (0, 1]    |
//! | `NETMON_THRESHOLD`             | no       | `5`          | Consecutive degraded samples to alert    |
//! | `NETMON_COOLDOWN_SECS`         | no       | `10800`      | Minimum seconds between alerts           |
//! | `NETMON_DOWNLOAD_URL`          | no       | Cloudflare   | Speed test download endpoint             |
//! | `NETMON_UPLOAD_URL`            | no       | Cloudflare   | Speed test upload endpoint               |
//! | `NETMON_UPLOAD_BYTES`          | no       | `2097152`    | Upload payload size                      |
//! | `NETMON_SAMPLE_TIMEOUT_SECS`   | no       | `60`         | Per-request speed test timeout           |
//! | `NETMON_SHUTDOWN_TIMEOUT_SECS` | no       | `30`         | Wait for an in-flight check on shutdown  |
//!
//! Speeds accept an optional `b`/`k`/`m`/`g` suffix (bytes, KiB, MiB, GiB).

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use netmon_core::bandwidth::{parse_speed, Bandwidth};
use netmon_core::error::CoreError;
use netmon_core::monitoring::config::{
    DEFAULT_ALERT_COOLDOWN, DEFAULT_CONSECUTIVE_THRESHOLD, DEFAULT_POLL_INTERVAL,
    DEFAULT_SENSITIVITY_RATIO,
};
use netmon_core::monitoring::MonitorConfig;
use netmon_core::template::MessageTemplate;

use crate::credentials::{CredentialsError, WebhookCredentials};
use crate::sampler::{SpeedTestConfig, DEFAULT_SAMPLE_TIMEOUT, DEFAULT_UPLOAD_BYTES};

pub const ENV_EXPECTED_DOWNLOAD: &str = "NETMON_EXPECTED_DOWNLOAD";
pub const ENV_EXPECTED_UPLOAD: &str = "NETMON_EXPECTED_UPLOAD";
pub const ENV_CREDENTIALS: &str = "NETMON_CREDENTIALS";
pub const ENV_MESSAGE: &str = "NETMON_MESSAGE";
pub const ENV_INTERVAL_SECS: &str = "NETMON_INTERVAL_SECS";
pub const ENV_SENSITIVITY: &str = "NETMON_SENSITIVITY";
pub const ENV_THRESHOLD: &str = "NETMON_THRESHOLD";
pub const ENV_COOLDOWN_SECS: &str = "NETMON_COOLDOWN_SECS";
pub const ENV_DOWNLOAD_URL: &str = "NETMON_DOWNLOAD_URL";
pub const ENV_UPLOAD_URL: &str = "NETMON_UPLOAD_URL";
pub const ENV_UPLOAD_BYTES: &str = "NETMON_UPLOAD_BYTES";
pub const ENV_SAMPLE_TIMEOUT_SECS: &str = "NETMON_SAMPLE_TIMEOUT_SECS";
pub const ENV_SHUTDOWN_TIMEOUT_SECS: &str = "NETMON_SHUTDOWN_TIMEOUT_SECS";

/// Default wait for an in-flight check during shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Startup configuration errors. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error("Invalid monitoring parameters: {0}")]
    Monitor(#[from] CoreError),
}

/// Everything the agent needs to start.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub monitor: MonitorConfig,
    pub credentials_path: PathBuf,
    pub credentials: WebhookCredentials,
    pub speed_test: SpeedTestConfig,
    pub shutdown_timeout: Duration,
}

impl AgentConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variable names. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let download = speed(&get, ENV_EXPECTED_DOWNLOAD)?;
        let upload = speed(&get, ENV_EXPECTED_UPLOAD)?;

        let message = MessageTemplate::parse(&required(&get, ENV_MESSAGE)?).map_err(|e| {
            ConfigError::Invalid {
                var: ENV_MESSAGE,
                reason: e.to_string(),
            }
        })?;

        let credentials_path = PathBuf::from(required(&get, ENV_CREDENTIALS)?);
        let credentials = WebhookCredentials::load(&credentials_path)?;

        let mut monitor = MonitorConfig::new(Bandwidth::new(download, upload), message);
        monitor.poll_interval = Duration::from_secs(parsed(
            &get,
            ENV_INTERVAL_SECS,
            DEFAULT_POLL_INTERVAL.as_secs(),
        )?);
        monitor.sensitivity_ratio = parsed(&get, ENV_SENSITIVITY, DEFAULT_SENSITIVITY_RATIO)?;
        monitor.consecutive_threshold =
            parsed(&get, ENV_THRESHOLD, DEFAULT_CONSECUTIVE_THRESHOLD)?;
        monitor.alert_cooldown = Duration::from_secs(parsed(
            &get,
            ENV_COOLDOWN_SECS,
            DEFAULT_ALERT_COOLDOWN.as_secs(),
        )?);
        monitor.validate()?;

        let defaults = SpeedTestConfig::default();
        let speed_test = SpeedTestConfig {
            download_url: get(ENV_DOWNLOAD_URL).unwrap_or(defaults.download_url),
            upload_url: get(ENV_UPLOAD_URL).unwrap_or(defaults.upload_url),
            upload_bytes: parsed(&get, ENV_UPLOAD_BYTES, DEFAULT_UPLOAD_BYTES)?,
            timeout: Duration::from_secs(parsed(
                &get,
                ENV_SAMPLE_TIMEOUT_SECS,
                DEFAULT_SAMPLE_TIMEOUT.as_secs(),
            )?),
        };
        if speed_test.upload_bytes == 0 {
            return Err(ConfigError::Invalid {
                var: ENV_UPLOAD_BYTES,
                reason: "must be greater than zero".to_string(),
            });
        }

        let shutdown_timeout = Duration::from_secs(parsed(
            &get,
            ENV_SHUTDOWN_TIMEOUT_SECS,
            DEFAULT_SHUTDOWN_TIMEOUT.as_secs(),
        )?);

        Ok(Self {
            monitor,
            credentials_path,
            credentials,
            speed_test,
            shutdown_timeout,
        })
    }
}

fn required(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<String, ConfigError> {
    get(var).ok_or(ConfigError::Missing(var))
}

fn parsed<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match get(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: format!("'{raw}': {e}"),
        }),
    }
}

fn speed(get: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<f64, ConfigError> {
    parse_speed(&required(get, var)?).map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}
