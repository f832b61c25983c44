//! Integration tests for [`AgentConfig`] loading.
//!
//! Variables are supplied through a map instead of the process
//! environment so tests can run in parallel.

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use assert_matches::assert_matches;
use netmon_agent::config::{AgentConfig, ConfigError};
use netmon_agent::credentials::CredentialsError;
use netmon_core::bandwidth::Bandwidth;
use tempfile::NamedTempFile;

fn credentials_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn base_vars(credentials: &NamedTempFile) -> HashMap<&'static str, String> {
    HashMap::from([
        ("NETMON_EXPECTED_DOWNLOAD", "10m".to_string()),
        ("NETMON_EXPECTED_UPLOAD", "512k".to_string()),
        (
            "NETMON_CREDENTIALS",
            credentials.path().to_string_lossy().into_owned(),
        ),
        ("NETMON_MESSAGE", "Slow: {download} / {upload}".to_string()),
    ])
}

fn load(vars: &HashMap<&'static str, String>) -> Result<AgentConfig, ConfigError> {
    AgentConfig::from_lookup(|key| vars.get(key).cloned())
}

const VALID_CREDS: &str =
    r#"{ "webhook_url": "https://hooks.example.com/abc", "token": "s3cret" }"#;

// ---------------------------------------------------------------------------
// Test: required variables only -> defaults
// ---------------------------------------------------------------------------

#[test]
fn minimal_environment_uses_defaults() {
    let creds = credentials_file(VALID_CREDS);
    let config = load(&base_vars(&creds)).unwrap();

    assert_eq!(
        config.monitor.expected,
        Bandwidth::new(10.0 * 1024.0 * 1024.0, 512.0 * 1024.0)
    );
    assert_eq!(config.monitor.sensitivity_ratio, 0.4);
    assert_eq!(config.monitor.consecutive_threshold, 5);
    assert_eq!(config.monitor.poll_interval, Duration::from_secs(120));
    assert_eq!(config.monitor.alert_cooldown, Duration::from_secs(3 * 3600));
    assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
    assert_eq!(config.speed_test.upload_bytes, 2 * 1024 * 1024);

    assert_eq!(config.credentials.webhook_url, "https://hooks.example.com/abc");
    assert_eq!(config.credentials.token.as_deref(), Some("s3cret"));
}

// ---------------------------------------------------------------------------
// Test: optional overrides are honoured
// ---------------------------------------------------------------------------

#[test]
fn optional_variables_override_defaults() {
    let creds = credentials_file(VALID_CREDS);
    let mut vars = base_vars(&creds);
    vars.insert("NETMON_INTERVAL_SECS", "30".into());
    vars.insert("NETMON_SENSITIVITY", "0.75".into());
    vars.insert("NETMON_THRESHOLD", "3".into());
    vars.insert("NETMON_COOLDOWN_SECS", "3600".into());
    vars.insert("NETMON_DOWNLOAD_URL", "http://127.0.0.1:9000/down".into());
    vars.insert("NETMON_UPLOAD_URL", "http://127.0.0.1:9000/up".into());
    vars.insert("NETMON_UPLOAD_BYTES", "4096".into());
    vars.insert("NETMON_SAMPLE_TIMEOUT_SECS", "5".into());
    vars.insert("NETMON_SHUTDOWN_TIMEOUT_SECS", "2".into());

    let config = load(&vars).unwrap();

    assert_eq!(config.monitor.poll_interval, Duration::from_secs(30));
    assert_eq!(config.monitor.sensitivity_ratio, 0.75);
    assert_eq!(config.monitor.consecutive_threshold, 3);
    assert_eq!(config.monitor.alert_cooldown, Duration::from_secs(3600));
    assert_eq!(config.speed_test.download_url, "http://127.0.0.1:9000/down");
    assert_eq!(config.speed_test.upload_url, "http://127.0.0.1:9000/up");
    assert_eq!(config.speed_test.upload_bytes, 4096);
    assert_eq!(config.speed_test.timeout, Duration::from_secs(5));
    assert_eq!(config.shutdown_timeout, Duration::from_secs(2));
}

// ---------------------------------------------------------------------------
// Test: missing / malformed values are fatal
// ---------------------------------------------------------------------------

#[test]
fn missing_required_variable_is_reported_by_name() {
    let creds = credentials_file(VALID_CREDS);
    for var in [
        "NETMON_EXPECTED_DOWNLOAD",
        "NETMON_EXPECTED_UPLOAD",
        "NETMON_CREDENTIALS",
        "NETMON_MESSAGE",
    ] {
        let mut vars = base_vars(&creds);
        vars.remove(var);
        assert_matches!(load(&vars), Err(ConfigError::Missing(name)) if name == var);
    }
}

#[test]
fn blank_required_variable_counts_as_missing() {
    let creds = credentials_file(VALID_CREDS);
    let mut vars = base_vars(&creds);
    vars.insert("NETMON_MESSAGE", "   ".into());
    assert_matches!(load(&vars), Err(ConfigError::Missing("NETMON_MESSAGE")));
}

#[test]
fn malformed_speed_is_rejected() {
    let creds = credentials_file(VALID_CREDS);
    let mut vars = base_vars(&creds);
    vars.insert("NETMON_EXPECTED_DOWNLOAD", "10 mbit".into());
    assert_matches!(
        load(&vars),
        Err(ConfigError::Invalid { var: "NETMON_EXPECTED_DOWNLOAD", .. })
    );
}

#[test]
fn malformed_template_is_rejected_at_startup() {
    let creds = credentials_file(VALID_CREDS);
    let mut vars = base_vars(&creds);
    vars.insert("NETMON_MESSAGE", "Slow: {latency}".into());
    assert_matches!(
        load(&vars),
        Err(ConfigError::Invalid { var: "NETMON_MESSAGE", .. })
    );
}

#[test]
fn unparsable_number_is_rejected() {
    let creds = credentials_file(VALID_CREDS);
    let mut vars = base_vars(&creds);
    vars.insert("NETMON_THRESHOLD", "five".into());
    assert_matches!(
        load(&vars),
        Err(ConfigError::Invalid { var: "NETMON_THRESHOLD", .. })
    );
}

#[test]
fn out_of_range_monitor_values_are_rejected() {
    let creds = credentials_file(VALID_CREDS);

    let mut vars = base_vars(&creds);
    vars.insert("NETMON_SENSITIVITY", "1.5".into());
    assert_matches!(load(&vars), Err(ConfigError::Monitor(_)));

    let mut vars = base_vars(&creds);
    vars.insert("NETMON_THRESHOLD", "0".into());
    assert_matches!(load(&vars), Err(ConfigError::Monitor(_)));

    let mut vars = base_vars(&creds);
    vars.insert("NETMON_INTERVAL_SECS", "0".into());
    assert_matches!(load(&vars), Err(ConfigError::Monitor(_)));
}

#[test]
fn zero_upload_bytes_is_rejected() {
    let creds = credentials_file(VALID_CREDS);
    let mut vars = base_vars(&creds);
    vars.insert("NETMON_UPLOAD_BYTES", "0".into());
    assert_matches!(
        load(&vars),
        Err(ConfigError::Invalid { var: "NETMON_UPLOAD_BYTES", .. })
    );
}

// ---------------------------------------------------------------------------
// Test: credential file problems
// ---------------------------------------------------------------------------

#[test]
fn missing_credentials_file_is_rejected() {
    let creds = credentials_file(VALID_CREDS);
    let mut vars = base_vars(&creds);
    vars.insert("NETMON_CREDENTIALS", "/nonexistent/netmon/creds.json".into());
    assert_matches!(
        load(&vars),
        Err(ConfigError::Credentials(CredentialsError::Io { .. }))
    );
}

#[test]
fn credentials_without_webhook_url_are_rejected() {
    let creds = credentials_file(r#"{ "token": "abc" }"#);
    assert_matches!(
        load(&base_vars(&creds)),
        Err(ConfigError::Credentials(CredentialsError::Parse { .. }))
    );
}

#[test]
fn credentials_with_invalid_url_are_rejected() {
    let creds = credentials_file(r#"{ "webhook_url": "ftp://example.com/hook" }"#);
    assert_matches!(
        load(&base_vars(&creds)),
        Err(ConfigError::Credentials(CredentialsError::Invalid { .. }))
    );
}

#[test]
fn token_is_optional_and_blank_token_is_dropped() {
    let creds =
        credentials_file(r#"{ "webhook_url": "https://hooks.example.com/x", "token": "  " }"#);
    let config = load(&base_vars(&creds)).unwrap();
    assert_eq!(config.credentials.token, None);

    let creds = credentials_file(r#"{ "webhook_url": "https://hooks.example.com/x" }"#);
    let config = load(&base_vars(&creds)).unwrap();
    assert_eq!(config.credentials.token, None);
}
