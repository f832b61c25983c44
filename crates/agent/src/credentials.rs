//! Webhook credential file.
//!
//! The credential file is a JSON object:
//!
//! ```json
//! { "webhook_url": "https://hooks.example.com/T000/B000", "token": "optional" }
//! ```
//!
//! It is read once at startup; any problem with it is fatal.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Where and how to deliver alerts.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookCredentials {
    pub webhook_url: String,
    /// Sent as `Authorization: Bearer <token>` when present.
    #[serde(default)]
    pub token: Option<String>,
}

/// Error type for credential loading failures.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("Failed to read credentials file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed credentials file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid credentials in {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

impl WebhookCredentials {
    /// Read and validate the credential file at `path`.
    pub fn load(path: &Path) -> Result<Self, CredentialsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CredentialsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut creds: WebhookCredentials =
            serde_json::from_str(&raw).map_err(|source| CredentialsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        creds.webhook_url = creds.webhook_url.trim().to_string();
        creds.token = creds
            .token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        if let Err(reason) = validate_webhook_url(&creds.webhook_url) {
            return Err(CredentialsError::Invalid {
                path: path.to_path_buf(),
                reason,
            });
        }

        Ok(creds)
    }
}

/// Only absolute `http`/`https` URLs are accepted.
fn validate_webhook_url(url: &str) -> Result<(), String> {
    if url.is_empty() {
        return Err("webhook_url must not be empty".to_string());
    }
    let parsed =
        reqwest::Url::parse(url).map_err(|e| format!("webhook_url is not a valid URL: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("webhook_url scheme must be http or https (got {other})")),
    }
}
