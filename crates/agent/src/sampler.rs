//! HTTP throughput measurement.
//!
//! [`HttpSpeedTest`] times a download from one endpoint and an upload to
//! another and reports both as bytes per second. Connection setup is part
//! of the measured time.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use netmon_core::bandwidth::Bandwidth;
use netmon_core::monitoring::{SampleError, Sampler};

/// Default download endpoint; serves the requested number of bytes.
pub const DEFAULT_DOWNLOAD_URL: &str = "https://speed.cloudflare.com/__down?bytes=25000000";

/// Default upload endpoint; accepts and discards a POST body.
pub const DEFAULT_UPLOAD_URL: &str = "https://speed.cloudflare.com/__up";

/// Default upload payload size: 2 MiB.
pub const DEFAULT_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

/// Default per-request timeout.
pub const DEFAULT_SAMPLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Guards against dividing by a zero elapsed time on very fast transfers.
const MIN_ELAPSED_SECS: f64 = 1e-6;

/// Endpoints and limits for a speed test.
#[derive(Debug, Clone)]
pub struct SpeedTestConfig {
    pub download_url: String,
    pub upload_url: String,
    pub upload_bytes: usize,
    pub timeout: Duration,
}

impl Default for SpeedTestConfig {
    fn default() -> Self {
        Self {
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            upload_bytes: DEFAULT_UPLOAD_BYTES,
            timeout: DEFAULT_SAMPLE_TIMEOUT,
        }
    }
}

/// Error type for speed test failures.
#[derive(Debug, thiserror::Error)]
pub enum SpeedTestError {
    /// Transport failure, timeout, or non-2xx status.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{0} transferred no data")]
    EmptyTransfer(&'static str),
}

/// Measures throughput with one timed download and one timed upload.
pub struct HttpSpeedTest {
    client: reqwest::Client,
    config: SpeedTestConfig,
}

impl HttpSpeedTest {
    pub fn new(config: SpeedTestConfig) -> Result<Self, SpeedTestError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Stream the download endpoint's body and return bytes per second.
    pub async fn download(&self) -> Result<f64, SpeedTestError> {
        let start = Instant::now();
        let mut response = self
            .client
            .get(&self.config.download_url)
            .send()
            .await?
            .error_for_status()?;

        let mut total: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            total += chunk.len() as u64;
        }

        if total == 0 {
            return Err(SpeedTestError::EmptyTransfer("Download"));
        }

        let elapsed = start.elapsed();
        tracing::debug!(
            bytes = total,
            elapsed_ms = elapsed.as_millis() as u64,
            "Download finished"
        );
        Ok(rate(total, elapsed))
    }

    /// POST `upload_bytes` zero bytes and return bytes per second.
    pub async fn upload(&self) -> Result<f64, SpeedTestError> {
        let size = self.config.upload_bytes;
        if size == 0 {
            return Err(SpeedTestError::EmptyTransfer("Upload"));
        }
        let payload = vec![0u8; size];

        let start = Instant::now();
        self.client
            .post(&self.config.upload_url)
            .body(payload)
            .send()
            .await?
            .error_for_status()?;

        let elapsed = start.elapsed();
        tracing::debug!(bytes = size, elapsed_ms = elapsed.as_millis() as u64, "Upload finished");
        Ok(rate(size as u64, elapsed))
    }
}

#[async_trait]
impl Sampler for HttpSpeedTest {
    async fn measure(&self) -> Result<Bandwidth, SampleError> {
        let download = self
            .download()
            .await
            .map_err(|e| SampleError::with_source(format!("Download test failed: {e}"), e))?;
        let upload = self
            .upload()
            .await
            .map_err(|e| SampleError::with_source(format!("Upload test failed: {e}"), e))?;
        Ok(Bandwidth::new(download, upload))
    }
}

fn rate(bytes: u64, elapsed: Duration) -> f64 {
    bytes as f64 / elapsed.as_secs_f64().max(MIN_ELAPSED_SECS)
}
