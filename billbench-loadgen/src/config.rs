use billbench_client::{ClientConfig, RequestSpec};
use billbench_common::{BenchError, Result};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::worker::RequestBodies;

/// Immutable parameters for one benchmark invocation.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub request: RequestSpec,
    pub bodies: RequestBodies,
    pub total_requests: usize,
    pub concurrency: usize,
    pub timeout: Duration,
    pub warmup_requests: usize,
    pub output_json: Option<PathBuf>,
}

impl RunConfig {
    /// Number of workers actually started: never more than there are requests.
    pub fn worker_count(&self) -> usize {
        self.concurrency.min(self.total_requests)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig { timeout: self.timeout }
    }
}

/// Connection settings for the bills database, used only by cleanup.
#[derive(Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `value` as a count that must be at least 1.
pub fn positive_count(flag: &str, value: i64) -> Result<usize> {
    if value <= 0 {
        return Err(BenchError::InvalidArgument(format!("{flag} must be greater than 0")));
    }
    usize::try_from(value)
        .map_err(|_| BenchError::InvalidArgument(format!("{flag} is too large")))
}

/// `value` as a count that may be 0.
pub fn non_negative_count(flag: &str, value: i64) -> Result<usize> {
    if value < 0 {
        return Err(BenchError::InvalidArgument(format!("{flag} must be 0 or greater")));
    }
    usize::try_from(value)
        .map_err(|_| BenchError::InvalidArgument(format!("{flag} is too large")))
}

pub fn timeout_from_secs(flag: &str, secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(BenchError::InvalidArgument(format!("{flag} must be greater than 0")));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|_| BenchError::InvalidArgument(format!("{flag} is too large")))
}

/// Read a JSON request body from disk. The file must hold valid JSON; it is
/// re-encoded compactly so every request sends identical bytes.
pub fn load_payload(path: &Path) -> Result<Bytes> {
    let display = path.display().to_string();
    let raw = std::fs::read(path).map_err(|e| BenchError::PayloadFile {
        path: display.clone(),
        reason: e.to_string(),
    })?;
    let value: serde_json::Value = serde_json::from_slice(&raw).map_err(|e| BenchError::PayloadJson {
        path: display.clone(),
        reason: e.to_string(),
    })?;
    let encoded = serde_json::to_vec(&value).map_err(|e| BenchError::PayloadJson {
        path: display,
        reason: e.to_string(),
    })?;
    Ok(Bytes::from(encoded))
}
