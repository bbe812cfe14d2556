use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Status-code bucket used for requests that never produced an HTTP response.
pub const EXCEPTION_STATUS_KEY: &str = "exception";

/// Error types for billbench setup and reporting.
///
/// Individual request failures are never represented here: they are recorded
/// as data in [`RequestResult`].
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BenchError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Invalid header '{0}'. Use 'Header: Value'.")]
    InvalidHeader(String),

    #[error("Cannot read payload file {path}: {reason}")]
    PayloadFile { path: String, reason: String },

    #[error("Payload file {path} is not valid JSON: {reason}")]
    PayloadJson { path: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Worker task failed: {0}")]
    Worker(String),

    #[error("Failed to write report to {path}: {reason}")]
    Output { path: String, reason: String },

    #[error("Store error: {0}")]
    Store(String),
}

impl BenchError {
    /// Process exit code for this error: 2 for anything detected before the
    /// first request is sent, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            BenchError::InvalidArgument(_)
            | BenchError::InvalidHeader(_)
            | BenchError::PayloadFile { .. }
            | BenchError::PayloadJson { .. }
            | BenchError::ClientBuild(_) => 2,
            BenchError::Worker(_) | BenchError::Output { .. } | BenchError::Store(_) => 1,
        }
    }
}

/// Result type for billbench operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Category of a failure that happened before a well-formed HTTP response
/// was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransportErrorKind {
    Timeout,
    DnsError,
    TlsError,
    ConnectError,
    /// The response head arrived but the body could not be read.
    ReadError,
    RequestError,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Timeout => "Timeout",
            TransportErrorKind::DnsError => "DnsError",
            TransportErrorKind::TlsError => "TlsError",
            TransportErrorKind::ConnectError => "ConnectError",
            TransportErrorKind::ReadError => "ReadError",
            TransportErrorKind::RequestError => "RequestError",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The server answered. Any status code lands here, including 4xx/5xx.
    Response {
        status: u16,
        response_bytes: u64,
        /// `id` from a 2xx JSON body, when the caller asked for it and it was
        /// present as an integer.
        created_id: Option<i64>,
    },
    Transport(TransportErrorKind),
}

/// Outcome of one executed request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestResult {
    pub latency_ms: f64,
    pub outcome: Outcome,
}

impl RequestResult {
    pub fn response(latency_ms: f64, status: u16, response_bytes: u64, created_id: Option<i64>) -> Self {
        Self {
            latency_ms,
            outcome: Outcome::Response { status, response_bytes, created_id },
        }
    }

    pub fn transport_failure(latency_ms: f64, kind: TransportErrorKind) -> Self {
        Self { latency_ms, outcome: Outcome::Transport(kind) }
    }

    /// `true` iff a response arrived with a status in `200..300`.
    pub fn ok(&self) -> bool {
        matches!(self.outcome, Outcome::Response { status, .. } if (200..300).contains(&status))
    }

    pub fn status_code(&self) -> Option<u16> {
        match self.outcome {
            Outcome::Response { status, .. } => Some(status),
            Outcome::Transport(_) => None,
        }
    }

    /// Body length in bytes; always 0 for transport failures.
    pub fn response_bytes(&self) -> u64 {
        match self.outcome {
            Outcome::Response { response_bytes, .. } => response_bytes,
            Outcome::Transport(_) => 0,
        }
    }

    pub fn error_kind(&self) -> Option<TransportErrorKind> {
        match self.outcome {
            Outcome::Transport(kind) => Some(kind),
            Outcome::Response { .. } => None,
        }
    }

    pub fn created_id(&self) -> Option<i64> {
        match self.outcome {
            Outcome::Response { created_id, .. } => created_id,
            Outcome::Transport(_) => None,
        }
    }

    /// Key for the status-code histogram: the numeric status, or
    /// [`EXCEPTION_STATUS_KEY`] for transport failures.
    pub fn status_key(&self) -> String {
        match self.status_code() {
            Some(status) => status.to_string(),
            None => EXCEPTION_STATUS_KEY.to_string(),
        }
    }
}

/// One line item of a `POST /bills` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillLine {
    pub concept: String,
    pub quantity: f64,
    pub unit_amount: f64,
}

/// JSON body accepted by `POST /bills`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillRequest {
    pub bill_number: String,
    pub issued_at: NaiveDate,
    pub customer_name: String,
    pub currency: String,
    pub tax: f64,
    pub lines: Vec<CreateBillLine>,
}

/// The only part of a created-bill response the benchmark cares about.
///
/// Unknown fields are ignored; a missing `id` deserializes to `None`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedBill {
    #[serde(default)]
    pub id: Option<i64>,
}
