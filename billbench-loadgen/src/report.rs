use billbench_common::{BenchError, RequestResult, Result};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::cleanup::CleanupReport;
use crate::metrics::{mean, percentile, population_stdev, round2, sorted};

// Reports keep full precision in memory; floats are rounded only when written.
fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*value))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_requests: u64,
    pub success_count: u64,
    pub failure_count: u64,
    #[serde(serialize_with = "two_decimals")]
    pub success_rate_pct: f64,
    #[serde(serialize_with = "two_decimals")]
    pub throughput_req_per_sec: f64,
    #[serde(serialize_with = "two_decimals")]
    pub total_wall_time_sec: f64,
}

/// Latency distribution in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyStats {
    #[serde(serialize_with = "two_decimals")]
    pub min: f64,
    #[serde(serialize_with = "two_decimals")]
    pub avg: f64,
    #[serde(serialize_with = "two_decimals")]
    pub median: f64,
    #[serde(serialize_with = "two_decimals")]
    pub p90: f64,
    #[serde(serialize_with = "two_decimals")]
    pub p95: f64,
    #[serde(serialize_with = "two_decimals")]
    pub p99: f64,
    #[serde(serialize_with = "two_decimals")]
    pub max: f64,
    #[serde(serialize_with = "two_decimals")]
    pub stdev: f64,
}

impl LatencyStats {
    pub fn from_samples(samples: impl IntoIterator<Item = f64>) -> Self {
        let values = sorted(samples);
        Self {
            min: values.first().copied().unwrap_or(0.0),
            avg: mean(&values),
            median: percentile(&values, 50.0),
            p90: percentile(&values, 90.0),
            p95: percentile(&values, 95.0),
            p99: percentile(&values, 99.0),
            max: values.last().copied().unwrap_or(0.0),
            stdev: population_stdev(&values),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeStats {
    pub min: u64,
    #[serde(serialize_with = "two_decimals")]
    pub avg: f64,
    pub max: u64,
}

impl SizeStats {
    pub fn from_sizes(sizes: &[u64]) -> Self {
        if sizes.is_empty() {
            return Self { min: 0, avg: 0.0, max: 0 };
        }
        let total: f64 = sizes.iter().map(|&s| s as f64).sum();
        Self {
            min: sizes.iter().copied().min().unwrap_or(0),
            avg: total / sizes.len() as f64,
            max: sizes.iter().copied().max().unwrap_or(0),
        }
    }
}

/// Statistical summary of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub latency_ms: LatencyStats,
    /// Successful responses only.
    pub response_size_bytes: SizeStats,
    /// Status code (or `"exception"`) → count. Sums to `total_requests`.
    pub status_code_distribution: BTreeMap<String, u64>,
    /// Failure cause → count. Sums to `failure_count`.
    pub error_distribution: BTreeMap<String, u64>,
}

/// Reduce a finished run to a [`Report`]. Result order does not matter.
pub fn build_report(results: &[RequestResult], wall_time: Duration) -> Report {
    let total = results.len() as u64;
    let success_count = results.iter().filter(|r| r.ok()).count() as u64;
    let failure_count = total - success_count;
    let wall_time_sec = wall_time.as_secs_f64();

    let success_rate_pct = if total > 0 {
        success_count as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    let throughput_req_per_sec = if wall_time_sec > 0.0 {
        total as f64 / wall_time_sec
    } else {
        0.0
    };

    let sizes: Vec<u64> = results.iter().filter(|r| r.ok()).map(|r| r.response_bytes()).collect();

    let mut status_code_distribution = BTreeMap::new();
    let mut error_distribution = BTreeMap::new();
    for result in results {
        *status_code_distribution.entry(result.status_key()).or_insert(0) += 1;
        if let Some(cause) = failure_cause(result) {
            *error_distribution.entry(cause).or_insert(0) += 1;
        }
    }

    Report {
        summary: Summary {
            total_requests: total,
            success_count,
            failure_count,
            success_rate_pct,
            throughput_req_per_sec,
            total_wall_time_sec: wall_time_sec,
        },
        latency_ms: LatencyStats::from_samples(results.iter().map(|r| r.latency_ms)),
        response_size_bytes: SizeStats::from_sizes(&sizes),
        status_code_distribution,
        error_distribution,
    }
}

/// Key under which a failed request is counted in `error_distribution`: the
/// transport error kind, or `HttpStatus<code>` for a non-2xx response.
/// `None` for successes.
pub fn failure_cause(result: &RequestResult) -> Option<String> {
    if result.ok() {
        return None;
    }
    match (result.error_kind(), result.status_code()) {
        (Some(kind), _) => Some(kind.as_str().to_string()),
        (None, Some(status)) => Some(format!("HttpStatus{status}")),
        (None, None) => None,
    }
}

/// Ids returned by successful creates, in result order.
pub fn created_ids(results: &[RequestResult]) -> Vec<i64> {
    results.iter().filter(|r| r.ok()).filter_map(|r| r.created_id()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Target {
    pub name: String,
    pub url: String,
}

/// Input parameters of a POST run, echoed into its report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunParameters {
    pub prefix: String,
    pub requests: usize,
    pub concurrency: usize,
    pub timeout_sec: f64,
    pub min_lines: usize,
    pub max_lines: usize,
    pub seed: u64,
    pub lines_per_bill: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    #[serde(flatten)]
    pub base: Summary,
    pub created_count: u64,
    #[serde(serialize_with = "two_decimals")]
    pub created_rate_pct: f64,
    pub http_201_count: u64,
    pub http_409_count: u64,
    pub http_400_count: u64,
    pub http_500_count: u64,
}

/// Report of a `POST /bills` run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostReport {
    pub target: Target,
    pub run: RunParameters,
    pub summary: PostSummary,
    pub latency_ms: LatencyStats,
    pub response_size_bytes: SizeStats,
    pub status_code_distribution: BTreeMap<String, u64>,
    pub error_distribution: BTreeMap<String, u64>,
    pub created_bill_ids: Vec<i64>,
    pub cleanup: CleanupReport,
}

impl PostReport {
    pub fn new(
        target: Target,
        run: RunParameters,
        report: Report,
        created_bill_ids: Vec<i64>,
        cleanup: CleanupReport,
    ) -> Self {
        let status_count = |code: &str| report.status_code_distribution.get(code).copied().unwrap_or(0);
        let total = report.summary.total_requests;
        let created_count = created_bill_ids.len() as u64;
        let created_rate_pct = if total > 0 {
            created_count as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        let summary = PostSummary {
            created_count,
            created_rate_pct,
            http_201_count: status_count("201"),
            http_409_count: status_count("409"),
            http_400_count: status_count("400"),
            http_500_count: status_count("500"),
            base: report.summary,
        };

        Self {
            target,
            run,
            summary,
            latency_ms: report.latency_ms,
            response_size_bytes: report.response_size_bytes,
            status_code_distribution: report.status_code_distribution,
            error_distribution: report.error_distribution,
            created_bill_ids,
            cleanup,
        }
    }

    /// One-line human summary. Numbers are printed the way they appear in
    /// the JSON report, so `50` reads `50.0`.
    pub fn summary_line(&self) -> String {
        format!(
            "{} | success={}% created={}% thr={} req/s avg={}ms p95={}ms p99={}ms deleted={}",
            self.target.name,
            json_number(self.summary.base.success_rate_pct),
            json_number(self.summary.created_rate_pct),
            json_number(self.summary.base.throughput_req_per_sec),
            json_number(self.latency_ms.avg),
            json_number(self.latency_ms.p95),
            json_number(self.latency_ms.p99),
            self.cleanup.deleted_count,
        )
    }
}

// Non-finite values have no JSON form and print as 0.0.
fn json_number(value: f64) -> String {
    serde_json::Number::from_f64(round2(value))
        .map(|n| n.to_string())
        .unwrap_or_else(|| "0.0".to_string())
}

/// Pretty-printed JSON with two-space indentation.
pub fn to_pretty_json(report: &impl Serialize) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(|e| BenchError::Output {
        path: "<stdout>".to_string(),
        reason: e.to_string(),
    })
}

pub fn write_json(path: &Path, report: &impl Serialize) -> Result<()> {
    let json = to_pretty_json(report)?;
    std::fs::write(path, json).map_err(|e| BenchError::Output {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
