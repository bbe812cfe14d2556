use billbench_client::{parse_headers, parse_method, validate_url, Method, RequestSpec};
use billbench_common::{BenchError, Result};
use bytes::Bytes;
use clap::Parser;
use std::path::PathBuf;

use crate::config::{
    load_payload, non_negative_count, positive_count, timeout_from_secs, DbConfig, RunConfig,
};
use crate::report::{RunParameters, Target};
use crate::worker::RequestBodies;
use crate::workload::default_prefix;

/// Arguments of the generic `billbench` driver.
#[derive(Parser, Debug)]
#[command(name = "billbench", about = "Concurrent HTTP benchmark client")]
pub struct BenchArgs {
    /// Endpoint URL to test
    #[arg(long)]
    pub url: String,

    /// HTTP method (GET, POST, ...)
    #[arg(long, default_value = "GET")]
    pub method: String,

    /// Total number of measured requests
    #[arg(long, default_value_t = 100, allow_negative_numbers = true)]
    pub requests: i64,

    /// Number of concurrent workers
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    pub concurrency: i64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    pub timeout_sec: f64,

    /// Header as 'Name: Value' (repeatable)
    #[arg(long = "header")]
    pub headers: Vec<String>,

    /// JSON file sent as the body of every request
    #[arg(long)]
    pub payload_file: Option<PathBuf>,

    /// Unmeasured requests sent before the benchmark
    #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
    pub warmup_requests: i64,

    /// Optional path to write the full report JSON
    #[arg(long)]
    pub output_json: Option<PathBuf>,
}

impl BenchArgs {
    /// Check every argument and load the payload file. Nothing touches the
    /// network here.
    pub fn into_run_config(self) -> Result<RunConfig> {
        let total_requests = positive_count("--requests", self.requests)?;
        let concurrency = positive_count("--concurrency", self.concurrency)?;
        let warmup_requests = non_negative_count("--warmup-requests", self.warmup_requests)?;
        let timeout = timeout_from_secs("--timeout-sec", self.timeout_sec)?;
        validate_url(&self.url)?;
        let method = parse_method(&self.method)?;
        let headers = parse_headers(&self.headers)?;

        let bodies = match &self.payload_file {
            Some(path) => RequestBodies::Shared(load_payload(path)?),
            None => RequestBodies::Empty,
        };

        Ok(RunConfig {
            request: RequestSpec::new(method, self.url).with_headers(headers),
            bodies,
            total_requests,
            concurrency,
            timeout,
            warmup_requests,
            output_json: self.output_json,
        })
    }
}

/// Arguments of the `billbench-post` driver.
#[derive(Parser, Debug)]
#[command(
    name = "billbench-post",
    about = "Benchmark POST /bills with generated data and optional cleanup"
)]
pub struct PostArgs {
    /// Human friendly target name
    #[arg(long, default_value = "POST-Target")]
    pub name: String,

    /// Endpoint URL to test
    #[arg(long)]
    pub url: String,

    /// Number of bills to create
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    pub requests: i64,

    /// Number of concurrent workers
    #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
    pub concurrency: i64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10.0, allow_negative_numbers = true)]
    pub timeout_sec: f64,

    /// Minimum lines per bill
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    pub min_lines: i64,

    /// Maximum lines per bill
    #[arg(long, default_value_t = 15, allow_negative_numbers = true)]
    pub max_lines: i64,

    /// Prefix marker for billNumber/customerName [default: BENCH-POST-<unix seconds>]
    #[arg(long)]
    pub prefix: Option<String>,

    /// Random seed for payload generation
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Do not delete generated benchmark bills
    #[arg(long)]
    pub skip_cleanup: bool,

    /// Suppress the summary line and informational logs
    #[arg(long)]
    pub quiet: bool,

    /// Optional path to write the full report JSON
    #[arg(long)]
    pub output_json: Option<PathBuf>,

    /// Postgres host
    #[arg(long, env = "POSTGRES_HOST", default_value = "localhost")]
    pub db_host: String,

    /// Postgres port
    #[arg(long, env = "POSTGRES_PORT", default_value_t = 5440)]
    pub db_port: u16,

    /// Postgres database
    #[arg(long, env = "POSTGRES_DB", default_value = "api_lang_arena")]
    pub db_name: String,

    /// Postgres user
    #[arg(long, env = "POSTGRES_USER", default_value = "api_lang_user")]
    pub db_user: String,

    /// Postgres password
    #[arg(long, env = "POSTGRES_PASSWORD", default_value = "api_lang_password", hide_env_values = true)]
    pub db_password: String,
}

/// Validated settings of a POST run. Payloads are generated separately.
#[derive(Debug, Clone)]
pub struct PostSettings {
    pub name: String,
    pub url: String,
    pub prefix: String,
    pub total_requests: usize,
    pub concurrency: usize,
    pub timeout_sec: f64,
    pub min_lines: usize,
    pub max_lines: usize,
    pub seed: u64,
    pub skip_cleanup: bool,
    pub quiet: bool,
    pub output_json: Option<PathBuf>,
    pub db: DbConfig,
}

impl PostArgs {
    /// Check every argument. `unix_secs` seeds the default prefix.
    pub fn validate(self, unix_secs: u64) -> Result<PostSettings> {
        let total_requests = positive_count("--requests", self.requests)?;
        let concurrency = positive_count("--concurrency", self.concurrency)?;
        timeout_from_secs("--timeout-sec", self.timeout_sec)?;
        if self.min_lines <= 0 || self.max_lines <= 0 {
            return Err(BenchError::InvalidArgument(
                "--min-lines and --max-lines must be greater than 0".to_string(),
            ));
        }
        if self.min_lines > self.max_lines {
            return Err(BenchError::InvalidArgument(
                "--min-lines cannot be greater than --max-lines".to_string(),
            ));
        }
        let min_lines = positive_count("--min-lines", self.min_lines)?;
        let max_lines = positive_count("--max-lines", self.max_lines)?;
        validate_url(&self.url)?;

        let prefix = match self.prefix {
            Some(p) if p.trim().is_empty() => {
                return Err(BenchError::InvalidArgument("--prefix must not be empty".to_string()))
            }
            Some(p) => p,
            None => default_prefix(unix_secs),
        };

        Ok(PostSettings {
            name: self.name,
            url: self.url,
            prefix,
            total_requests,
            concurrency,
            timeout_sec: self.timeout_sec,
            min_lines,
            max_lines,
            seed: self.seed,
            skip_cleanup: self.skip_cleanup,
            quiet: self.quiet,
            output_json: self.output_json,
            db: DbConfig {
                host: self.db_host,
                port: self.db_port,
                database: self.db_name,
                user: self.db_user,
                password: self.db_password,
            },
        })
    }
}

impl PostSettings {
    /// The run configuration for these settings with one body per bill.
    /// POST runs never warm up: every request creates a bill.
    pub fn run_config(&self, bodies: Vec<Bytes>) -> Result<RunConfig> {
        Ok(RunConfig {
            request: RequestSpec::new(Method::POST, self.url.clone()).capture_created_id(),
            bodies: RequestBodies::PerRequest(bodies),
            total_requests: self.total_requests,
            concurrency: self.concurrency,
            timeout: timeout_from_secs("--timeout-sec", self.timeout_sec)?,
            warmup_requests: 0,
            output_json: self.output_json.clone(),
        })
    }

    pub fn target(&self) -> Target {
        Target { name: self.name.clone(), url: self.url.clone() }
    }

    pub fn run_parameters(&self, lines_per_bill: Vec<usize>) -> RunParameters {
        RunParameters {
            prefix: self.prefix.clone(),
            requests: self.total_requests,
            concurrency: self.concurrency,
            timeout_sec: self.timeout_sec,
            min_lines: self.min_lines,
            max_lines: self.max_lines,
            seed: self.seed,
            lines_per_bill,
        }
    }
}
