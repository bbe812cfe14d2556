use billbench_common::{BenchError, CreatedBill, RequestResult, Result, TransportErrorKind};
use bytes::Bytes;
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use tracing::debug;

pub use reqwest::header::HeaderMap;
pub use reqwest::Method;

/// Per-client settings shared by every worker in a run.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Deadline for one request, covering connect, send and the full body read.
    pub timeout: Duration,
}

/// Everything about a request that stays the same across a run.
/// Bodies vary per request and are passed to [`Client::execute`] separately.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    /// Parse `{"id": <int>}` out of 2xx response bodies.
    pub capture_id: bool,
}

impl RequestSpec {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: HeaderMap::new(), capture_id: false }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn capture_created_id(mut self) -> Self {
        self.capture_id = true;
        self
    }
}

/// Parse an HTTP method name case-insensitively (`post` → `POST`).
pub fn parse_method(name: &str) -> Result<Method> {
    Method::from_bytes(name.trim().to_uppercase().as_bytes())
        .map_err(|_| BenchError::InvalidArgument(format!("Invalid HTTP method '{name}'")))
}

/// Reject anything that is not an absolute http(s) URL.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| BenchError::InvalidArgument(format!("Invalid --url '{url}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(BenchError::InvalidArgument(format!(
            "Invalid --url '{url}': unsupported scheme '{scheme}'"
        ))),
    }
}

/// Parse repeated `Name: Value` arguments. Later duplicates replace earlier ones.
pub fn parse_headers(values: &[String]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for raw in values {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| BenchError::InvalidHeader(raw.clone()))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|_| BenchError::InvalidHeader(raw.clone()))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|_| BenchError::InvalidHeader(raw.clone()))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// One persistent HTTP client. Each worker owns exactly one for the whole run,
/// so connection setup is paid once, outside the measured requests.
pub struct Client {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl Client {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BenchError::ClientBuild(e.to_string()))?;
        Ok(Self { config, http_client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Issue one request and report how it went. Never fails: transport
    /// errors are folded into the returned [`RequestResult`].
    ///
    /// The clock covers sending the request and reading the whole response
    /// body. Building the request happens before the clock starts.
    pub async fn execute(&self, request: &RequestSpec, body: Option<Bytes>) -> RequestResult {
        let mut builder = self
            .http_client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone());

        if let Some(body) = body {
            if !request.headers.contains_key(CONTENT_TYPE) {
                builder = builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            builder = builder.body(body);
        }

        let started = Instant::now();

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return transport_failure(started, &e),
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return transport_failure(started, &e),
        };

        let latency_ms = elapsed_ms(started);

        let created_id = if request.capture_id && status.is_success() {
            parse_created_id(&body)
        } else {
            None
        };

        RequestResult::response(latency_ms, status.as_u16(), body.len() as u64, created_id)
    }
}

/// A fixed set of independent clients, one per worker.
pub struct ClientPool {
    clients: Vec<Client>,
}

impl ClientPool {
    /// Build `size` clients up front.
    pub fn new(size: usize, config: &ClientConfig) -> Result<Self> {
        if size == 0 {
            return Err(BenchError::InvalidArgument(
                "client pool size must be greater than 0".to_string(),
            ));
        }
        let clients = (0..size)
            .map(|_| Client::new(config.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { clients })
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Client> {
        self.clients.get(index)
    }

    /// Hand out the clients so each can be moved into its own worker.
    pub fn into_clients(self) -> Vec<Client> {
        self.clients
    }
}

/// Map a reqwest failure to a stable category.
///
/// reqwest only flags timeouts and connect failures directly; DNS and TLS
/// problems surface as connect errors whose source chain names the cause.
pub fn classify_error(err: &reqwest::Error) -> TransportErrorKind {
    if err.is_timeout() {
        return TransportErrorKind::Timeout;
    }

    // The top-level message embeds the URL, so only the causes are inspected.
    let chain = cause_chain_text(err);
    if chain.contains("dns error")
        || chain.contains("failed to lookup address")
        || chain.contains("name or service not known")
    {
        return TransportErrorKind::DnsError;
    }
    if chain.contains("tls") || chain.contains("ssl") || chain.contains("certificate") {
        return TransportErrorKind::TlsError;
    }
    if err.is_connect() {
        return TransportErrorKind::ConnectError;
    }
    if err.is_body() || err.is_decode() {
        return TransportErrorKind::ReadError;
    }

    TransportErrorKind::RequestError
}

/// `id` from a JSON body, or `None` if the body is not JSON, not an object,
/// or has no integer `id`.
pub fn parse_created_id(body: &[u8]) -> Option<i64> {
    serde_json::from_slice::<CreatedBill>(body).ok().and_then(|b| b.id)
}

fn transport_failure(started: Instant, err: &reqwest::Error) -> RequestResult {
    let latency_ms = elapsed_ms(started);
    let kind = classify_error(err);
    debug!(error = %error_chain_text(err), kind = %kind, "request failed before a response was received");
    RequestResult::transport_failure(latency_ms, kind)
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

fn error_chain_text(err: &dyn StdError) -> String {
    format!("{}: {}", err, cause_chain_text(err))
}

fn cause_chain_text(err: &dyn StdError) -> String {
    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes.join(": ").to_ascii_lowercase()
}
