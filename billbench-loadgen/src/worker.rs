use billbench_client::{ClientPool, RequestSpec};
use billbench_common::{BenchError, RequestResult, Result};
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::RunConfig;

/// Upper bound on slots reserved up front for results; larger runs grow the
/// buffer as results arrive.
pub const MAX_PREALLOCATED_RESULTS: usize = 1 << 16;

/// Initial capacity of the result buffer for a run of `total` requests.
pub fn results_capacity(total: usize) -> usize {
    total.min(MAX_PREALLOCATED_RESULTS)
}

/// Request bodies for a run, addressed by request index.
#[derive(Debug, Clone)]
pub enum RequestBodies {
    Empty,
    /// Every request sends the same bytes.
    Shared(Bytes),
    /// Request `i` sends element `i`.
    PerRequest(Vec<Bytes>),
}

impl RequestBodies {
    pub fn get(&self, index: usize) -> Option<Bytes> {
        match self {
            RequestBodies::Empty => None,
            RequestBodies::Shared(body) => Some(body.clone()),
            RequestBodies::PerRequest(bodies) => bodies.get(index).cloned(),
        }
    }
}

/// Raw output of the measured phase.
pub struct RunOutcome {
    /// One entry per request, in completion order.
    pub results: Vec<RequestResult>,
    /// From just before the first request was handed out until the last
    /// result was collected.
    pub wall_time: Duration,
}

/// Send `count` throw-away requests one after another, dealing them across
/// the pool's clients so each worker's connection is already open when
/// measurement starts.
pub async fn warm_up(pool: &ClientPool, request: &RequestSpec, bodies: &RequestBodies, count: usize) {
    if pool.is_empty() {
        return;
    }
    for index in 0..count {
        if let Some(client) = pool.get(index % pool.len()) {
            let result = client.execute(request, bodies.get(index)).await;
            debug!(index, status = %result.status_key(), latency_ms = result.latency_ms, "warm-up request done");
        }
    }
}

/// Execute exactly `total` requests with one worker task per pooled client.
///
/// Workers claim request indices from a shared counter, so a slow request only
/// ever holds up its own worker. Results are collected through a channel in
/// completion order. Returns once every request has resolved.
pub async fn run(
    pool: ClientPool,
    request: Arc<RequestSpec>,
    bodies: Arc<RequestBodies>,
    total: usize,
) -> Result<RunOutcome> {
    let next_index = Arc::new(AtomicUsize::new(0));
    let (tx, mut rx) = mpsc::unbounded_channel::<RequestResult>();

    let started = Instant::now();

    let handles: Vec<_> = pool
        .into_clients()
        .into_iter()
        .enumerate()
        .map(|(worker_id, client)| {
            let request = Arc::clone(&request);
            let bodies = Arc::clone(&bodies);
            let next_index = Arc::clone(&next_index);
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut completed: usize = 0;
                loop {
                    let index = next_index.fetch_add(1, Ordering::Relaxed);
                    if index >= total {
                        break;
                    }
                    let result = client.execute(&request, bodies.get(index)).await;
                    completed += 1;
                    if tx.send(result).is_err() {
                        break;
                    }
                }
                debug!(worker_id, completed, "worker finished");
            })
        })
        .collect();

    // Only the workers hold senders now; the channel closes when the last one exits.
    drop(tx);

    let mut results = Vec::with_capacity(results_capacity(total));
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    let wall_time = started.elapsed();

    for handle in handles {
        handle.await.map_err(|e| BenchError::Worker(e.to_string()))?;
    }

    Ok(RunOutcome { results, wall_time })
}

/// Build the client pool, warm up, then run the measured phase.
pub async fn execute(config: &RunConfig) -> Result<RunOutcome> {
    let workers = config.worker_count();
    let pool = ClientPool::new(workers, &config.client_config())?;

    if config.warmup_requests > 0 {
        info!(count = config.warmup_requests, "warming up");
        warm_up(&pool, &config.request, &config.bodies, config.warmup_requests).await;
    }

    info!(
        method = %config.request.method,
        url = %config.request.url,
        requests = config.total_requests,
        workers,
        "starting measured run"
    );

    let outcome = run(
        pool,
        Arc::new(config.request.clone()),
        Arc::new(config.bodies.clone()),
        config.total_requests,
    )
    .await?;

    info!(
        completed = outcome.results.len(),
        wall_time_sec = outcome.wall_time.as_secs_f64(),
        "measured run finished"
    );
    Ok(outcome)
}
