use billbench_client::{ClientConfig, ClientPool, Method, RequestSpec};
use billbench_loadgen::config::RunConfig;
use billbench_loadgen::worker::{
    execute, results_capacity, run, warm_up, RequestBodies, MAX_PREALLOCATED_RESULTS,
};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

fn pool(size: usize) -> ClientPool {
    ClientPool::new(size, &ClientConfig { timeout: Duration::from_secs(5) }).unwrap()
}

fn config(url: String, total_requests: usize, concurrency: usize, warmup_requests: usize) -> RunConfig {
    RunConfig {
        request: RequestSpec::new(Method::GET, url),
        bodies: RequestBodies::Empty,
        total_requests,
        concurrency,
        timeout: Duration::from_secs(5),
        warmup_requests,
        output_json: None,
    }
}

// --- RequestBodies ---

#[test]
fn test_empty_bodies() {
    assert_eq!(RequestBodies::Empty.get(0), None);
}

#[test]
fn test_shared_body_for_every_index() {
    let bodies = RequestBodies::Shared(Bytes::from_static(b"{}"));
    assert_eq!(bodies.get(0), Some(Bytes::from_static(b"{}")));
    assert_eq!(bodies.get(999), Some(Bytes::from_static(b"{}")));
}

#[test]
fn test_per_request_bodies_by_index() {
    let bodies = RequestBodies::PerRequest(vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")]);
    assert_eq!(bodies.get(1), Some(Bytes::from_static(b"b")));
    assert_eq!(bodies.get(2), None);
}

#[test]
fn test_worker_count_is_capped_by_requests() {
    assert_eq!(config("http://x/".to_string(), 3, 10, 0).worker_count(), 3);
    assert_eq!(config("http://x/".to_string(), 30, 10, 0).worker_count(), 10);
}

#[test]
fn test_results_capacity_is_capped() {
    assert_eq!(results_capacity(23), 23);
    assert_eq!(results_capacity(MAX_PREALLOCATED_RESULTS), MAX_PREALLOCATED_RESULTS);
    assert_eq!(results_capacity(usize::MAX / 2), MAX_PREALLOCATED_RESULTS);
    assert_eq!(results_capacity(usize::MAX), MAX_PREALLOCATED_RESULTS);
}

// --- run ---

#[tokio::test]
async fn test_run_sends_exactly_total_requests() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/health")
        .with_status(200)
        .with_body("ok")
        .expect(23)
        .create_async()
        .await;

    let outcome = run(
        pool(4),
        Arc::new(RequestSpec::new(Method::GET, format!("{}/health", server.url()))),
        Arc::new(RequestBodies::Empty),
        23,
    )
    .await
    .unwrap();

    assert_eq!(outcome.results.len(), 23);
    assert!(outcome.results.iter().all(|r| r.ok() && r.response_bytes() == 2));
    assert!(outcome.wall_time > Duration::ZERO);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_run_sends_each_body_once() {
    let mut server = mockito::Server::new_async().await;
    let mut mocks = Vec::new();
    for i in 0..6 {
        mocks.push(
            server
                .mock("POST", "/bills")
                .match_body(mockito::Matcher::Exact(format!("{{\"n\":{i}}}")))
                .with_status(201)
                .with_body(format!("{{\"id\":{}}}", 100 + i))
                .expect(1)
                .create_async()
                .await,
        );
    }

    let bodies: Vec<Bytes> = (0..6).map(|i| Bytes::from(format!("{{\"n\":{i}}}"))).collect();
    let outcome = run(
        pool(3),
        Arc::new(RequestSpec::new(Method::POST, format!("{}/bills", server.url())).capture_created_id()),
        Arc::new(RequestBodies::PerRequest(bodies)),
        6,
    )
    .await
    .unwrap();

    let mut ids: Vec<i64> = outcome.results.iter().filter_map(|r| r.created_id()).collect();
    ids.sort();
    assert_eq!(ids, vec![100, 101, 102, 103, 104, 105]);
    for mock in mocks {
        mock.assert_async().await;
    }
}

// --- warm_up / execute ---

#[tokio::test]
async fn test_warm_up_sends_requested_count() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("GET", "/").with_status(200).expect(3).create_async().await;

    let request = RequestSpec::new(Method::GET, format!("{}/", server.url()));
    warm_up(&pool(2), &request, &RequestBodies::Empty, 3).await;

    mock.assert_async().await;
}

#[tokio::test]
async fn test_execute_excludes_warm_up_from_results() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("GET", "/").with_status(200).expect(7).create_async().await;

    let outcome = execute(&config(format!("{}/", server.url()), 5, 2, 2)).await.unwrap();

    assert_eq!(outcome.results.len(), 5);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_execute_records_failures_as_results() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server.mock("GET", "/").with_status(503).create_async().await;

    let outcome = execute(&config(format!("{}/", server.url()), 4, 4, 0)).await.unwrap();

    assert_eq!(outcome.results.len(), 4);
    assert!(outcome.results.iter().all(|r| r.status_code() == Some(503)));
}
