mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::mock_backend::{MockBackend, MockResponse};
use common::{beers_json, free_port, ids_of};
use punkr::catalog::{CatalogService, RemoteCatalog};
use punkr::config::BackendConfig;
use punkr::error::ErrorKind;
use punkr::net::{HttpTransport, Retrier};

fn catalog_for(base_url: String, retrier: Retrier) -> RemoteCatalog {
    let config = BackendConfig {
        base_url,
        timeout_seconds: 1,
        connect_timeout_seconds: 1,
        ..BackendConfig::default()
    };
    let transport = HttpTransport::new(&config, retrier).unwrap();
    RemoteCatalog::new(Arc::new(transport), 25)
}

fn fast_retrier() -> Retrier {
    Retrier::new(3, Duration::from_millis(20))
}

#[tokio::test]
async fn test_search_request_shape() {
    let backend = MockBackend::start().await;
    backend
        .enqueue_response(MockResponse::json(&beers_json([1, 2])))
        .await;
    let catalog = catalog_for(backend.base_url(), fast_retrier());

    let beers = catalog.beers_by_name("punk ipa", 1).await.unwrap();
    assert_eq!(ids_of(&beers), vec![1, 2]);

    let requests = backend.captured_requests().await;
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/v2/beers");
    assert_eq!(request.query_value("page"), Some("2"));
    assert_eq!(request.query_value("per_page"), Some("25"));
    assert_eq!(request.query_value("beer_name"), Some("punk ipa"));
    assert_eq!(request.header("accept"), Some("application/json"));
}

#[tokio::test]
async fn test_ids_request_is_pipe_joined() {
    let backend = MockBackend::start().await;
    backend
        .enqueue_response(MockResponse::json(&beers_json([4, 8])))
        .await;
    let catalog = catalog_for(backend.base_url(), fast_retrier());

    catalog.beers_by_ids(&[4, 8], 0).await.unwrap();

    let requests = backend.captured_requests().await;
    assert_eq!(requests[0].query_value("ids"), Some("4|8"));
    assert_eq!(requests[0].query_value("page"), Some("1"));
}

#[tokio::test]
async fn test_status_codes_map_to_kinds_without_retry() {
    let cases = [
        (401, ErrorKind::NotAuthenticated),
        (403, ErrorKind::NotAuthenticated),
        (404, ErrorKind::NotFound),
        (418, ErrorKind::HttpStatus),
        (500, ErrorKind::Server),
        (503, ErrorKind::Server),
    ];
    for (status, expected) in cases {
        let backend = MockBackend::start().await;
        backend
            .enqueue_response(MockResponse::error(status, "nope"))
            .await;
        let catalog = catalog_for(backend.base_url(), fast_retrier());

        assert_eq!(catalog.all_beers(0).await, Err(expected), "status {}", status);
        assert_eq!(backend.captured_requests().await.len(), 1, "status {}", status);
    }
}

#[tokio::test]
async fn test_non_json_response_is_unexpected_content_type() {
    let backend = MockBackend::start().await;
    backend
        .enqueue_response(MockResponse::html("<html></html>"))
        .await;
    let catalog = catalog_for(backend.base_url(), fast_retrier());

    assert_eq!(
        catalog.all_beers(0).await,
        Err(ErrorKind::UnexpectedContentType)
    );
}

#[tokio::test]
async fn test_content_type_match_ignores_case() {
    let backend = MockBackend::start().await;
    backend
        .enqueue_response(MockResponse {
            headers: vec![(
                "content-type".to_string(),
                "Application/JSON; charset=UTF-8".to_string(),
            )],
            ..MockResponse::json(&beers_json([1, 2]))
        })
        .await;
    let catalog = catalog_for(backend.base_url(), fast_retrier());

    let beers = catalog.all_beers(0).await.unwrap();
    assert_eq!(ids_of(&beers), vec![1, 2]);
}

#[tokio::test]
async fn test_empty_body_is_unexpected_payload() {
    let backend = MockBackend::start().await;
    backend.enqueue_response(MockResponse::empty()).await;
    let catalog = catalog_for(backend.base_url(), fast_retrier());

    assert_eq!(catalog.all_beers(0).await, Err(ErrorKind::UnexpectedPayload));
}

#[tokio::test]
async fn test_malformed_json_is_not_retried() {
    let backend = MockBackend::start().await;
    backend
        .enqueue_response(MockResponse::json(r#"[{"id": "not a number"}]"#))
        .await;
    let catalog = catalog_for(backend.base_url(), fast_retrier());

    assert_eq!(catalog.all_beers(0).await, Err(ErrorKind::Deserialization));
    assert_eq!(backend.captured_requests().await.len(), 1);
}

#[tokio::test]
async fn test_random_beer_path_and_empty_answer() {
    let backend = MockBackend::start().await;
    backend.enqueue_response(MockResponse::json(&beers_json([42]))).await;
    backend.enqueue_response(MockResponse::json("[]")).await;
    let catalog = catalog_for(backend.base_url(), fast_retrier());

    assert_eq!(catalog.random_beer().await.unwrap().id, 42);
    assert_eq!(catalog.random_beer().await, Err(ErrorKind::Deserialization));

    let requests = backend.captured_requests().await;
    assert_eq!(requests[0].path, "/v2/beers/random");
    assert!(requests[0].query.is_empty());
}

#[tokio::test]
async fn test_connection_refused_is_retried_then_reported() {
    let base_url = format!("http://127.0.0.1:{}/v2", free_port());
    let catalog = catalog_for(base_url, Retrier::new(3, Duration::from_millis(50)));

    let started = Instant::now();
    assert_eq!(catalog.all_beers(0).await, Err(ErrorKind::Connectivity));
    // Three retries, each after the fixed delay.
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn test_timeout_fails_fast() {
    let backend = MockBackend::start().await;
    backend
        .enqueue_response(MockResponse::json(&beers_json([1])).with_delay(3000))
        .await;
    let catalog = catalog_for(backend.base_url(), fast_retrier());

    assert_eq!(catalog.all_beers(0).await, Err(ErrorKind::Timeout));
    assert_eq!(backend.captured_requests().await.len(), 1);
}

#[tokio::test]
async fn test_retry_recovers_after_dropped_connection() {
    // No server yet: the first attempt is refused, a later one succeeds.
    let port = free_port();
    let catalog = catalog_for(
        format!("http://127.0.0.1:{}/v2", port),
        Retrier::new(3, Duration::from_millis(300)),
    );

    let server = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        let app = axum::Router::new().route(
            "/v2/beers",
            axum::routing::get(|| async {
                (
                    [("content-type", "application/json")],
                    common::beers_json([5]),
                )
            }),
        );
        axum::serve(listener, app).await.ok();
    });

    let beers = catalog.all_beers(0).await.unwrap();
    assert_eq!(ids_of(&beers), vec![5]);
    server.abort();
}
