//! Dark traffic mirrored through a real HTTP destination.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{Method, StatusCode};
use request_router::config::DarkTrafficConfig;
use request_router::dark_traffic::{self, never, DarkTrafficFilter, HttpMirrorClient};
use request_router::exception::Failure;
use request_router::http::{response, HttpRequest};
use request_router::routing::{HttpRouter, Route};

mod common;
use common::{request, start_mock_backend, start_programmable_backend, wait_until};

fn router_with(filter: DarkTrafficFilter<HttpRequest>) -> HttpRouter {
    let mut builder = HttpRouter::builder();
    builder
        .filter(filter)
        .unwrap()
        .add(
            Route::post("/groups/", |_req: HttpRequest| async move {
                Ok::<_, Failure>(response::text(StatusCode::CREATED, "primary"))
            })
            .unwrap(),
        )
        .unwrap();
    builder.freeze().unwrap()
}

#[tokio::test]
async fn test_unsampled_requests_never_reach_destination() {
    let backend = start_mock_backend("dark").await;
    let client = HttpMirrorClient::new(&backend.addr.to_string(), "", false).unwrap();
    let filter = DarkTrafficFilter::new(client).sampler(never::<HttpRequest>());
    let stats = filter.stats();
    let router = router_with(filter);

    for _ in 0..10 {
        let response = router.dispatch(request(Method::POST, "/groups/", "{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(backend.hits(), 0);
    assert_eq!(stats.snapshot().requests, 0);
}

#[tokio::test]
async fn test_mirrors_to_destination_with_client_id() {
    let backend = start_mock_backend("dark").await;
    let config = DarkTrafficConfig {
        destination: Some(backend.addr.to_string()),
        client_id: "router-dark".into(),
        mux_enabled: false,
        forward_after_service: true,
        sample_rate: 1.0,
        timeout_ms: 1000,
    };
    let filter = dark_traffic::from_config(&config).unwrap().unwrap();
    let stats = filter.stats();
    let router = router_with(filter);

    let response = router
        .dispatch(request(Method::POST, "/groups/", r#"{"name":"ops"}"#))
        .await
        .unwrap();
    assert_eq!(response.body().as_ref(), b"primary");

    assert!(wait_until(Duration::from_secs(2), || stats.snapshot().successes == 1).await);
    assert_eq!(backend.hits(), 1);

    let head = backend.heads().remove(0);
    assert!(head.starts_with("POST /groups/ HTTP/1.1"), "{head}");
    assert!(head.to_ascii_lowercase().contains("x-client-id: router-dark"), "{head}");
}

#[tokio::test]
async fn test_concurrent_mode_is_not_delayed_by_slow_destination() {
    let backend = start_programmable_backend(|| async {
        tokio::time::sleep(Duration::from_millis(800)).await;
        (200, "slow".to_string())
    })
    .await;
    let client = HttpMirrorClient::new(&backend.addr.to_string(), "", false).unwrap();
    let filter = DarkTrafficFilter::new(client)
        .forward_after_service(false)
        .timeout(Duration::from_secs(2));
    let stats = filter.stats();
    let router = router_with(filter);

    let start = Instant::now();
    let response = router.dispatch(request(Method::POST, "/groups/", "")).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(elapsed < Duration::from_millis(400), "primary took {elapsed:?}");
    assert!(wait_until(Duration::from_secs(3), || stats.snapshot().successes == 1).await);
}

#[tokio::test]
async fn test_destination_errors_are_counted_not_propagated() {
    let failing = start_programmable_backend(|| async { (503, "down".to_string()) }).await;
    let client = HttpMirrorClient::new(&failing.addr.to_string(), "", false).unwrap();
    let filter = DarkTrafficFilter::new(client);
    let stats = filter.stats();
    let router = router_with(filter);

    let response = router.dispatch(request(Method::POST, "/groups/", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(wait_until(Duration::from_secs(2), || stats.snapshot().failures == 1).await);

    let slow = start_programmable_backend(|| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        (200, String::new())
    })
    .await;
    let client = HttpMirrorClient::new(&slow.addr.to_string(), "", false).unwrap();
    let filter = DarkTrafficFilter::new(client).timeout(Duration::from_millis(50));
    let stats = filter.stats();
    let router = router_with(filter);

    router.dispatch(request(Method::POST, "/groups/", "")).await.unwrap();
    assert!(wait_until(Duration::from_secs(2), || stats.snapshot().timeouts == 1).await);
}

#[tokio::test]
async fn test_disabled_without_destination() {
    let chain = dark_traffic::chain_from_config(&DarkTrafficConfig {
        sample_rate: 1.0,
        ..DarkTrafficConfig::default()
    })
    .unwrap();
    assert!(chain.is_empty());

    let stats = Arc::new(request_router::dark_traffic::DarkTrafficStats::default());
    assert_eq!(stats.snapshot().in_flight(), 0);
}
