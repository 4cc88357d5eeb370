//! Retry behaviour of the scraping client against a local stand-in proxy.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use socialkyc_fetch::{FetchError, PageFetcher, RetryPolicy, ScrapingClient, ScrapingClientConfig};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
struct Upstream {
    hits: Arc<AtomicUsize>,
    failures_before_success: usize,
}

async fn render(
    State(upstream): State<Upstream>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    let hit = upstream.hits.fetch_add(1, Ordering::SeqCst);
    if params.get("api_key").map(String::as_str) != Some("test-key") {
        return (StatusCode::UNAUTHORIZED, "bad key".into());
    }
    if hit < upstream.failures_before_success {
        return (StatusCode::SERVICE_UNAVAILABLE, "busy".into());
    }
    let target = params.get("url").cloned().unwrap_or_default();
    (StatusCode::OK, format!("<html><title>rendered {target}</title></html>"))
}

async fn spawn_upstream(failures_before_success: usize) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let state = Upstream {
        hits: Arc::clone(&hits),
        failures_before_success,
    };
    let app = Router::new().route("/render", get(render)).with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/render"), hits)
}

fn client(base_url: String, api_key: &str) -> ScrapingClient {
    let mut config = ScrapingClientConfig::new(base_url, api_key);
    config.retry = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5));
    config.request_timeout = Duration::from_secs(5);
    ScrapingClient::new(config).unwrap()
}

#[tokio::test]
async fn recovers_after_transient_failures() {
    let (base_url, hits) = spawn_upstream(2).await;
    let body = client(base_url, "test-key")
        .fetch("https://twitter.com/a/status/1")
        .await
        .unwrap();
    assert!(body.contains("rendered https://twitter.com/a/status/1"));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn gives_up_after_fixed_attempts() {
    let (base_url, hits) = spawn_upstream(usize::MAX).await;
    let err = client(base_url, "test-key")
        .fetch("https://twitter.com/a/status/1")
        .await
        .unwrap_err();
    match err {
        FetchError::FetchFailed { attempts, reason } => {
            assert_eq!(attempts, 3);
            assert!(reason.contains("503"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn non_success_status_is_retried_like_transport_errors() {
    let (base_url, hits) = spawn_upstream(0).await;
    let err = client(base_url, "wrong-key")
        .fetch("https://twitter.com/a/status/1")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::FetchFailed { attempts: 3, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn unreachable_proxy_fails_without_leaking_the_key() {
    // Bind and drop to get a port nobody listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(format!("http://{addr}/render"), "very-secret-key")
        .fetch("https://twitter.com/a/status/1")
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::FetchFailed { .. }));
    assert!(!err.to_string().contains("very-secret-key"));
}
