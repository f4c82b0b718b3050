//! Retry, response cache, debounce and polling against a mock backend.

use biblio_http::retry::{retry, retry_with, RetryOnRetryable};
use biblio_http::{Client, Error, Params, PollOptions, RetryStrategy};
use serde_json::json;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Client {
    Client::builder()
        .base_url(server.uri())
        .unwrap()
        .build()
        .unwrap()
}

fn page(n: u64) -> Params {
    let mut params = Params::new();
    params.insert("page".to_string(), json!(n));
    params
}

#[tokio::test]
async fn test_retry_calls_exactly_max_attempts() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let no_params = Params::new();
    let err = retry(
        || client.get("/api/flaky", &no_params),
        3,
        Duration::from_millis(10),
    )
    .await
    .unwrap_err();

    assert!(err.is_server_error());
}

#[tokio::test]
async fn test_retry_recovers_after_transient_failures() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let no_params = Params::new();
    let response = retry(
        || client.get("/api/flaky", &no_params),
        5,
        Duration::from_millis(10),
    )
    .await
    .unwrap();

    assert_eq!(response.json().unwrap()["ok"], true);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_retry_with_skips_non_retryable_errors() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let strategy = RetryStrategy::Linear {
        delay: Duration::from_millis(10),
        max_retries: 3,
    };
    let no_params = Params::new();
    let err = retry_with(
        || client.get("/api/missing", &no_params),
        &strategy,
        &RetryOnRetryable,
    )
    .await
    .unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
}

#[tokio::test]
async fn test_retry_with_exhaustion() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/down"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let strategy = RetryStrategy::ExponentialBackoff {
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        max_retries: 2,
        jitter: true,
    };
    let no_params = Params::new();
    let err = retry_with(
        || client.get("/api/down", &no_params),
        &strategy,
        &RetryOnRetryable,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::MaxRetriesExceeded { attempts: 3, .. }));
    assert!(err.is_server_error());
}

#[tokio::test]
async fn test_cached_get_is_served_once() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/genres"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["romance", "poetry"])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let ttl = Duration::from_secs(60);

    let first = client.get_cached("/api/genres", &page(1), ttl).await.unwrap();
    let second = client.get_cached("/api/genres", &page(1), ttl).await.unwrap();
    assert_eq!(first.data, second.data);

    // different params are a different entry
    client.get_cached("/api/genres", &page(2), ttl).await.unwrap();
    assert_eq!(client.cache().len(), 2);
}

#[tokio::test]
async fn test_cache_entry_expires() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/genres"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let ttl = Duration::from_millis(50);

    client.get_cached("/api/genres", &Params::new(), ttl).await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;
    client.get_cached("/api/genres", &Params::new(), ttl).await.unwrap();
}

#[tokio::test]
async fn test_cached_get_with_unbounded_ttl() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/genres"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["essay"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let first = client
        .get_cached("/api/genres", &Params::new(), Duration::MAX)
        .await
        .unwrap();
    let second = client
        .get_cached("/api/genres", &Params::new(), Duration::MAX)
        .await
        .unwrap();

    assert_eq!(first.data, second.data);
    assert_eq!(client.cache().len(), 1);
}

#[tokio::test]
async fn test_clear_cache_by_prefix() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let ttl = Duration::from_secs(60);
    client.get_cached("/api/genres", &Params::new(), ttl).await.unwrap();
    client.get_cached("/api/authors", &Params::new(), ttl).await.unwrap();

    client.clear_cache(Some("/api/genres"));
    assert_eq!(client.cache().len(), 1);

    client.get_cached("/api/genres", &Params::new(), ttl).await.unwrap();
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);

    client.clear_cache(None);
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn test_failed_responses_are_not_cached() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let ttl = Duration::from_secs(60);
    client.get_cached("/api/genres", &Params::new(), ttl).await.unwrap_err();
    client.get_cached("/api/genres", &Params::new(), ttl).await.unwrap_err();
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn test_debounce_fires_only_last_call() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": 1})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let delay = Duration::from_millis(50);
    let (one, two, three) = (page(1), page(2), page(3));

    let (first, second, third) = tokio::join!(
        client.debounce_get("/api/search", &one, delay),
        client.debounce_get("/api/search", &two, delay),
        client.debounce_get("/api/search", &three, delay),
    );

    assert!(matches!(first, Err(Error::Debounced)));
    assert!(matches!(second, Err(Error::Debounced)));
    assert_eq!(third.unwrap().json().unwrap()["hits"], 1);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("page=3"));
}

#[tokio::test]
async fn test_poll_until_callback_breaks() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/import/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": false})))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/import/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
        .mount(&mock_server)
        .await;

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let client = client_for(&mock_server);
    let handle = client.poll(
        "/api/import/status",
        move |response| {
            counter.fetch_add(1, Ordering::SeqCst);
            match response.json().and_then(|s| s["done"].as_bool()) {
                Some(true) => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            }
        },
        Duration::from_millis(10),
        PollOptions::default(),
    );

    tokio::time::timeout(Duration::from_secs(5), handle.join())
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_poll_survives_errors() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/import/status"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/import/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
        .mount(&mock_server)
        .await;

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let client = client_for(&mock_server);
    let handle = client.poll(
        "/api/import/status",
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Break(())
        },
        Duration::from_millis(10),
        PollOptions::default(),
    );

    tokio::time::timeout(Duration::from_secs(5), handle.join())
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_poll_stop_ends_loop() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/import/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": false})))
        .mount(&mock_server)
        .await;

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let client = client_for(&mock_server);
    let handle = client.poll(
        "/api/import/status",
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        },
        Duration::from_secs(60),
        PollOptions::default(),
    );

    // first request fires immediately; the next one is a minute away
    while calls.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    handle.stop();
    assert!(handle.is_stopped());

    tokio::time::timeout(Duration::from_secs(5), handle.join())
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}
