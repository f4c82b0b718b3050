//! Integration tests using wiremock to simulate HTTP servers.

use biblio_http::hooks::LoadingIndicator;
use biblio_http::{
    Client, ConfigUpdate, Error, Params, Payload, RequestOptions, UploadFile,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Book {
    id: u32,
    title: String,
}

fn params(value: Value) -> Params {
    value.as_object().cloned().unwrap_or_default()
}

fn client_for(server: &MockServer) -> Client {
    Client::builder()
        .base_url(server.uri())
        .unwrap()
        .build()
        .unwrap()
}

#[derive(Default)]
struct CountingLoader {
    shown: AtomicUsize,
    hidden: AtomicUsize,
}

impl LoadingIndicator for CountingLoader {
    fn show(&self, _target: Option<&str>) {
        self.shown.fetch_add(1, Ordering::SeqCst);
    }

    fn hide(&self, _target: Option<&str>) {
        self.hidden.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_successful_get_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/books/1"))
        .and(header("X-Requested-With", "XMLHttpRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "title": "Dom Casmurro"})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client.get("/api/books/1", &Params::new()).await.unwrap();

    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(
        response.decode::<Book>().unwrap(),
        Book {
            id: 1,
            title: "Dom Casmurro".to_string()
        }
    );
}

#[tokio::test]
async fn test_query_string_encoding() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/books"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client
        .get("/api/books", &params(json!({"a": 1, "b": "x"})))
        .await
        .unwrap();
    client
        .get("/api/books", &params(json!({"a": 1, "empty": "", "missing": null})))
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("a=1&b=x"));
    assert_eq!(requests[1].url.query(), Some("a=1"));
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/books"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"title": "Helena"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9, "title": "Helena"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client
        .post("/api/books", json!({"title": "Helena"}))
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 201);
    assert_eq!(response.json().unwrap()["id"], 9);
}

#[tokio::test]
async fn test_put_patch_delete() {
    let mock_server = MockServer::start().await;

    for verb in ["PUT", "PATCH", "DELETE"] {
        Mock::given(method(verb))
            .and(path("/api/books/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"verb": verb})))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let client = client_for(&mock_server);
    let put = client.put("/api/books/3", json!({"title": "A"})).await.unwrap();
    let patch = client.patch("/api/books/3", json!({"title": "B"})).await.unwrap();
    let delete = client.delete("/api/books/3").await.unwrap();

    assert_eq!(put.json().unwrap()["verb"], "PUT");
    assert_eq!(patch.json().unwrap()["verb"], "PATCH");
    assert_eq!(delete.json().unwrap()["verb"], "DELETE");
}

#[tokio::test]
async fn test_payload_follows_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/text"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain words"))
        .mount(&mock_server)
        .await;
    Mock::given(path("/binary"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8, 159, 146, 150], "application/octet-stream"))
        .mount(&mock_server)
        .await;
    Mock::given(path("/csv"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("a,b", "application/csv"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let text = client.get("/text", &Params::new()).await.unwrap();
    assert_eq!(text.data, Payload::Text("plain words".to_string()));

    let binary = client.get("/binary", &Params::new()).await.unwrap();
    assert_eq!(binary.data.as_bytes().unwrap().as_ref(), &[0u8, 159, 146, 150]);

    let raw = client.get("/csv", &Params::new()).await.unwrap();
    assert!(matches!(raw.data, Payload::Raw { .. }));
}

#[tokio::test]
async fn test_http_error_4xx() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/books/404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.get("/api/books/404", &Params::new()).await;

    match result {
        Err(Error::HttpError {
            status,
            message,
            raw_response,
            payload,
            ..
        }) => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(message, "HTTP Error 404");
            assert_eq!(raw_response, "Not found");
            assert!(payload.is_none());
        }
        other => panic!("Expected HttpError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_message_is_used() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/loans"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"message": "Book already on loan"})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.post("/api/loans", json!({"book": 1})).await.unwrap_err();

    assert_eq!(err.to_string(), "Book already on loan");
    assert_eq!(err.payload().unwrap()["message"], "Book already on loan");
    assert!(!err.is_auth_error());
    assert!(!err.is_server_error());
}

#[tokio::test]
async fn test_error_classification() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/unauthorized"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;
    Mock::given(path("/unavailable"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let auth = client.get("/unauthorized", &Params::new()).await.unwrap_err();
    assert!(auth.is_auth_error());
    assert!(!auth.is_server_error());
    assert!(!auth.is_network_error());

    let server = client.get("/unavailable", &Params::new()).await.unwrap_err();
    assert!(server.is_server_error());
    assert!(!server.is_auth_error());
    assert!(server.is_retryable());
}

#[tokio::test]
async fn test_deserialization_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{not json", "application/json"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let result = client.get("/broken", &Params::new()).await;

    match result {
        Err(Error::DeserializationFailed {
            raw_response,
            status,
            ..
        }) => {
            assert_eq!(raw_response, "{not json");
            assert_eq!(status.as_u16(), 200);
        }
        other => panic!("Expected DeserializationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let options = RequestOptions::new().timeout(Duration::from_millis(100));
    let err = client
        .get_with("/slow", &Params::new(), &options)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout));
    assert!(err.is_network_error());
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let client = Client::builder()
        .base_url("http://127.0.0.1:1")
        .unwrap()
        .build()
        .unwrap();

    let err = client.get("/api/books", &Params::new()).await.unwrap_err();

    assert!(err.is_network_error());
    assert!(err.status().is_none());
}

#[tokio::test]
async fn test_on_error_callback_and_loader_balance() {
    let mock_server = MockServer::start().await;

    Mock::given(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;
    Mock::given(path("/fail"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let errors = Arc::new(AtomicUsize::new(0));
    let counter = errors.clone();
    let loader = Arc::new(CountingLoader::default());

    let client = Client::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .loader(loader.clone())
        .on_error(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    client.get("/ok", &Params::new()).await.unwrap();
    client.get("/fail", &Params::new()).await.unwrap_err();

    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert_eq!(loader.shown.load(Ordering::SeqCst), 2);
    assert_eq!(loader.hidden.load(Ordering::SeqCst), 2);

    client.setup(ConfigUpdate::new().show_loader(false)).unwrap();
    client.get("/ok", &Params::new()).await.unwrap();
    assert_eq!(loader.shown.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_setup_merges_headers_and_base_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/members"))
        .and(header("Authorization", "Bearer t0ken"))
        .and(header("X-Requested-With", "XMLHttpRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::builder().build().unwrap();
    client
        .setup(
            ConfigUpdate::new()
                .base_url(mock_server.uri())
                .header("Authorization", "Bearer t0ken"),
        )
        .unwrap();

    client.get("/api/members", &Params::new()).await.unwrap();
    assert_eq!(client.config().headers["Content-Type"], "application/json");
}

#[tokio::test]
async fn test_per_call_headers_override_defaults() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/notes"))
        .and(header("Content-Type", "text/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_string("stored"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let options = RequestOptions::new().header("Content-Type", "text/plain");
    let response = client
        .post_with("/api/notes", "remember the milk".to_string(), &options)
        .await
        .unwrap();

    assert_eq!(response.data.as_text(), Some("stored"));
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests[0].body, b"remember the milk");
}

#[tokio::test]
async fn test_interceptors_are_applied() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/books"))
        .and(header("X-Trace-Id", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 1})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client.add_request_interceptor(|descriptor| {
        descriptor
            .headers
            .insert("X-Trace-Id".to_string(), "abc123".to_string());
    });
    client.add_response_interceptor(|response| {
        response.data = Payload::Text("intercepted".to_string());
    });

    let response = client.get("/api/books", &Params::new()).await.unwrap();

    assert_eq!(client.interceptor_count(), (1, 1));
    assert_eq!(response.data.as_text(), Some("intercepted"));
}

#[tokio::test]
async fn test_upload_single_and_multiple_files() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    client
        .upload(
            "/api/upload",
            vec![UploadFile::new("cover.png", vec![1u8, 2, 3]).mime_type("image/png")],
            &params(json!({"bookId": 7})),
        )
        .await
        .unwrap();
    client
        .upload(
            "/api/upload",
            vec![
                UploadFile::new("a.txt", b"first".to_vec()),
                UploadFile::new("b.txt", b"second".to_vec()),
            ],
            &Params::new(),
        )
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();

    let content_type = requests[0].headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
    let single = String::from_utf8_lossy(&requests[0].body);
    assert!(single.contains(r#"name="file"; filename="cover.png""#));
    assert!(single.contains(r#"name="bookId""#));

    let multiple = String::from_utf8_lossy(&requests[1].body);
    assert!(multiple.contains(r#"name="file0"; filename="a.txt""#));
    assert!(multiple.contains(r#"name="file1"; filename="b.txt""#));
}

#[tokio::test]
async fn test_upload_reports_byte_progress() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/covers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let files = vec![
        UploadFile::new("front.png", vec![7u8; 150 * 1024]).mime_type("image/png"),
        UploadFile::new("back.png", vec![9u8; 10 * 1024]).mime_type("image/png"),
    ];

    let client = client_for(&mock_server);
    client
        .upload_with_progress("/api/covers", files, &params(json!({"bookId": 7})), move |sent, total| {
            recorder.lock().unwrap().push((sent, total));
        })
        .await
        .unwrap();

    let total = 160 * 1024;
    let seen = seen.lock().unwrap();
    assert!(seen.len() >= 2);
    assert!(seen.iter().all(|(_, t)| *t == total));
    assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));
    assert_eq!(seen.last(), Some(&(total, total)));

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests[0].body.len() > total as usize);
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains(r#"name="file0"; filename="front.png""#));
    assert!(body.contains(r#"name="bookId""#));
}

#[tokio::test]
async fn test_download_returns_bytes_and_filename() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reports/loans"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", r#"attachment; filename="loans.csv""#)
                .set_body_raw("id,title\n1,Helena\n", "application/json"),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let download = client
        .download("/api/reports/loans", &params(json!({"year": 2024})))
        .await
        .unwrap();

    assert_eq!(download.filename.as_deref(), Some("loans.csv"));
    assert_eq!(download.bytes.as_ref(), b"id,title\n1,Helena\n");

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("year=2024"));
}

#[tokio::test]
async fn test_clones_share_configuration() {
    let client = Client::builder().build().unwrap();
    let clone = client.clone();

    clone
        .setup(ConfigUpdate::new().timeout(Duration::from_secs(5)))
        .unwrap();

    assert_eq!(client.config().timeout, Duration::from_secs(5));
}
