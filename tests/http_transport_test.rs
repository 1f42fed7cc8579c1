//! Integration tests for [`HttpTransport`] against a local mock server.

use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vordr::transport::{HttpTransport, Transport};
use vordr::{Request, ResponseKind, VordrError};

#[tokio::test]
async fn fetch_captures_status_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/items"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-version", "7")
                .set_body_raw(r#"[{"id":1}]"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri()).unwrap();
    let request = Request::get(&format!("{}/v1/items", server.uri())).unwrap();
    let snapshot = transport.fetch(&request).await.unwrap();

    assert_eq!(snapshot.status(), 200);
    assert!(snapshot.is_ok());
    assert_eq!(snapshot.header("Content-Type"), Some("application/json"));
    assert_eq!(snapshot.header("x-version"), Some("7"));
    assert_eq!(snapshot.kind(), ResponseKind::Basic);
    assert_eq!(
        snapshot.url(),
        Some(format!("{}/v1/items", server.uri()).as_str())
    );

    let items: Vec<serde_json::Value> = snapshot.json().unwrap();
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn non_ok_status_is_a_response_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.css"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri()).unwrap();
    let request = Request::get(&format!("{}/missing.css", server.uri())).unwrap();
    let snapshot = transport.fetch(&request).await.unwrap();

    assert_eq!(snapshot.status(), 404);
    assert!(!snapshot.is_ok());
    assert_eq!(snapshot.text(), "nope");
}

#[tokio::test]
async fn accept_hint_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("accept", "text/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri()).unwrap();
    let request = Request::get(&format!("{}/page", server.uri()))
        .unwrap()
        .accept("text/html");
    let snapshot = transport.fetch(&request).await.unwrap();
    assert_eq!(snapshot.status(), 200);
}

#[tokio::test]
async fn method_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/items"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(server.uri()).unwrap();
    let request = Request::new("post", format!("{}/v1/items", server.uri()).parse().unwrap());
    let snapshot = transport.fetch(&request).await.unwrap();
    assert_eq!(snapshot.status(), 201);
}

#[tokio::test]
async fn foreign_origin_responses_are_cors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new("https://app.example.org").unwrap();
    assert_eq!(transport.name(), "http");
    let request = Request::get(&format!("{}/data", server.uri())).unwrap();
    let snapshot = transport.fetch(&request).await.unwrap();
    assert_eq!(snapshot.kind(), ResponseKind::Cors);
}

#[tokio::test]
async fn connection_failure_is_a_transport_error() {
    let transport =
        HttpTransport::with_timeout("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    let request = Request::get("http://127.0.0.1:1/app.js").unwrap();

    let err = transport.fetch(&request).await.unwrap_err();
    assert!(matches!(err, VordrError::Transport(_)), "got {err:?}");
    assert!(err.is_network());
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let transport = HttpTransport::with_timeout(server.uri(), Duration::from_millis(200)).unwrap();
    let request = Request::get(&format!("{}/slow", server.uri())).unwrap();

    let err = transport.fetch(&request).await.unwrap_err();
    assert!(matches!(err, VordrError::Transport(_)), "got {err:?}");
}
