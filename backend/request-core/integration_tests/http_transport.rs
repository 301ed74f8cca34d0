use request_core::config::TransportConfig;
use request_core::transport::{Method, RequestDescriptor};
use request_core::{ApiErrorKind, HttpTransport, Transport};

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport_for(server: &MockServer) -> HttpTransport {
    HttpTransport::new(&TransportConfig {
        base_url: server.uri(),
        ..TransportConfig::default()
    })
    .expect("transport builds")
}

// ----------------------------------------------------------------------------
// Path resolution
// ----------------------------------------------------------------------------

#[test]
fn given_proxied_path_when_resolved_then_prefix_consumed() {
    let transport = HttpTransport::new(&TransportConfig {
        base_url: "http://127.0.0.1:8000/backend".to_string(),
        ..TransportConfig::default()
    })
    .expect("transport builds");

    let games = transport.resolve("/api/games?page=2").expect("resolves");
    let ml = transport.resolve("/api/ml/game-detection").expect("resolves");
    let plain = transport.resolve("/health").expect("resolves");

    assert_eq!(games.as_str(), "http://127.0.0.1:8000/backend/games?page=2");
    assert_eq!(ml.as_str(), "http://127.0.0.1:8000/backend/ml/game-detection");
    assert_eq!(plain.as_str(), "http://127.0.0.1:8000/backend/health");
}

#[test]
fn given_absolute_url_when_resolved_then_rejected() {
    let transport = HttpTransport::new(&TransportConfig::default()).expect("transport builds");

    let error = transport
        .resolve("https://evil.example/api/games")
        .expect_err("absolute URLs never reach the wire");

    assert_eq!(error.kind(), ApiErrorKind::RedirectBlocked);
}

#[test]
fn given_path_hiding_another_origin_when_resolved_then_rejected() {
    let transport = HttpTransport::new(&TransportConfig {
        base_url: "http://127.0.0.1:8000/backend".to_string(),
        ..TransportConfig::default()
    })
    .expect("transport builds");

    for path in [
        "/http://evil.example/steal",
        "/api/https://evil.example/steal",
        "//evil.example/steal",
        "/api//evil.example/steal",
    ] {
        let error = transport
            .resolve(path)
            .expect_err("the backend origin is fixed");

        assert_eq!(error.kind(), ApiErrorKind::RedirectBlocked, "{}", path);
    }
}

#[test]
fn given_malformed_base_url_when_built_then_error() {
    let result = HttpTransport::new(&TransportConfig {
        base_url: "not a url".to_string(),
        ..TransportConfig::default()
    });

    assert!(result.is_err());
}

// ----------------------------------------------------------------------------
// Wire behavior
// ----------------------------------------------------------------------------

#[tokio::test]
async fn given_post_with_headers_when_sent_then_backend_receives_them() {
    // GIVEN: A backend expecting the proxied path, header and body
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/games/cs2/optimize"))
        .and(header("x-client-source", "test"))
        .and(body_json(json!({ "level": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    // WHEN: Sending through the transport
    let request = RequestDescriptor::new(Method::POST, "/api/games/cs2/optimize")
        .with_header("X-Client-Source", "test")
        .with_header("content-type", "application/json")
        .with_body(serde_json::to_vec(&json!({ "level": 1 })).expect("encode"));
    let response = transport_for(&server).send(request).await.expect("sent");

    // THEN: Status, reported URL and JSON body come back
    assert!(response.status.is_success());
    assert_eq!(response.url, "/api/games/cs2/optimize");
    assert!(response.is_json());
    let body: serde_json::Value = response.parse_json().expect("json");
    assert_eq!(body, json!({ "success": true }));
}

/// **VALUE**: A 3xx comes back to the caller as-is; the transport never follows it.
///
/// **WHY THIS MATTERS**: Following a redirect would let an intermediary move a request,
/// bearer token included, to another origin before any check could run.
///
/// **BUG THIS CATCHES**: Would catch the reqwest client being built with the default
/// redirect policy.
#[tokio::test]
async fn given_redirect_response_when_sent_then_not_followed() {
    // GIVEN: /games redirects to /elsewhere, which must never be hit
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/games"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/elsewhere"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // WHEN: Sending
    let response = transport_for(&server)
        .send(RequestDescriptor::get("/games"))
        .await
        .expect("3xx is still a response");

    // THEN: The raw redirect, Location intact
    assert_eq!(response.status.0, 302);
    assert_eq!(response.header("location"), Some("/elsewhere"));
}

#[tokio::test]
async fn given_slow_backend_when_sent_then_timeout_kind() {
    let server = MockServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let error = transport_for(&server)
        .send(RequestDescriptor::get("/slow").with_timeout(Duration::from_millis(50)))
        .await
        .expect_err("deadline elapses");

    assert_eq!(error.kind(), ApiErrorKind::Timeout);
}

/// **VALUE**: A smuggled absolute path never leaves the configured backend.
///
/// **WHY THIS MATTERS**: The transport attaches whatever `Authorization` header the
/// client set. Resolving `/http://other/x` to `other` hands the bearer token to it.
///
/// **BUG THIS CATCHES**: Would catch the base-URL join letting an absolute string
/// replace the backend origin.
#[tokio::test]
async fn given_path_naming_other_server_when_sent_then_nothing_reaches_either_server() {
    // GIVEN: A backend and another server that would accept the bearer token
    let backend = MockServer::start().await;
    let other = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stolen": true })))
        .expect(0)
        .mount(&other)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend)
        .await;
    let transport = transport_for(&backend);

    // WHEN: Sending a root-relative path naming the other server
    let request = RequestDescriptor::get(format!("/{}/steal", other.uri()))
        .with_header("Authorization", "Bearer secret-token");
    let result = transport.send(request).await;

    // THEN: Blocked before any I/O
    let error = result.expect_err("request must be blocked");
    assert_eq!(error.kind(), ApiErrorKind::RedirectBlocked);
}
