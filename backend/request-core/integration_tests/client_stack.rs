use crate::helpers::{config_for, stack_for};

use request_core::client::ml_models::GameOptimizationOptions;
use request_core::token_store::{TokenKind, TokenStore};
use request_core::{ApiErrorKind, ClientStack, ModelType, RequestOptions};

use common::RedactedToken;

use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Base client through the full stack
// ============================================================================

/// **VALUE**: A request through the full stack arrives with the anti-redirect markers,
/// on the path the proxy forwards to.
///
/// **WHY THIS MATTERS**: The backend relies on the markers to refuse server-side
/// redirects, and the proxy rewrite decides which route is hit.
///
/// **BUG THIS CATCHES**: Would catch the guard being bypassed in the wiring or the
/// proxy prefix reaching the backend.
#[tokio::test]
async fn given_full_stack_when_getting_games_then_guard_headers_on_the_wire() {
    // GIVEN: A backend that only matches when every marker is present
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/games"))
        .and(header("x-no-redirect", "1"))
        .and(header("x-max-redirects", "0"))
        .and(header("x-anti-redirect-protection", "enabled"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    let (stack, _) = stack_for(&config_for(&server));

    // WHEN: Requesting through the proxy prefix
    let games: Value = stack.api.get("/api/games").await.expect("request passes");

    // THEN: Payload returned and the guard counted the request
    assert_eq!(games, json!([]));
    assert_eq!(stack.transport.stats().inspected, 1);
}

#[tokio::test]
async fn given_backend_redirect_when_requested_then_blocked_and_target_untouched() {
    // GIVEN: /games redirects off-site
    let server = MockServer::start().await;
    Mock::given(path("/games"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", "https://gamepathai.com/games"),
        )
        .mount(&server)
        .await;
    let (stack, _) = stack_for(&config_for(&server));

    // WHEN: Requesting
    let error = stack
        .api
        .get::<Value>("/games")
        .await
        .expect_err("redirect must be blocked");

    // THEN: redirect_blocked naming the target
    assert_eq!(error.kind(), ApiErrorKind::RedirectBlocked);
    assert!(error.to_string().contains("gamepathai.com"));
    assert_eq!(stack.transport.stats().blocked, 1);
}

/// **VALUE**: An endpoint naming another server cannot carry the stored bearer token
/// off the backend.
///
/// **WHY THIS MATTERS**: Endpoint normalization turns `http://other/x` into
/// `/http://other/x`, which looks root-relative. Host resolution must stay with the
/// configured backend.
///
/// **BUG THIS CATCHES**: Would catch the guard or the transport letting a smuggled
/// origin replace the backend.
#[tokio::test]
async fn given_endpoint_naming_other_server_when_requested_then_token_never_leaves_backend() {
    // GIVEN: A logged-in stack and another server that wants the token
    let backend = MockServer::start().await;
    let other = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stolen": true })))
        .expect(0)
        .mount(&other)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&backend)
        .await;
    let (stack, _) = stack_for(&config_for(&backend));
    assert!(stack.api.login(RedactedToken::new("secret-token"), None));

    for endpoint in [format!("/{}/steal", other.uri()), format!("{}/steal", other.uri())] {
        // WHEN: Requesting the smuggled endpoint
        let error = stack
            .api
            .get::<Value>(&endpoint)
            .await
            .expect_err("request must be blocked");

        // THEN: redirect_blocked
        assert_eq!(error.kind(), ApiErrorKind::RedirectBlocked, "{}", endpoint);
    }

    // WHEN: The same through the ML client
    let endpoint = format!("/{}/steal", other.uri());
    let error = stack
        .ml
        .request::<Value>(&endpoint, RequestOptions::get(), ModelType::GameDetection)
        .await
        .expect_err("request must be blocked");

    // THEN: Blocked too, and every attempt was counted
    assert_eq!(error.kind(), ApiErrorKind::RedirectBlocked);
    assert_eq!(stack.transport.stats().blocked, 3);
}

#[tokio::test]
async fn given_request_mentioning_disallowed_domain_when_sent_then_never_reaches_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let (stack, _) = stack_for(&config_for(&server));

    let error = stack
        .api
        .get::<Value>("/games?next=gamepathai.com")
        .await
        .expect_err("blocked before dispatch");

    assert_eq!(error.kind(), ApiErrorKind::RedirectBlocked);
}

#[tokio::test]
async fn given_captive_portal_page_when_requested_then_html_response() {
    let server = MockServer::start().await;
    Mock::given(path("/games"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html><body>Sign in</body></html>", "text/html"),
        )
        .mount(&server)
        .await;
    let (stack, _) = stack_for(&config_for(&server));

    let error = stack
        .api
        .get::<Value>("/games")
        .await
        .expect_err("HTML is never success");

    assert_eq!(error.kind(), ApiErrorKind::HtmlResponse);
}

/// **VALUE**: An expired token is refreshed once over the wire and the call retried with
/// the new bearer.
///
/// **WHY THIS MATTERS**: This is the path every long-running session takes when its
/// access token expires.
///
/// **BUG THIS CATCHES**: Would catch the refresh request going to the wrong path, the
/// retry reusing the stale bearer, or the refresh being repeated.
#[tokio::test]
async fn given_expired_token_when_requested_then_refresh_and_retry_over_the_wire() {
    // GIVEN: Stale bearer rejected, refresh endpoint issues a new one
    let server = MockServer::start().await;
    Mock::given(path("/vpn/status"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "expired" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .and(body_json(json!({ "refresh_token": "r1" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "fresh", "refresh_token": "r2" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/vpn/status"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "connected": true })))
        .expect(1)
        .mount(&server)
        .await;
    let (stack, tokens) = stack_for(&config_for(&server));
    stack
        .api
        .login(RedactedToken::new("stale"), Some(RedactedToken::new("r1")));

    // WHEN: Requesting
    let status: Value = stack.api.get("/vpn/status").await.expect("recovers");

    // THEN: Retried payload, rotated refresh token
    assert_eq!(status, json!({ "connected": true }));
    assert_eq!(
        tokens.get(TokenKind::Refresh).map(|t| t.expose().to_string()),
        Some("r2".to_string())
    );
}

#[tokio::test]
async fn given_file_token_path_when_stack_built_from_config_then_tokens_persist() {
    // GIVEN: A config with a token file
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("temp dir");
    let mut config = config_for(&server);
    config.tokens.path = Some(dir.path().join("tokens.json"));

    // WHEN: Logging in through one stack and building another
    let first = ClientStack::from_config(&config).expect("stack builds");
    assert!(first.api.login(RedactedToken::new("persisted"), None));
    let second = ClientStack::from_config(&config).expect("stack builds");

    // THEN: The second stack sees the token
    let token = second.api.tokens().get(TokenKind::Access);
    assert_eq!(token.map(|t| t.expose().to_string()), Some("persisted".to_string()));
}

// ============================================================================
// ML client through the full stack
// ============================================================================

#[tokio::test]
async fn given_ml_operation_when_sent_then_model_headers_reach_backend() {
    // GIVEN: The backend answers the optimize-game route for the right model
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ml/optimize-game/cs2"))
        .and(header("x-ml-operation", "1"))
        .and(header("x-ml-model-type", "game-optimization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "optimizationType": "network",
            "improvements": { "latency": 9.0 }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let (stack, _) = stack_for(&config_for(&server));

    // WHEN: Optimizing
    let response = stack
        .ml
        .optimize_game("cs2", &GameOptimizationOptions::default())
        .await
        .expect("optimization passes");

    // THEN: Parsed response
    assert!(response.success);
    assert_eq!(response.improvements.latency, Some(9.0));
}

#[tokio::test]
async fn given_ml_backend_down_when_detecting_games_then_retried_then_network_error() {
    // GIVEN: The route answers 503 every time
    let server = MockServer::start().await;
    Mock::given(path("/ml/game-detection"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "error": "warming up" })))
        .expect(3)
        .mount(&server)
        .await;
    let (stack, _) = stack_for(&config_for(&server));

    // WHEN: Detecting games
    let error = stack.ml.detect_games().await.expect_err("all attempts fail");

    // THEN: Status error after three attempts, attributed to the model
    assert_eq!(error.kind(), ApiErrorKind::HttpStatus);
    assert_eq!(error.model_type(), Some(ModelType::GameDetection));
    assert!(error.to_string().contains("warming up"));
}

#[tokio::test]
async fn given_ml_probe_with_custom_header_when_sent_then_caller_header_kept() {
    let server = MockServer::start().await;
    Mock::given(path("/ml/health/route-optimizer"))
        .and(header("x-ml-client", "launcher"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;
    let (stack, _) = stack_for(&config_for(&server));

    let body: Value = stack
        .ml
        .request(
            &ModelType::RouteOptimizer.health_endpoint(),
            RequestOptions::get().with_header("X-ML-Client", "launcher"),
            ModelType::RouteOptimizer,
        )
        .await
        .expect("probe passes");

    assert_eq!(body, json!({ "status": "ok" }));
}
