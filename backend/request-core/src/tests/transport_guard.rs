use crate::client::ModelType;
use crate::config::EnvironmentConfig;
use crate::error::ApiErrorKind;
use crate::transport::{
    GuardedTransport, Method, RawResponse, RequestDescriptor, StubTransport, Transport,
};
use crate::url_guard::{RedirectDetector, SuspicionReason};

use std::sync::Arc;

use serde_json::json;

fn guarded(stub: StubTransport, environment: EnvironmentConfig) -> GuardedTransport<StubTransport> {
    GuardedTransport::new(stub, RedirectDetector::new(Arc::new(environment)))
}

fn ok_stub() -> StubTransport {
    StubTransport::new().respond_json(200, json!({ "ok": true }))
}

/// **VALUE**: A suspicious URL is rejected before the inner transport sees it.
///
/// **WHY THIS MATTERS**: Blocking after dispatch would already have leaked the request
/// (and its bearer token) to the redirect target.
///
/// **BUG THIS CATCHES**: Would catch the guard classifying after `send`, or treating a
/// suspicious classification as a warning.
#[tokio::test]
async fn given_disallowed_domain_when_sent_then_blocked_without_network_io() {
    // GIVEN: A guard over a stub that would answer successfully
    let guard = guarded(ok_stub(), EnvironmentConfig::production());

    // WHEN: Sending to the disallowed domain
    let result = guard
        .send(RequestDescriptor::get("https://gamepathai.com/games"))
        .await;

    // THEN: RedirectBlocked, the stub was never called, the block was counted
    let error = result.expect_err("request must be blocked");
    assert_eq!(error.kind(), ApiErrorKind::RedirectBlocked);
    assert_eq!(error.suspicion_reason(), Some(SuspicionReason::DisallowedDomain));
    assert_eq!(guard.inner().calls(), 0);
    assert_eq!(guard.stats().blocked, 1);
}

#[tokio::test]
async fn given_trusted_absolute_url_when_sent_then_inner_receives_relative_path() {
    // GIVEN: A development guard
    let guard = guarded(ok_stub(), EnvironmentConfig::development());

    // WHEN: Sending an absolute local dev URL
    guard
        .send(RequestDescriptor::get("http://localhost:5173/games?page=2"))
        .await
        .expect("request should pass");

    // THEN: The inner transport saw only the root-relative form
    let requests = guard.inner().requests();
    assert_eq!(requests[0].url, "/games?page=2");
    assert_eq!(guard.stats().sanitized, 1);
}

#[tokio::test]
async fn given_untrusted_absolute_url_when_sent_then_rejected_as_not_root_relative() {
    let guard = guarded(ok_stub(), EnvironmentConfig::production());

    let error = guard
        .send(RequestDescriptor::get("https://example.org/page"))
        .await
        .expect_err("absolute URL must not leave");

    assert_eq!(error.kind(), ApiErrorKind::RedirectBlocked);
    assert!(error.to_string().contains("not root-relative"));
    assert_eq!(guard.inner().calls(), 0);
}

/// **VALUE**: Anti-redirect markers always reach the wire, even when a caller sets them.
///
/// **BUG THIS CATCHES**: Would catch header merging that lets a caller switch off
/// `X-No-Redirect`, or that clobbers a caller's own cache policy.
#[tokio::test]
async fn given_caller_headers_when_sent_then_redirect_markers_win_and_others_are_kept() {
    // GIVEN: A request that tries to disable the redirect marker and sets its own cache policy
    let guard = guarded(ok_stub(), EnvironmentConfig::production());
    let request = RequestDescriptor::get("/games")
        .with_header("X-No-Redirect", "0")
        .with_header("Cache-Control", "max-age=60");

    // WHEN: Sending it
    guard.send(request).await.expect("request should pass");

    // THEN: Markers forced, caller cache policy kept, defaults filled in
    let sent = &guard.inner().requests()[0];
    assert_eq!(sent.header("x-no-redirect"), Some("1"));
    assert_eq!(sent.header("x-max-redirects"), Some("0"));
    assert_eq!(sent.header("x-anti-redirect-protection"), Some("enabled"));
    assert_eq!(sent.header("cache-control"), Some("max-age=60"));
    assert_eq!(sent.header("pragma"), Some("no-cache"));
    assert_eq!(sent.header("x-requested-with"), Some("XMLHttpRequest"));
    assert_eq!(sent.header("x-ml-operation"), None);
}

#[tokio::test]
async fn given_ml_request_when_sent_then_ml_operation_marker_added() {
    let guard = guarded(ok_stub(), EnvironmentConfig::production());
    let request =
        RequestDescriptor::new(Method::POST, "/api/ml/optimize-game/42").ml(Some(ModelType::GameOptimization));

    guard.send(request).await.expect("request should pass");

    assert_eq!(guard.inner().requests()[0].header("X-ML-Operation"), Some("1"));
}

/// **VALUE**: A 3xx answer is a failure, never something to follow.
///
/// **BUG THIS CATCHES**: Would catch the guard passing a redirect response up to the
/// client, which would then report a confusing decode or status error instead.
#[tokio::test]
async fn given_redirect_status_when_received_then_blocked_with_location() {
    // GIVEN: A stub answering 302 towards the production domain
    let stub = StubTransport::new()
        .respond(RawResponse::new(302).with_header("Location", "https://gamepathai.com/login"));
    let guard = guarded(stub, EnvironmentConfig::production());

    // WHEN: Sending a legitimate request
    let error = guard
        .send(RequestDescriptor::get("/games").ml(Some(ModelType::GameDetection)))
        .await
        .expect_err("redirect must be blocked");

    // THEN: RedirectBlocked naming the target, tagged with the model
    assert_eq!(error.kind(), ApiErrorKind::RedirectBlocked);
    assert!(error.to_string().contains("https://gamepathai.com/login"));
    assert_eq!(error.model_type(), Some(ModelType::GameDetection));
}

#[tokio::test]
async fn given_response_from_other_host_when_received_then_blocked() {
    let stub = StubTransport::new()
        .respond(RawResponse::json(200, &json!({})).with_url("https://evil.example/games"));
    let guard = guarded(stub, EnvironmentConfig::production());

    let error = guard
        .send(RequestDescriptor::get("/games"))
        .await
        .expect_err("host change must be blocked");

    assert_eq!(error.kind(), ApiErrorKind::RedirectBlocked);
    assert_eq!(guard.stats().blocked, 1);
}

/// **VALUE**: Guarding an already-guarded transport does not inspect twice.
///
/// **WHY THIS MATTERS**: Double inspection would double-count stats and re-sanitize
/// URLs that were already rewritten.
///
/// **BUG THIS CATCHES**: Would catch `is_guarded` not being consulted by the constructor.
#[tokio::test]
async fn given_guard_wrapping_guard_when_sent_then_inner_guard_inspects_once() {
    // GIVEN: A guard wrapping a guard
    let inner = guarded(ok_stub(), EnvironmentConfig::production());
    let outer = GuardedTransport::new(
        inner,
        RedirectDetector::new(Arc::new(EnvironmentConfig::production())),
    );

    // WHEN: Sending one request
    outer
        .send(RequestDescriptor::get("/games"))
        .await
        .expect("request should pass");

    // THEN: Only the inner guard counted it, and the stub saw one call
    assert!(outer.is_guarded());
    assert_eq!(outer.stats().inspected, 0);
    assert_eq!(outer.inner().stats().inspected, 1);
    assert_eq!(outer.inner().inner().calls(), 1);
}

#[test]
fn given_guard_when_inspecting_synchronously_then_same_rules_apply() {
    let guard = guarded(StubTransport::new(), EnvironmentConfig::production());

    assert_eq!(guard.inspect("/games", false).expect("safe"), "/games");
    assert!(guard.inspect("/games?redirect=x", false).is_err());
    assert_eq!(guard.inner().calls(), 0);
}

/// **VALUE**: A root-relative path that smuggles a full URL never reaches the transport.
///
/// **WHY THIS MATTERS**: `/http://host/x` starts with `/` and matches none of the
/// redirect patterns, yet a base-URL join sends it to `host` with the bearer token.
///
/// **BUG THIS CATCHES**: Would catch the guard accepting any path that merely starts
/// with `/`.
#[tokio::test]
async fn given_path_hiding_absolute_url_when_sent_then_blocked_before_dispatch() {
    // GIVEN: A production guard over a stub that would answer successfully
    let guard = guarded(ok_stub(), EnvironmentConfig::production());

    for url in ["/http://127.0.0.1:9/steal", "/api/https://evil.example/x", "//evil.example/x"] {
        // WHEN: Sending the smuggled URL
        let error = guard
            .send(RequestDescriptor::get(url))
            .await
            .expect_err("request must be blocked");

        // THEN: RedirectBlocked
        assert_eq!(error.kind(), ApiErrorKind::RedirectBlocked, "{}", url);
    }

    // THEN: Nothing was dispatched
    assert_eq!(guard.inner().calls(), 0);
    assert_eq!(guard.stats().blocked, 3);
}
