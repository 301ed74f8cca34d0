use crate::client::ModelType;
use crate::error::{ApiError, ApiErrorKind};
use crate::url_guard::SuspicionReason;

use common::HttpStatusCode;

use std::time::Duration;

use serde_json::json;

#[test]
fn given_every_kind_when_named_then_snake_case() {
    let names: Vec<&str> = [
        ApiErrorKind::Network,
        ApiErrorKind::Timeout,
        ApiErrorKind::HtmlResponse,
        ApiErrorKind::RedirectBlocked,
        ApiErrorKind::HttpStatus,
        ApiErrorKind::Decode,
    ]
    .iter()
    .map(ApiErrorKind::as_str)
    .collect();

    assert_eq!(
        names,
        vec!["network", "timeout", "html_response", "redirect_blocked", "http_status", "decode"]
    );
    assert_eq!(
        serde_json::to_value(ApiErrorKind::HtmlResponse).expect("serialize"),
        json!("html_response")
    );
}

/// **VALUE**: Error text names the endpoint and the call site.
///
/// **WHY THIS MATTERS**: A blocked redirect reported from the field must be traceable to
/// the code that raised it.
///
/// **BUG THIS CATCHES**: Would catch a constructor losing `#[track_caller]`, which would
/// point every error at the constructor itself.
#[test]
fn given_timeout_error_when_displayed_then_includes_endpoint_and_call_site() {
    // GIVEN/WHEN: A timeout raised here
    let error = ApiError::timeout("/games", Duration::from_millis(1500));

    // THEN: Message carries the endpoint, deadline and this file
    let text = error.to_string();
    assert!(text.contains("/games"));
    assert!(text.contains("1500ms"));
    assert!(text.contains("api_error.rs"));
}

#[test]
fn given_json_body_with_detail_when_status_error_built_then_message_lifted() {
    let error = ApiError::http_status(
        "/games",
        HttpStatusCode(422),
        Some(json!({ "detail": "invalid game id" })),
    );

    assert_eq!(error.status(), Some(HttpStatusCode(422)));
    assert!(error.to_string().contains("invalid game id"));
}

#[test]
fn given_no_body_when_status_error_built_then_generic_message() {
    let error = ApiError::http_status("/games", HttpStatusCode(500), None);

    assert!(error.to_string().contains("HTTP 500"));
}

#[test]
fn given_tagged_error_when_retagged_then_first_model_kept() {
    let error = ApiError::network("/api/ml/x", "refused")
        .with_model_type(ModelType::GameDetection)
        .with_model_type(ModelType::RouteOptimizer);

    assert_eq!(error.model_type(), Some(ModelType::GameDetection));
}

#[test]
fn given_endpoint_present_when_fallback_applied_then_original_kept() {
    let error = ApiError::decode("/games", "bad").with_endpoint("/other");

    assert_eq!(error.endpoint(), "/games");
}

#[test]
fn given_suspicious_url_when_built_then_reason_exposed() {
    let error = ApiError::suspicious_url("/x?redirect=evil", SuspicionReason::RedirectParameter);

    assert_eq!(error.kind(), ApiErrorKind::RedirectBlocked);
    assert_eq!(error.suspicion_reason(), Some(SuspicionReason::RedirectParameter));
    assert!(error.to_string().contains("suspicious URL rejected"));
}

#[test]
fn given_errors_raised_without_a_socket_failure_when_checked_then_not_connection_failures() {
    assert!(!ApiError::network("/games", "stub failure").is_connection_failure());
    assert!(!ApiError::timeout("/games", Duration::from_millis(10)).is_connection_failure());
    assert!(!ApiError::redirect_blocked("/games", "302").is_connection_failure());
}
