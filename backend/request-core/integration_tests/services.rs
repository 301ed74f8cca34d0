use crate::helpers::{closed_port_url, config_for, stack_for};

use request_core::AppConfig;
use request_core::diagnostics::{run_diagnostics, test_connectivity, test_redirect_protection};
use request_core::services::{DataSource, GamesService, VpnService};

use serde_json::json;
use wiremock::matchers::path;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// **VALUE**: With the backend unreachable the UI still gets data, flagged as mock.
///
/// **WHY THIS MATTERS**: A connection refused on a real socket is the most common failure
/// in the field; it must end at the service boundary.
///
/// **BUG THIS CATCHES**: Would catch a real transport error escaping as a panic or an `Err`.
#[tokio::test]
async fn given_unreachable_backend_when_services_called_then_mock_data() {
    // GIVEN: A stack pointed at a closed port
    let mut config = AppConfig::default();
    config.transport.base_url = closed_port_url().await;
    let (stack, _) = stack_for(&config);

    // WHEN: Calling both services
    let games = GamesService::new(stack.api.clone()).get_games().await;
    let vpn = VpnService::new(stack.api.clone()).get_status().await;

    // THEN: Mock data from both
    assert!(games.is_mock());
    assert_eq!(games.data.len(), 5);
    assert!(vpn.is_mock());
    assert!(!vpn.data.connected);
}

/// **VALUE**: Probes against a closed port say the backend is unreachable, not broken.
///
/// **WHY THIS MATTERS**: Operators act differently on "nothing is listening" than on
/// a model returning errors.
///
/// **BUG THIS CATCHES**: Would catch the connection flag from the HTTP client being
/// dropped on the way to the report.
#[tokio::test]
async fn given_closed_port_when_probed_then_models_reported_unreachable() {
    // GIVEN: A stack pointed at a closed port, retrying without delay
    let mut config = AppConfig::default();
    config.transport.base_url = closed_port_url().await;
    config.ml.retry_delay_ms = 0;
    let (stack, _) = stack_for(&config);

    // WHEN: Probing connectivity and redirect protection
    let connectivity = test_connectivity(&stack.ml).await;
    let redirect = test_redirect_protection(&stack.ml).await;

    // THEN: Every probe failed as unreachable
    assert!(!connectivity.success);
    assert!(connectivity.results.values().all(|probe| probe.unreachable));
    assert!(!redirect.protected);
    assert!(redirect.details.starts_with("Backend unreachable:"), "{}", redirect.details);
}

#[tokio::test]
async fn given_live_backend_when_games_listed_then_live_source() {
    let server = MockServer::start().await;
    Mock::given(path("/games"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "cs2", "name": "Counter-Strike 2", "isOptimized": false }
        ])))
        .mount(&server)
        .await;
    let (stack, _) = stack_for(&config_for(&server));

    let games = GamesService::new(stack.api.clone()).get_games().await;

    assert_eq!(games.source, DataSource::Live);
    assert_eq!(games.data[0].id, "cs2");
}

#[tokio::test]
async fn given_backend_with_redirect_probe_when_diagnostics_run_then_protected() {
    // GIVEN: Health, model probes and a redirecting probe route
    let server = MockServer::start().await;
    Mock::given(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    for model in ["route-optimizer", "performance-predictor", "game-detection", "game-optimization"] {
        Mock::given(path(format!("/ml/health/{}", model)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
            .mount(&server)
            .await;
    }
    Mock::given(path("/ml/test-redirect"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "https://example.com/"))
        .mount(&server)
        .await;
    let (stack, _) = stack_for(&config_for(&server));

    // WHEN: Running diagnostics
    let report = run_diagnostics(&stack, false).await;

    // THEN: Healthy, connected and protected
    assert_eq!(report.backend_healthy, Some(true));
    assert!(report.is_healthy());
    assert!(report.redirect_protection.is_some_and(|r| r.protected));
}
