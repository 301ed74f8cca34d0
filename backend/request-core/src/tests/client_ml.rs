use super::stub_client;
use crate::client::ml_models::{Aggressiveness, GameOptimizationOptions, RouteOptimizationParams};
use crate::client::{MlClient, ModelType, RequestOptions, ml_endpoint};
use crate::config::{ClientConfig, EnvironmentConfig};
use crate::error::ApiErrorKind;
use crate::transport::{RawResponse, StubOutcome, StubTransport};

use serde_json::{Value, json};

fn ml_client(stub: StubTransport, config: ClientConfig) -> MlClient<StubTransport> {
    let (api, _) = stub_client(stub, EnvironmentConfig::production(), config);
    MlClient::new(api)
}

fn no_delay() -> ClientConfig {
    ClientConfig {
        retry_delay_ms: 0,
        ..ClientConfig::ml()
    }
}

fn sent_body(stub: &StubTransport, index: usize) -> Value {
    let request = &stub.requests()[index];
    serde_json::from_slice(request.body.as_deref().expect("request body")).expect("json body")
}

#[test]
fn given_ml_endpoints_in_any_form_when_rewritten_then_land_under_api_ml() {
    assert_eq!(ml_endpoint("/ml/game-detection"), "/api/ml/game-detection");
    assert_eq!(ml_endpoint("/api/ml/game-detection"), "/api/ml/game-detection");
    assert_eq!(ml_endpoint("game-detection"), "/api/ml/game-detection");
    assert_eq!(ml_endpoint("/health/route-optimizer"), "/api/ml/health/route-optimizer");
    assert_eq!(ml_endpoint("/ml"), "/api/ml/");
}

/// **VALUE**: ML calls carry the model tag and reach the `/api/ml/` path.
///
/// **WHY THIS MATTERS**: The backend routes by model header and the guard only treats a
/// call as an ML operation when it is flagged. Both are needed for the ML rule set.
///
/// **BUG THIS CATCHES**: Would catch a missing model header, a lost ML flag, or a path
/// sent without the proxy prefix.
#[tokio::test]
async fn given_ml_request_when_sent_then_tagged_with_model_headers() {
    // GIVEN: An ML client over a stub
    let client = ml_client(
        StubTransport::new().respond_json(200, json!({ "ok": true })),
        ClientConfig::ml(),
    );

    // WHEN: Requesting with the model
    let _: Value = client
        .request(
            "/ml/optimize-game/42",
            RequestOptions::get(),
            ModelType::GameOptimization,
        )
        .await
        .expect("request should pass");

    // THEN: Path, flag and headers are all present
    let sent = &client.api().transport().requests()[0];
    assert_eq!(sent.url, "/api/ml/optimize-game/42");
    assert!(sent.is_ml_operation);
    assert_eq!(sent.model_type, Some(ModelType::GameOptimization));
    assert_eq!(sent.header("x-ml-operation"), Some("1"));
    assert_eq!(sent.header("x-ml-model-type"), Some("game-optimization"));
    assert_eq!(sent.header("x-ml-client"), Some(crate::CLIENT_SOURCE));
    assert_eq!(sent.timeout.as_millis(), 30_000);
}

#[tokio::test]
async fn given_response_from_other_path_when_validated_then_redirect_blocked_with_model() {
    // GIVEN: The response reports a different path than requested
    let stub = StubTransport::new().respond(
        RawResponse::json(200, &json!({})).with_url("/api/ml/somewhere-else"),
    );
    let client = ml_client(stub, ClientConfig::ml());

    // WHEN: Requesting
    let error = client
        .request::<Value>("/ml/game-detection", RequestOptions::get(), ModelType::GameDetection)
        .await
        .expect_err("path change is a redirect");

    // THEN: redirect_blocked, attributed to the model
    assert_eq!(error.kind(), ApiErrorKind::RedirectBlocked);
    assert_eq!(error.model_type(), Some(ModelType::GameDetection));
    assert_eq!(error.endpoint(), "/api/ml/game-detection");
}

#[tokio::test]
async fn given_same_path_with_query_when_validated_then_accepted() {
    let stub = StubTransport::new().respond(
        RawResponse::json(200, &json!({ "detectedGames": [] }))
            .with_url("/api/ml/game-detection?cached=1"),
    );
    let client = ml_client(stub, ClientConfig::ml());

    let body: Value = client
        .request("/ml/game-detection", RequestOptions::get(), ModelType::GameDetection)
        .await
        .expect("query change is not a redirect");

    assert_eq!(body, json!({ "detectedGames": [] }));
}

#[tokio::test]
async fn given_response_on_disallowed_domain_when_validated_then_redirect_blocked() {
    let stub = StubTransport::new().respond(
        RawResponse::json(200, &json!({}))
            .with_url("https://gamepathai.com/api/ml/game-detection"),
    );
    let client = ml_client(stub, ClientConfig::ml());

    let error = client
        .request::<Value>("/ml/game-detection", RequestOptions::get(), ModelType::GameDetection)
        .await
        .expect_err("disallowed domain");

    assert_eq!(error.kind(), ApiErrorKind::RedirectBlocked);
    assert!(error.to_string().contains("gamepathai.com"));
}

#[tokio::test]
async fn given_default_options_when_optimizing_game_then_posts_documented_body() {
    // GIVEN: A successful optimization response
    let stub = StubTransport::new().respond_json(
        200,
        json!({
            "success": true,
            "optimizationType": "both",
            "improvements": { "latency": 12.5, "fps": 20.0 }
        }),
    );
    let client = ml_client(stub, ClientConfig::ml());

    // WHEN: Optimizing with defaults
    let response = client
        .optimize_game("42", &GameOptimizationOptions::default())
        .await
        .expect("optimization should pass");

    // THEN: Parsed response and a camelCase body with every toggle on
    assert!(response.success);
    assert_eq!(response.improvements.latency, Some(12.5));
    assert_eq!(response.improvements.stability, None);

    let stub = client.api().transport();
    assert_eq!(stub.requests()[0].url, "/api/ml/optimize-game/42");
    assert_eq!(
        sent_body(stub, 0),
        json!({
            "optimizeRoutes": true,
            "optimizeSettings": true,
            "optimizeSystem": true,
            "aggressiveness": "medium"
        })
    );
}

#[tokio::test]
async fn given_route_params_when_optimizing_routes_then_unset_fields_omitted() {
    let stub = StubTransport::new().respond_json(
        200,
        json!({ "success": true, "optimizedRoutes": 3, "latencyReduction": 18.0 }),
    );
    let client = ml_client(stub, ClientConfig::ml());
    let params = RouteOptimizationParams {
        region: None,
        aggressiveness: Some(Aggressiveness::High),
    };

    let response = client
        .optimize_routes("cs2", &params)
        .await
        .expect("route optimization should pass");

    assert_eq!(response.optimized_routes, 3);
    let stub = client.api().transport();
    assert_eq!(stub.requests()[0].url, "/api/ml/route-optimizer/cs2");
    assert_eq!(stub.requests()[0].header("x-ml-model-type"), Some("route-optimizer"));
    assert_eq!(sent_body(stub, 0), json!({ "aggressiveness": "high" }));
}

#[tokio::test]
async fn given_system_specs_when_predicting_then_wrapped_in_system_specs_field() {
    let stub = StubTransport::new().respond_json(
        200,
        json!({ "expectedFps": 144.0, "confidence": 0.8 }),
    );
    let client = ml_client(stub, ClientConfig::ml());

    let prediction = client
        .predict_performance("valorant", json!({ "gpu": "RTX 3070" }))
        .await
        .expect("prediction should pass");

    assert_eq!(prediction.expected_fps, 144.0);
    assert!(prediction.recommended_settings.is_empty());
    assert_eq!(
        sent_body(client.api().transport(), 0),
        json!({ "systemSpecs": { "gpu": "RTX 3070" } })
    );
}

/// **VALUE**: A named ML operation retries up to the policy, then surfaces the last error.
///
/// **WHY THIS MATTERS**: ML endpoints are slow to warm up. Too few attempts fails users
/// needlessly and unbounded attempts stall the UI.
///
/// **BUG THIS CATCHES**: Would catch an off-by-one in the attempt count or the model tag
/// being lost on the final error.
#[tokio::test]
async fn given_persistent_network_failure_when_detecting_games_then_three_attempts() {
    // GIVEN: Two retries, no delay, every call fails
    let stub = StubTransport::new().otherwise(StubOutcome::Fail("connection refused".into()));
    let client = ml_client(stub, no_delay());

    // WHEN: Detecting games
    let error = client.detect_games().await.expect_err("all attempts fail");

    // THEN: 1 + 2 attempts, network kind, model attributed
    assert_eq!(client.api().transport().calls(), 3);
    assert_eq!(error.kind(), ApiErrorKind::Network);
    assert_eq!(error.model_type(), Some(ModelType::GameDetection));
    assert_eq!(error.endpoint(), "/api/ml/game-detection");
}

#[tokio::test]
async fn given_transient_failure_when_detecting_games_then_recovers_on_retry() {
    let stub = StubTransport::new()
        .fail("connection reset")
        .respond_json(
            200,
            json!({ "detectedGames": [{ "id": "cs2", "name": "Counter-Strike 2", "path": "C:/Games/cs2" }] }),
        );
    let client = ml_client(stub, no_delay());

    let detected = client.detect_games().await.expect("second attempt succeeds");

    assert_eq!(detected.detected_games.len(), 1);
    assert_eq!(detected.detected_games[0].id, "cs2");
    assert_eq!(client.api().transport().calls(), 2);
}

#[test]
fn given_ml_config_when_client_built_then_retry_policy_follows_it() {
    let client = ml_client(StubTransport::new(), ClientConfig::ml());

    let policy = client.retry_policy();

    assert_eq!(policy.attempts, 2);
    assert_eq!(policy.delay.as_millis(), 2_000);
}
