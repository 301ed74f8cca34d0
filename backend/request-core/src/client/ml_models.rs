//! Request and response bodies of the ML endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggressiveness {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOptimizationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggressiveness: Option<Aggressiveness>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOptimizationOptions {
    pub optimize_routes: bool,
    pub optimize_settings: bool,
    pub optimize_system: bool,
    pub aggressiveness: Aggressiveness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_info: Option<Value>,
}

impl Default for GameOptimizationOptions {
    fn default() -> Self {
        Self {
            optimize_routes: true,
            optimize_settings: true,
            optimize_system: true,
            aggressiveness: Aggressiveness::Medium,
            system_info: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationType {
    Network,
    System,
    Both,
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Improvements {
    #[serde(default)]
    pub latency: Option<f64>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub stability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeGameResponse {
    pub success: bool,
    pub optimization_type: OptimizationType,
    #[serde(default)]
    pub improvements: Improvements,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedGame {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub last_played: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedGamesResponse {
    #[serde(default)]
    pub detected_games: Vec<DetectedGame>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOptimizerResponse {
    pub success: bool,
    pub optimized_routes: u32,
    pub latency_reduction: f64,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePredictorResponse {
    #[serde(default)]
    pub recommended_settings: Map<String, Value>,
    pub expected_fps: f64,
    pub confidence: f64,
}
