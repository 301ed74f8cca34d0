use std::fmt;

use serde::{Deserialize, Serialize};

/// The ML model a request is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelType {
    RouteOptimizer,
    PerformancePredictor,
    GameDetection,
    GameOptimization,
}

impl ModelType {
    pub const ALL: [ModelType; 4] = [
        ModelType::RouteOptimizer,
        ModelType::PerformancePredictor,
        ModelType::GameDetection,
        ModelType::GameOptimization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::RouteOptimizer => "route-optimizer",
            ModelType::PerformancePredictor => "performance-predictor",
            ModelType::GameDetection => "game-detection",
            ModelType::GameOptimization => "game-optimization",
        }
    }

    /// Key used in connectivity reports.
    pub fn report_key(&self) -> &'static str {
        match self {
            ModelType::RouteOptimizer => "routeOptimizer",
            ModelType::PerformancePredictor => "performancePredictor",
            ModelType::GameDetection => "gameDetection",
            ModelType::GameOptimization => "gameOptimization",
        }
    }

    pub fn health_endpoint(&self) -> String {
        format!("/ml/health/{}", self.as_str())
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
