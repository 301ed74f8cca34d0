use super::mock_data::{failed_optimization, mock_game, mock_games};
use super::{ServiceData, or_fallback};
use crate::client::ApiClient;
use crate::transport::Transport;

use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_optimized: bool,
    #[serde(default)]
    pub last_played: Option<String>,
    #[serde(default)]
    pub power_profile: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOptimizationResult {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

pub struct GamesService<T> {
    client: ApiClient<T>,
}

impl<T: Transport> GamesService<T> {
    pub fn new(client: ApiClient<T>) -> Self {
        Self { client }
    }

    pub async fn get_games(&self) -> ServiceData<Vec<Game>> {
        or_fallback(self.client.get("/games").await, "games", mock_games)
    }

    /// `None` only when the backend is down and the id is not a known mock.
    pub async fn get_game_details(&self, game_id: &str) -> ServiceData<Option<Game>> {
        let result = self
            .client
            .get::<Game>(&format!("/games/{}", game_id))
            .await
            .map(Some);
        or_fallback(result, "game details", || mock_game(game_id))
    }

    pub async fn optimize_game(&self, game_id: &str) -> ServiceData<GameOptimizationResult> {
        let result = self
            .client
            .post(&format!("/games/{}/optimize", game_id), json!({}))
            .await;
        or_fallback(result, "game optimization", failed_optimization)
    }
}
