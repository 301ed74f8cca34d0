//! Deterministic substitutes served when the backend cannot be reached.

use super::games::{Game, GameOptimizationResult};
use super::vpn::VpnStatus;

fn game(id: &str, name: &str, is_optimized: bool, last_played: Option<&str>, power_profile: &str) -> Game {
    Game {
        id: id.to_string(),
        name: name.to_string(),
        is_optimized,
        last_played: last_played.map(str::to_string),
        power_profile: power_profile.to_string(),
    }
}

pub fn mock_games() -> Vec<Game> {
    vec![
        game("cs2", "Counter-Strike 2", true, Some("Today"), "Maximum Performance"),
        game("valorant", "Valorant", true, Some("Yesterday"), "Balanced"),
        game("fortnite", "Fortnite", false, Some("2 days ago"), "Standard"),
        game("apexlegends", "Apex Legends", false, None, "Standard"),
        game("leagueoflegends", "League of Legends", true, Some("3 days ago"), "Balanced"),
    ]
}

pub fn mock_game(id: &str) -> Option<Game> {
    mock_games().into_iter().find(|game| game.id == id)
}

pub fn failed_optimization() -> GameOptimizationResult {
    GameOptimizationResult {
        success: false,
        message: "Optimization failed".to_string(),
    }
}

pub fn mock_vpn_status() -> VpnStatus {
    VpnStatus {
        connected: false,
        server_ip: None,
        server_location: None,
        recommended_server: "auto".to_string(),
        connection_time: None,
        last_error: None,
    }
}
