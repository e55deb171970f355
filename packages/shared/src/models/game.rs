use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    #[default]
    WaitingToStart,
    InProgress,
    Finished,
}

impl GameStatus {
    /// Only games that have not started accept new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, GameStatus::WaitingToStart)
    }
}

/// A game session as stored in the games table.
/// `id` is `None` only between construction and the first save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: Option<u64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: GameStatus,
    pub creation_time: DateTime<Utc>,
}

impl Game {
    pub fn new(name: String, description: Option<String>, status: GameStatus) -> Self {
        Game {
            id: None,
            name,
            description,
            status,
            creation_time: Utc::now(),
        }
    }

    pub fn location(&self) -> Option<String> {
        self.id.map(|id| format!("/api/games/{}", id))
    }
}

/// Payload accepted by the create endpoint. Clients must leave `id` empty.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateGameRequest {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<GameStatus>,
}
