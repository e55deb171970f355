use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::game::{Game, GameStatus};
use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use crate::repositories::game_repository::GameRepository;

#[derive(Default)]
pub struct InMemoryGameRepository {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    games: BTreeMap<u64, Game>,
    last_id: u64,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a game under a fixed id.
    pub fn with_game(mut self, id: u64, status: GameStatus) -> Self {
        let state = self.state.get_mut();
        let mut game = Game::new(format!("Game {}", id), None, status);
        game.id = Some(id);
        state.games.insert(id, game);
        state.last_id = state.last_id.max(id);
        self
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    async fn find_all(&self) -> Result<Vec<Game>, GameRepositoryError> {
        Ok(self.state.lock().await.games.values().cloned().collect())
    }

    async fn find_by_id(&self, game_id: u64) -> Result<Option<Game>, GameRepositoryError> {
        Ok(self.state.lock().await.games.get(&game_id).cloned())
    }

    async fn save(&self, mut game: Game) -> Result<Game, GameRepositoryError> {
        let mut state = self.state.lock().await;
        let id = match game.id {
            Some(id) => id,
            None => {
                state.last_id += 1;
                state.last_id
            }
        };
        game.id = Some(id);
        state.games.insert(id, game.clone());
        Ok(game)
    }
}
