use crate::models::game::Game;
use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client;
use serde_dynamo::{from_item, to_attribute_value, to_item};

#[cfg(test)]
use mockall::automock;

/// Key of the single item in the counter table that hands out game ids.
const GAME_ID_COUNTER_KEY: &str = "game_id";

pub struct DynamoDbGameRepository {
    pub client: Client,
    pub table_name: String,
    pub counter_table_name: String,
}

impl DynamoDbGameRepository {
    pub fn new(client: Client, table_name: String, counter_table_name: String) -> Self {
        Self {
            client,
            table_name,
            counter_table_name,
        }
    }

    async fn next_game_id(&self) -> Result<u64, GameRepositoryError> {
        let output = self
            .client
            .update_item()
            .table_name(&self.counter_table_name)
            .key(
                "counter",
                AttributeValue::S(GAME_ID_COUNTER_KEY.to_string()),
            )
            .update_expression("ADD next_id :one")
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(|e| GameRepositoryError::DynamoDb(e.to_string()))?;

        match output.attributes.as_ref().and_then(|attrs| attrs.get("next_id")) {
            Some(AttributeValue::N(value)) => value.parse::<u64>().map_err(|e| {
                GameRepositoryError::Serialization(format!("Invalid game id counter: {}", e))
            }),
            _ => Err(GameRepositoryError::DynamoDb(
                "Game id counter did not return a value".to_string(),
            )),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait GameRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Game>, GameRepositoryError>;
    async fn find_by_id(&self, game_id: u64) -> Result<Option<Game>, GameRepositoryError>;
    /// Persists the game, assigning an id first when it has none.
    async fn save(&self, game: Game) -> Result<Game, GameRepositoryError>;
}

#[async_trait]
impl GameRepository for DynamoDbGameRepository {
    async fn find_all(&self) -> Result<Vec<Game>, GameRepositoryError> {
        let mut games = Vec::new();
        let mut start_key = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|e| GameRepositoryError::DynamoDb(e.to_string()))?;

            for item in output.items.unwrap_or_default() {
                let game: Game = from_item(item)
                    .map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;
                games.push(game);
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        games.sort_by_key(|game| game.id);
        Ok(games)
    }

    async fn find_by_id(&self, game_id: u64) -> Result<Option<Game>, GameRepositoryError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(
                "id",
                to_attribute_value(game_id)
                    .map_err(|e| GameRepositoryError::Serialization(e.to_string()))?,
            )
            .send()
            .await
            .map_err(|e| GameRepositoryError::DynamoDb(e.to_string()))?;

        if let Some(item) = output.item {
            let game: Game =
                from_item(item).map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;
            Ok(Some(game))
        } else {
            Ok(None)
        }
    }

    async fn save(&self, mut game: Game) -> Result<Game, GameRepositoryError> {
        if game.id.is_none() {
            game.id = Some(self.next_game_id().await?);
        }

        let item = to_item(&game).map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| GameRepositoryError::DynamoDb(e.to_string()))?;

        Ok(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::GameStatus;
    use std::collections::HashMap;

    #[test]
    fn test_game_item_uses_numeric_id_key() {
        let mut game = Game::new("Lobby".to_string(), None, GameStatus::WaitingToStart);
        game.id = Some(42);

        let item: HashMap<String, AttributeValue> = to_item(&game).unwrap();

        assert_eq!(item.get("id"), Some(&AttributeValue::N("42".to_string())));
        assert_eq!(
            item.get("status"),
            Some(&AttributeValue::S("WAITING_TO_START".to_string()))
        );
        assert!(!item.contains_key("description"));
    }

    #[test]
    fn test_game_item_round_trip_keeps_fields() {
        let mut game = Game::new(
            "Lobby".to_string(),
            Some("four players".to_string()),
            GameStatus::InProgress,
        );
        game.id = Some(3);

        let item: HashMap<String, AttributeValue> = to_item(&game).unwrap();
        let restored: Game = from_item(item).unwrap();

        assert_eq!(restored, game);
    }

    #[tokio::test]
    async fn test_repository_trait_is_mockable() {
        let mut repository = MockGameRepository::new();
        repository
            .expect_find_by_id()
            .withf(|id| *id == 9)
            .returning(|_| Ok(None));

        let found = repository.find_by_id(9).await.unwrap();
        assert!(found.is_none());
    }
}
