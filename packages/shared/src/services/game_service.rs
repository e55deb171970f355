use std::sync::Arc;

use tracing::{debug, info};

use crate::models::directory::{UserRecord, GAME_ATTRIBUTE};
use crate::models::game::{CreateGameRequest, Game};
use crate::repositories::errors::identity_directory_errors::IdentityDirectoryError;
use crate::repositories::game_repository::GameRepository;
use crate::repositories::identity_directory::IdentityDirectory;
use crate::services::errors::game_service_errors::GameServiceError;
use crate::services::membership_locks::MembershipLocks;

pub const MAX_PLAYERS_PER_GAME: usize = 4;

/// Game sessions plus the join/leave workflow.
///
/// Membership lives in the directory's `game` user attribute, not in the
/// games table. Player counts are always read live from the directory.
pub struct GameService {
    repository: Arc<dyn GameRepository + Send + Sync>,
    directory: Arc<dyn IdentityDirectory + Send + Sync>,
    locks: MembershipLocks,
}

impl GameService {
    pub fn new(
        repository: Arc<dyn GameRepository + Send + Sync>,
        directory: Arc<dyn IdentityDirectory + Send + Sync>,
    ) -> Self {
        GameService {
            repository,
            directory,
            locks: MembershipLocks::new(),
        }
    }

    pub async fn list_games(&self) -> Result<Vec<Game>, GameServiceError> {
        Ok(self.repository.find_all().await?)
    }

    pub async fn get_game(&self, game_id: u64) -> Result<Game, GameServiceError> {
        self.repository
            .find_by_id(game_id)
            .await?
            .ok_or(GameServiceError::GameNotFound(game_id))
    }

    pub async fn create_game(&self, request: CreateGameRequest) -> Result<Game, GameServiceError> {
        if request.id.is_some() {
            return Err(GameServiceError::InvalidRequest(
                "A new game cannot already have an ID".to_string(),
            ));
        }
        if request.name.trim().is_empty() {
            return Err(GameServiceError::InvalidRequest(
                "Game name cannot be empty".to_string(),
            ));
        }

        let game = Game::new(
            request.name,
            request.description,
            request.status.unwrap_or_default(),
        );
        let game = self.repository.save(game).await?;
        info!(game_id = ?game.id, "Game created");
        Ok(game)
    }

    pub async fn join_game(&self, game_id: u64, user_id: &str) -> Result<(), GameServiceError> {
        validate_user_id(user_id)?;
        let _guard = self.locks.acquire(game_id, user_id).await;

        let game = self.get_game(game_id).await?;
        if !game.status.is_joinable() {
            debug!(game_id, status = ?game.status, "Join rejected: game not joinable");
            return Err(GameServiceError::GameNotJoinable(game_id));
        }

        if self.players_count(game_id).await? >= MAX_PLAYERS_PER_GAME {
            debug!(game_id, "Join rejected: game full");
            return Err(GameServiceError::GameFull(game_id));
        }

        let mut user = self.load_user(user_id).await?;
        if user.is_member_of(game_id) {
            return Err(GameServiceError::AlreadyMember(game_id));
        }

        user.add_game(game_id);
        self.store_user(user_id, &user).await?;
        info!(game_id, user_id, "User joined game");
        Ok(())
    }

    pub async fn leave_game(&self, game_id: u64, user_id: &str) -> Result<(), GameServiceError> {
        validate_user_id(user_id)?;
        let _guard = self.locks.acquire(game_id, user_id).await;

        self.get_game(game_id).await?;

        let mut user = self.load_user(user_id).await?;
        if user.games().is_none() {
            return Err(GameServiceError::NotAMember {
                user_id: user_id.to_string(),
                game_id: None,
            });
        }
        if !user.is_member_of(game_id) {
            return Err(GameServiceError::NotAMember {
                user_id: user_id.to_string(),
                game_id: Some(game_id),
            });
        }

        user.remove_game(game_id);
        self.store_user(user_id, &user).await?;
        info!(game_id, user_id, "User left game");
        Ok(())
    }

    pub async fn players_count(&self, game_id: u64) -> Result<usize, GameServiceError> {
        let members = self
            .directory
            .search_users_by_attribute(GAME_ATTRIBUTE, &game_id.to_string())
            .await
            .map_err(|e| GameServiceError::DirectoryUnavailable(e.to_string()))?;
        Ok(members.len())
    }

    async fn load_user(&self, user_id: &str) -> Result<UserRecord, GameServiceError> {
        self.directory
            .get_user(user_id)
            .await
            .map_err(|e| directory_error(e, user_id))
    }

    async fn store_user(&self, user_id: &str, user: &UserRecord) -> Result<(), GameServiceError> {
        self.directory
            .update_user(user_id, user)
            .await
            .map_err(|e| directory_error(e, user_id))
    }
}

fn validate_user_id(user_id: &str) -> Result<(), GameServiceError> {
    if user_id.is_empty() {
        return Err(GameServiceError::InvalidRequest(
            "User ID cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn directory_error(error: IdentityDirectoryError, user_id: &str) -> GameServiceError {
    match error {
        IdentityDirectoryError::UserNotFound => GameServiceError::UserNotFound(user_id.to_string()),
        other => GameServiceError::DirectoryUnavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::GameStatus;
    use crate::repositories::game_repository::MockGameRepository;
    use crate::repositories::identity_directory::MockIdentityDirectory;
    use crate::testing::{InMemoryGameRepository, InMemoryIdentityDirectory};

    fn member_of(user_id: &str, game_id: u64) -> UserRecord {
        let mut user = UserRecord::new(user_id);
        user.add_game(game_id);
        user
    }

    fn service(
        repository: InMemoryGameRepository,
        directory: InMemoryIdentityDirectory,
    ) -> (GameService, Arc<InMemoryIdentityDirectory>) {
        let directory = Arc::new(directory);
        let service = GameService::new(Arc::new(repository), directory.clone());
        (service, directory)
    }

    fn create_request(name: &str) -> CreateGameRequest {
        CreateGameRequest {
            id: None,
            name: name.to_string(),
            description: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_game_assigns_id_and_location() {
        let (service, _) = service(InMemoryGameRepository::new(), InMemoryIdentityDirectory::new());

        let game = service.create_game(create_request("Lobby")).await.unwrap();

        let id = game.id.expect("created game has an id");
        assert_eq!(game.location(), Some(format!("/api/games/{}", id)));
        assert_eq!(game.status, GameStatus::WaitingToStart);
    }

    #[tokio::test]
    async fn test_create_game_rejects_client_id() {
        let repository = InMemoryGameRepository::new();
        let (service, _) = service(repository, InMemoryIdentityDirectory::new());

        let mut request = create_request("Lobby");
        request.id = Some(5);
        let result = service.create_game(request).await;

        assert!(matches!(result, Err(GameServiceError::InvalidRequest(_))));
        assert!(service.list_games().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_game_rejects_blank_name() {
        let (service, _) = service(InMemoryGameRepository::new(), InMemoryIdentityDirectory::new());

        let result = service.create_game(create_request("  ")).await;

        assert!(matches!(result, Err(GameServiceError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_list_games_returns_every_game() {
        let repository = InMemoryGameRepository::new()
            .with_game(1, GameStatus::WaitingToStart)
            .with_game(2, GameStatus::Finished);
        let (service, _) = service(repository, InMemoryIdentityDirectory::new());

        let games = service.list_games().await.unwrap();

        assert_eq!(
            games.iter().map(|g| g.id).collect::<Vec<_>>(),
            vec![Some(1), Some(2)]
        );
    }

    #[tokio::test]
    async fn test_get_missing_game_is_not_found() {
        let (service, _) = service(InMemoryGameRepository::new(), InMemoryIdentityDirectory::new());

        let result = service.get_game(99).await;

        assert!(matches!(result, Err(GameServiceError::GameNotFound(99))));
    }

    #[tokio::test]
    async fn test_join_leave_scenario() {
        let repository = InMemoryGameRepository::new().with_game(42, GameStatus::WaitingToStart);
        let directory = InMemoryIdentityDirectory::new().with_user(UserRecord::new("alice"));
        let (service, directory) = service(repository, directory);

        service.join_game(42, "alice").await.unwrap();
        let alice = directory.user("alice").await.unwrap();
        assert_eq!(alice.games().unwrap(), ["42".to_string()]);

        let second = service.join_game(42, "alice").await;
        assert!(matches!(second, Err(GameServiceError::AlreadyMember(42))));

        service.leave_game(42, "alice").await.unwrap();
        let alice = directory.user("alice").await.unwrap();
        assert!(!alice.is_member_of(42));

        let again = service.leave_game(42, "alice").await;
        match again {
            Err(err @ GameServiceError::NotAMember { game_id: None, .. }) => {
                assert_eq!(err.to_string(), "User (alice) belongs to no game");
            }
            other => panic!("expected NotAMember without game, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_join_full_game_fails() {
        let mut directory = InMemoryIdentityDirectory::new().with_user(UserRecord::new("eve"));
        for name in ["a", "b", "c", "d"] {
            directory = directory.with_user(member_of(name, 7));
        }
        let repository = InMemoryGameRepository::new().with_game(7, GameStatus::WaitingToStart);
        let (service, directory) = service(repository, directory);

        let result = service.join_game(7, "eve").await;

        assert!(matches!(result, Err(GameServiceError::GameFull(7))));
        assert!(directory.user("eve").await.unwrap().games().is_none());
    }

    #[tokio::test]
    async fn test_join_with_three_members_succeeds() {
        let mut directory = InMemoryIdentityDirectory::new().with_user(UserRecord::new("eve"));
        for name in ["a", "b", "c"] {
            directory = directory.with_user(member_of(name, 7));
        }
        let repository = InMemoryGameRepository::new().with_game(7, GameStatus::WaitingToStart);
        let (service, _) = service(repository, directory);

        service.join_game(7, "eve").await.unwrap();
        assert_eq!(service.players_count(7).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_join_started_game_fails() {
        for status in [GameStatus::InProgress, GameStatus::Finished] {
            let repository = InMemoryGameRepository::new().with_game(3, status);
            let directory = InMemoryIdentityDirectory::new().with_user(UserRecord::new("alice"));
            let (service, _) = service(repository, directory);

            let result = service.join_game(3, "alice").await;

            assert!(matches!(result, Err(GameServiceError::GameNotJoinable(3))));
        }
    }

    #[tokio::test]
    async fn test_join_missing_game_fails() {
        let directory = InMemoryIdentityDirectory::new().with_user(UserRecord::new("alice"));
        let (service, _) = service(InMemoryGameRepository::new(), directory);

        let result = service.join_game(1, "alice").await;

        assert!(matches!(result, Err(GameServiceError::GameNotFound(1))));
    }

    #[tokio::test]
    async fn test_join_unknown_user_fails() {
        let repository = InMemoryGameRepository::new().with_game(1, GameStatus::WaitingToStart);
        let (service, _) = service(repository, InMemoryIdentityDirectory::new());

        let result = service.join_game(1, "ghost").await;

        match result {
            Err(GameServiceError::UserNotFound(id)) => assert_eq!(id, "ghost"),
            other => panic!("expected UserNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_full_started_game_is_not_joinable() {
        let mut directory = InMemoryIdentityDirectory::new().with_user(UserRecord::new("eve"));
        for name in ["a", "b", "c", "d"] {
            directory = directory.with_user(member_of(name, 7));
        }
        let repository = InMemoryGameRepository::new().with_game(7, GameStatus::InProgress);
        let (service, _) = service(repository, directory);

        let result = service.join_game(7, "eve").await;

        assert!(matches!(result, Err(GameServiceError::GameNotJoinable(7))));
    }

    #[tokio::test]
    async fn test_leave_unknown_user_fails() {
        let repository = InMemoryGameRepository::new().with_game(1, GameStatus::WaitingToStart);
        let (service, _) = service(repository, InMemoryIdentityDirectory::new());

        let result = service.leave_game(1, "ghost").await;

        match result {
            Err(GameServiceError::UserNotFound(id)) => assert_eq!(id, "ghost"),
            other => panic!("expected UserNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_leave_during_directory_outage_is_unavailable() {
        let repository = InMemoryGameRepository::new().with_game(1, GameStatus::WaitingToStart);
        let mut directory = MockIdentityDirectory::new();
        directory
            .expect_get_user()
            .returning(|_| Err(IdentityDirectoryError::Unavailable("timeout".to_string())));
        directory.expect_update_user().never();
        let service = GameService::new(Arc::new(repository), Arc::new(directory));

        let result = service.leave_game(1, "alice").await;

        assert!(matches!(result, Err(GameServiceError::DirectoryUnavailable(_))));
    }

    #[tokio::test]
    async fn test_leave_write_failure_is_unavailable() {
        let repository = InMemoryGameRepository::new().with_game(1, GameStatus::WaitingToStart);
        let mut directory = MockIdentityDirectory::new();
        directory
            .expect_get_user()
            .returning(|id| Ok(member_of(id, 1)));
        directory
            .expect_update_user()
            .times(1)
            .returning(|_, _| Err(IdentityDirectoryError::Unavailable("503".to_string())));
        let service = GameService::new(Arc::new(repository), Arc::new(directory));

        let result = service.leave_game(1, "alice").await;

        assert!(matches!(result, Err(GameServiceError::DirectoryUnavailable(_))));
    }

    #[tokio::test]
    async fn test_empty_user_id_is_invalid() {
        let repository = InMemoryGameRepository::new().with_game(1, GameStatus::WaitingToStart);
        let (service, _) = service(repository, InMemoryIdentityDirectory::new());

        assert!(matches!(
            service.join_game(1, "").await,
            Err(GameServiceError::InvalidRequest(_))
        ));
        assert!(matches!(
            service.leave_game(1, "").await,
            Err(GameServiceError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_leave_other_game_is_not_a_member() {
        let repository = InMemoryGameRepository::new()
            .with_game(1, GameStatus::WaitingToStart)
            .with_game(2, GameStatus::WaitingToStart);
        let directory = InMemoryIdentityDirectory::new().with_user(member_of("alice", 1));
        let (service, directory) = service(repository, directory);

        let result = service.leave_game(2, "alice").await;

        assert!(matches!(
            result,
            Err(GameServiceError::NotAMember {
                game_id: Some(2),
                ..
            })
        ));
        assert!(directory.user("alice").await.unwrap().is_member_of(1));
    }

    #[tokio::test]
    async fn test_leave_is_allowed_after_game_started() {
        let repository = InMemoryGameRepository::new().with_game(1, GameStatus::InProgress);
        let directory = InMemoryIdentityDirectory::new().with_user(member_of("alice", 1));
        let (service, directory) = service(repository, directory);

        service.leave_game(1, "alice").await.unwrap();

        assert!(!directory.user("alice").await.unwrap().is_member_of(1));
    }

    #[tokio::test]
    async fn test_leave_missing_game_fails() {
        let directory = InMemoryIdentityDirectory::new().with_user(member_of("alice", 1));
        let (service, _) = service(InMemoryGameRepository::new(), directory);

        let result = service.leave_game(1, "alice").await;

        assert!(matches!(result, Err(GameServiceError::GameNotFound(1))));
    }

    #[tokio::test]
    async fn test_join_then_leave_preserves_other_attributes() {
        let mut alice = UserRecord::new("alice");
        alice.username = Some("alice".to_string());
        alice
            .attributes
            .insert("locale".to_string(), vec!["fr".to_string()]);
        alice.attributes.insert(
            "teams".to_string(),
            vec!["red".to_string(), "blue".to_string()],
        );
        alice
            .other
            .insert("enabled".to_string(), serde_json::Value::Bool(true));
        let before = alice.clone();

        let repository = InMemoryGameRepository::new().with_game(42, GameStatus::WaitingToStart);
        let directory = InMemoryIdentityDirectory::new().with_user(alice);
        let (service, directory) = service(repository, directory);

        service.join_game(42, "alice").await.unwrap();
        service.leave_game(42, "alice").await.unwrap();

        assert_eq!(directory.user("alice").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_join_keeps_existing_memberships() {
        let repository = InMemoryGameRepository::new().with_game(2, GameStatus::WaitingToStart);
        let directory = InMemoryIdentityDirectory::new().with_user(member_of("alice", 1));
        let (service, directory) = service(repository, directory);

        service.join_game(2, "alice").await.unwrap();

        let alice = directory.user("alice").await.unwrap();
        assert_eq!(alice.games().unwrap(), ["1".to_string(), "2".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_respect_capacity() {
        let mut directory = InMemoryIdentityDirectory::new();
        for n in 0..10 {
            directory = directory.with_user(UserRecord::new(&format!("player-{}", n)));
        }
        let repository = InMemoryGameRepository::new().with_game(5, GameStatus::WaitingToStart);
        let (service, _) = service(repository, directory);
        let service = Arc::new(service);

        let mut handles = Vec::new();
        for n in 0..10 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.join_game(5, &format!("player-{}", n)).await
            }));
        }

        let mut joined = 0;
        let mut full = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => joined += 1,
                Err(GameServiceError::GameFull(5)) => full += 1,
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(joined, MAX_PLAYERS_PER_GAME);
        assert_eq!(full, 10 - MAX_PLAYERS_PER_GAME);
        assert_eq!(service.players_count(5).await.unwrap(), MAX_PLAYERS_PER_GAME);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_of_one_user_keep_every_game() {
        let mut repository = InMemoryGameRepository::new();
        for id in 1..=6 {
            repository = repository.with_game(id, GameStatus::WaitingToStart);
        }
        let directory = InMemoryIdentityDirectory::new().with_user(UserRecord::new("alice"));
        let (service, directory) = service(repository, directory);
        let service = Arc::new(service);

        let mut handles = Vec::new();
        for id in 1..=6 {
            let service = service.clone();
            handles.push(tokio::spawn(async move { service.join_game(id, "alice").await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let alice = directory.user("alice").await.unwrap();
        assert_eq!(alice.games().unwrap().len(), 6);
        for id in 1..=6 {
            assert!(alice.is_member_of(id));
        }
    }

    #[tokio::test]
    async fn test_directory_outage_is_reported() {
        let repository = InMemoryGameRepository::new().with_game(1, GameStatus::WaitingToStart);
        let mut directory = MockIdentityDirectory::new();
        directory
            .expect_search_users_by_attribute()
            .returning(|_, _| Err(IdentityDirectoryError::Unavailable("timeout".to_string())));
        let service = GameService::new(Arc::new(repository), Arc::new(directory));

        let result = service.join_game(1, "alice").await;

        assert!(matches!(result, Err(GameServiceError::DirectoryUnavailable(_))));
    }

    #[tokio::test]
    async fn test_user_vanishing_before_write_is_not_found() {
        let repository = InMemoryGameRepository::new().with_game(1, GameStatus::WaitingToStart);
        let mut directory = MockIdentityDirectory::new();
        directory
            .expect_search_users_by_attribute()
            .returning(|_, _| Ok(Vec::new()));
        directory
            .expect_get_user()
            .returning(|id| Ok(UserRecord::new(id)));
        directory
            .expect_update_user()
            .times(1)
            .returning(|_, _| Err(IdentityDirectoryError::UserNotFound));
        let service = GameService::new(Arc::new(repository), Arc::new(directory));

        let result = service.join_game(1, "alice").await;

        assert!(matches!(result, Err(GameServiceError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_store_failure_is_repository_error() {
        let mut repository = MockGameRepository::new();
        repository.expect_find_all().returning(|| {
            Err(crate::repositories::errors::game_repository_errors::GameRepositoryError::DynamoDb(
                "throttled".to_string(),
            ))
        });
        let service = GameService::new(
            Arc::new(repository),
            Arc::new(InMemoryIdentityDirectory::new()),
        );

        let result = service.list_games().await;

        assert!(matches!(result, Err(GameServiceError::RepositoryError(_))));
    }
}
