use crate::repositories::errors::game_repository_errors::GameRepositoryError;

#[derive(Debug)]
pub enum GameServiceError {
    InvalidRequest(String),
    GameNotFound(u64),
    UserNotFound(String),
    GameNotJoinable(u64),
    GameFull(u64),
    AlreadyMember(u64),
    /// `game_id` is `None` when the user belongs to no game at all.
    NotAMember {
        user_id: String,
        game_id: Option<u64>,
    },
    DirectoryUnavailable(String),
    RepositoryError(String),
}

impl std::fmt::Display for GameServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameServiceError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            GameServiceError::GameNotFound(id) => write!(f, "Game does not exist: {}", id),
            GameServiceError::UserNotFound(id) => write!(f, "User does not exist: {}", id),
            GameServiceError::GameNotJoinable(id) => {
                write!(f, "Game is no longer waiting for players: {}", id)
            }
            GameServiceError::GameFull(id) => write!(f, "Game is full: {}", id),
            GameServiceError::AlreadyMember(id) => {
                write!(f, "User is already in this game: {}", id)
            }
            GameServiceError::NotAMember {
                user_id,
                game_id: None,
            } => write!(f, "User ({}) belongs to no game", user_id),
            GameServiceError::NotAMember {
                game_id: Some(id), ..
            } => write!(f, "User is not in this game: {}", id),
            GameServiceError::DirectoryUnavailable(msg) => {
                write!(f, "Identity directory unavailable: {}", msg)
            }
            GameServiceError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for GameServiceError {}

impl From<GameRepositoryError> for GameServiceError {
    fn from(error: GameRepositoryError) -> Self {
        GameServiceError::RepositoryError(error.to_string())
    }
}
