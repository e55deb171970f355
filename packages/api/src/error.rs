use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::models::responses::ErrorResponse;
use shared::services::errors::game_service_errors::GameServiceError;

use crate::services::errors::auth_service_errors::AuthServiceError;

#[derive(Debug)]
pub enum ApiError {
    GameService(GameServiceError),
    AuthService(AuthServiceError),
}

impl From<GameServiceError> for ApiError {
    fn from(error: GameServiceError) -> Self {
        ApiError::GameService(error)
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(error: AuthServiceError) -> Self {
        ApiError::AuthService(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::GameService(
                GameServiceError::InvalidRequest(_)
                | GameServiceError::GameNotJoinable(_)
                | GameServiceError::GameFull(_)
                | GameServiceError::AlreadyMember(_)
                | GameServiceError::NotAMember { .. },
            ) => StatusCode::BAD_REQUEST,
            ApiError::GameService(
                GameServiceError::GameNotFound(_) | GameServiceError::UserNotFound(_),
            ) => StatusCode::NOT_FOUND,
            ApiError::GameService(GameServiceError::DirectoryUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::GameService(GameServiceError::RepositoryError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            ApiError::AuthService(
                AuthServiceError::MissingCredentials
                | AuthServiceError::InvalidToken
                | AuthServiceError::ExpiredToken,
            ) => StatusCode::UNAUTHORIZED,
            ApiError::AuthService(AuthServiceError::MissingRole(_)) => StatusCode::FORBIDDEN,
            ApiError::AuthService(AuthServiceError::KeyError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::GameService(
                GameServiceError::DirectoryUnavailable(_) | GameServiceError::RepositoryError(_),
            ) => "Service temporarily unavailable".to_string(),
            ApiError::GameService(err) => err.to_string(),
            ApiError::AuthService(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_errors_map_to_status_codes() {
        let cases = [
            (GameServiceError::InvalidRequest("id".to_string()), StatusCode::BAD_REQUEST),
            (GameServiceError::GameNotFound(1), StatusCode::NOT_FOUND),
            (GameServiceError::UserNotFound("bob".to_string()), StatusCode::NOT_FOUND),
            (GameServiceError::GameNotJoinable(1), StatusCode::BAD_REQUEST),
            (GameServiceError::GameFull(1), StatusCode::BAD_REQUEST),
            (GameServiceError::AlreadyMember(1), StatusCode::BAD_REQUEST),
            (
                GameServiceError::NotAMember {
                    user_id: "bob".to_string(),
                    game_id: None,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                GameServiceError::DirectoryUnavailable("timeout".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                GameServiceError::RepositoryError("throttled".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).status(), expected);
        }
    }

    #[test]
    fn test_auth_errors_map_to_status_codes() {
        assert_eq!(
            ApiError::from(AuthServiceError::MissingCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthServiceError::MissingRole("user".to_string())).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let error = ApiError::from(GameServiceError::RepositoryError(
            "arn:aws:dynamodb:secret-table".to_string(),
        ));

        assert!(!error.message().contains("arn:aws"));
    }
}
