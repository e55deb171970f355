use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use lambda_http::tracing::{error, warn};
use shared::models::game::{CreateGameRequest, Game};
use shared::services::errors::game_service_errors::GameServiceError;

use crate::{
    error::ApiError,
    middleware::auth::{require_user_role, AuthenticatedUser},
    state::AppState,
};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/games", get(list_games).post(create_game))
        .route("/api/games/", post(create_game))
        .route("/api/games/{id}", get(get_game))
        .route("/api/games/{game_id}/join", post(join_game))
        .route("/api/games/{game_id}/leave", post(leave_game))
        .route_layer(middleware::from_fn_with_state(state, require_user_role))
}

async fn list_games(State(state): State<AppState>) -> Result<Json<Vec<Game>>, ApiError> {
    state
        .game_service
        .list_games()
        .await
        .map(Json)
        .map_err(|e| {
            error!("Failed to list games: {}", e);
            ApiError::from(e)
        })
}

async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Game>, ApiError> {
    state
        .game_service
        .get_game(id)
        .await
        .map(Json)
        .map_err(ApiError::from)
}

#[tracing::instrument(skip(state, caller, payload), fields(caller_id = %caller.user_id))]
async fn create_game(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateGameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let game = state.game_service.create_game(payload).await.map_err(|e| {
        warn!("Rejected game creation: {}", e);
        ApiError::from(e)
    })?;

    let location = game.location().unwrap_or_default();
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(game),
    ))
}

#[tracing::instrument(skip(state, caller, body), fields(caller_id = %caller.user_id))]
async fn join_game(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(game_id): Path<u64>,
    body: String,
) -> Result<StatusCode, ApiError> {
    let user_id = parse_user_id(&body)?;
    state
        .game_service
        .join_game(game_id, &user_id)
        .await
        .map_err(|e| log_membership_error("join", game_id, &user_id, e))?;
    Ok(StatusCode::OK)
}

#[tracing::instrument(skip(state, caller, body), fields(caller_id = %caller.user_id))]
async fn leave_game(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(game_id): Path<u64>,
    body: String,
) -> Result<StatusCode, ApiError> {
    let user_id = parse_user_id(&body)?;
    state
        .game_service
        .leave_game(game_id, &user_id)
        .await
        .map_err(|e| log_membership_error("leave", game_id, &user_id, e))?;
    Ok(StatusCode::OK)
}

/// The body is the bare user id. A JSON string literal is accepted too.
fn parse_user_id(body: &str) -> Result<String, GameServiceError> {
    let trimmed = body.trim();
    let user_id = if trimmed.starts_with('"') {
        serde_json::from_str::<String>(trimmed).map_err(|_| {
            GameServiceError::InvalidRequest("User ID is not a valid string".to_string())
        })?
    } else {
        trimmed.to_string()
    };

    if user_id.is_empty() {
        return Err(GameServiceError::InvalidRequest(
            "User ID cannot be empty".to_string(),
        ));
    }
    Ok(user_id)
}

fn log_membership_error(
    action: &str,
    game_id: u64,
    user_id: &str,
    e: GameServiceError,
) -> ApiError {
    match &e {
        GameServiceError::DirectoryUnavailable(_) | GameServiceError::RepositoryError(_) => {
            error!("Failed to {} game {} for {}: {}", action, game_id, user_id, e)
        }
        _ => warn!("Rejected {} of game {} for {}: {}", action, game_id, user_id, e),
    }
    ApiError::from(e)
}
