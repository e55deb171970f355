use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::services::auth_service::USER_ROLE;
use crate::services::errors::auth_service_errors::AuthServiceError;
use crate::{error::ApiError, state::AppState};

/// Identity of the caller, attached to the request once authorization passed.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

/// Runs before every lobby handler: verifies the bearer token and requires
/// the `user` realm role. Handlers read the result through
/// `Extension<AuthenticatedUser>`.
pub async fn require_user_role(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    let claims = state.auth_service.authorize(token, USER_ROLE)?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.sub,
    });
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthServiceError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthServiceError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthServiceError::InvalidToken)?;

    header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or(AuthServiceError::MissingCredentials)
}
