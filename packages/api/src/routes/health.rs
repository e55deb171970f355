use axum::http::StatusCode;

/// Liveness probe; needs no token.
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "Healthy!")
}
