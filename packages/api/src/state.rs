use std::sync::Arc;

use shared::services::game_service::GameService;

use crate::services::auth_service::AuthService;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub game_service: Arc<GameService>,
}
