use lambda_http::{run, tracing, Error};
use std::env::set_var;
use std::sync::Arc;

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

use config::AppConfig;
use services::auth_service::AuthService;
use shared::repositories::game_repository::DynamoDbGameRepository;
use shared::repositories::identity_directory::KeycloakIdentityDirectory;
use shared::services::game_service::GameService;

#[tokio::main]
async fn main() -> Result<(), Error> {
    set_var("AWS_LAMBDA_HTTP_IGNORE_STAGE_IN_PATH", "true");

    // required to enable CloudWatch error logging by the runtime
    tracing::init_default_subscriber();

    let config = AppConfig::from_env()?;

    let aws_config = aws_config::load_from_env().await;
    let dynamo_client = aws_sdk_dynamodb::Client::new(&aws_config);

    let game_repository = Arc::new(DynamoDbGameRepository::new(
        dynamo_client,
        config.games_table.clone(),
        config.game_id_counter_table.clone(),
    ));
    let directory = Arc::new(KeycloakIdentityDirectory::new(
        reqwest::Client::new(),
        config.keycloak.clone(),
    ));
    let game_service = Arc::new(GameService::new(game_repository, directory));
    let auth_service = Arc::new(AuthService::from_config(&config.jwt)?);

    tracing::info!(realm = %config.keycloak.realm, "Game lobby API starting");

    let app_state = state::AppState {
        auth_service,
        game_service,
    };

    run(routes::app(app_state)).await
}
