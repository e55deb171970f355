pub mod game_repository_errors;
pub mod identity_directory_errors;
