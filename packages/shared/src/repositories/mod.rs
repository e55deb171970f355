pub mod errors;
pub mod game_repository;
pub mod identity_directory;
