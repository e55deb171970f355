//! In-memory stand-ins for the games table and the identity directory.

mod in_memory_directory;
mod in_memory_game_repository;

pub use in_memory_directory::InMemoryIdentityDirectory;
pub use in_memory_game_repository::InMemoryGameRepository;
