pub mod errors;
pub mod game_service;
pub mod membership_locks;
