pub mod directory;
pub mod game;
pub mod responses;
