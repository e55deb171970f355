pub mod models;
pub mod repositories;
pub mod services;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
