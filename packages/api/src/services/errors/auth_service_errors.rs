use std::fmt;

#[derive(Debug)]
pub enum AuthServiceError {
    MissingCredentials,
    InvalidToken,
    ExpiredToken,
    MissingRole(String),
    KeyError(String),
}

impl fmt::Display for AuthServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthServiceError::MissingCredentials => write!(f, "Missing bearer token"),
            AuthServiceError::InvalidToken => write!(f, "Invalid JWT token"),
            AuthServiceError::ExpiredToken => write!(f, "JWT token has expired"),
            AuthServiceError::MissingRole(role) => write!(f, "Missing required role: {}", role),
            AuthServiceError::KeyError(msg) => write!(f, "Invalid verification key: {}", msg),
        }
    }
}

impl std::error::Error for AuthServiceError {}
