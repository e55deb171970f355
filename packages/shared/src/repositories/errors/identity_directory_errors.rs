#[derive(Debug)]
pub enum IdentityDirectoryError {
    UserNotFound,
    Unavailable(String),
    Serialization(String),
}

impl std::fmt::Display for IdentityDirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityDirectoryError::UserNotFound => write!(f, "User not found in directory"),
            IdentityDirectoryError::Unavailable(msg) => {
                write!(f, "Identity directory unavailable: {}", msg)
            }
            IdentityDirectoryError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for IdentityDirectoryError {}

impl From<reqwest::Error> for IdentityDirectoryError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            IdentityDirectoryError::Serialization(error.to_string())
        } else {
            IdentityDirectoryError::Unavailable(error.to_string())
        }
    }
}
