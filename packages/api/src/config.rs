use shared::repositories::identity_directory::KeycloakConfig;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(name) => {
                write!(f, "{} environment variable must be set", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// How bearer tokens are verified. Keycloak realms sign with RS256; the
/// shared secret is meant for local runs and tests.
#[derive(Debug, Clone)]
pub enum JwtVerification {
    RsaPublicKey(String),
    Secret(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub games_table: String,
    pub game_id_counter_table: String,
    pub keycloak: KeycloakConfig,
    pub jwt: JwtVerification,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let jwt = match (lookup("JWT_PUBLIC_KEY"), lookup("JWT_SECRET")) {
            (Some(pem), _) if !pem.is_empty() => JwtVerification::RsaPublicKey(pem),
            (_, Some(secret)) if !secret.is_empty() => JwtVerification::Secret(secret),
            _ => return Err(ConfigError::Missing("JWT_PUBLIC_KEY")),
        };

        Ok(AppConfig {
            games_table: required("GAMES_TABLE")?,
            game_id_counter_table: required("GAME_ID_COUNTER_TABLE")?,
            keycloak: KeycloakConfig {
                base_url: required("KEYCLOAK_URL")?,
                realm: required("KEYCLOAK_REALM")?,
                client_id: required("KEYCLOAK_CLIENT_ID")?,
                client_secret: required("KEYCLOAK_CLIENT_SECRET")?,
            },
            jwt,
        })
    }
}
