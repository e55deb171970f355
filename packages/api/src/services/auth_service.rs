use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtVerification;
use crate::services::errors::auth_service_errors::AuthServiceError;

/// Realm role every lobby endpoint requires.
pub const USER_ROLE: &str = "user";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Claims read from an access token issued by the realm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub iat: Option<usize>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub realm_access: RealmAccess,
}

impl TokenClaims {
    pub fn has_role(&self, role: &str) -> bool {
        self.realm_access.roles.iter().any(|r| r == role)
    }
}

pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthService {
    pub fn from_config(verification: &JwtVerification) -> Result<Self, AuthServiceError> {
        match verification {
            JwtVerification::RsaPublicKey(pem) => Self::with_rsa_public_key(pem),
            JwtVerification::Secret(secret) => Ok(Self::with_jwt_secret(secret)),
        }
    }

    pub fn with_jwt_secret(secret: &str) -> Self {
        AuthService {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: validation(Algorithm::HS256),
        }
    }

    pub fn with_rsa_public_key(pem: &str) -> Result<Self, AuthServiceError> {
        let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| AuthServiceError::KeyError(e.to_string()))?;
        Ok(AuthService {
            decoding_key,
            validation: validation(Algorithm::RS256),
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthServiceError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthServiceError::ExpiredToken,
                _ => AuthServiceError::InvalidToken,
            })
    }

    /// Verifies the token and checks it grants `role`.
    pub fn authorize(&self, token: &str, role: &str) -> Result<TokenClaims, AuthServiceError> {
        let claims = self.verify_token(token)?;
        if !claims.has_role(role) {
            return Err(AuthServiceError::MissingRole(role.to_string()));
        }
        Ok(claims)
    }
}

fn validation(algorithm: Algorithm) -> Validation {
    let mut validation = Validation::new(algorithm);
    // Keycloak puts the client list in `aud`, which varies per deployment.
    validation.validate_aud = false;
    validation
}
