use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::directory::UserRecord;
use crate::repositories::errors::identity_directory_errors::IdentityDirectoryError;

#[cfg(test)]
use mockall::automock;

/// Admin tokens are refreshed this long before Keycloak says they expire.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 30;

/// Per-user attribute store of the identity provider, scoped to one realm.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<UserRecord, IdentityDirectoryError>;
    /// Replaces the stored user with `user`, attributes included.
    async fn update_user(
        &self,
        user_id: &str,
        user: &UserRecord,
    ) -> Result<(), IdentityDirectoryError>;
    async fn search_users_by_attribute(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Vec<UserRecord>, IdentityDirectoryError>;
}

#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    pub base_url: String,
    pub realm: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    access_token: String,
    refresh_at: DateTime<Utc>,
}

/// Keycloak admin REST client authenticated as a service account through
/// the client-credentials grant.
pub struct KeycloakIdentityDirectory {
    client: Client,
    config: KeycloakConfig,
    token: RwLock<Option<CachedToken>>,
}

impl KeycloakIdentityDirectory {
    pub fn new(client: Client, config: KeycloakConfig) -> Self {
        Self {
            client,
            config,
            token: RwLock::new(None),
        }
    }

    fn realm_url(&self, prefix: &[&str], rest: &[&str]) -> Result<Url, IdentityDirectoryError> {
        let mut url = Url::parse(&self.config.base_url).map_err(|e| {
            IdentityDirectoryError::Unavailable(format!("Invalid Keycloak URL: {}", e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                IdentityDirectoryError::Unavailable("Keycloak URL cannot be a base".to_string())
            })?
            .pop_if_empty()
            .extend(prefix)
            .push(&self.config.realm)
            .extend(rest);
        Ok(url)
    }

    fn users_url(&self, user_id: Option<&str>) -> Result<Url, IdentityDirectoryError> {
        match user_id {
            Some(id) => self.realm_url(&["admin", "realms"], &["users", id]),
            None => self.realm_url(&["admin", "realms"], &["users"]),
        }
    }

    async fn access_token(&self) -> Result<String, IdentityDirectoryError> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.refresh_at > Utc::now() {
                return Ok(token.access_token.clone());
            }
        }

        let mut cached = self.token.write().await;
        if let Some(token) = cached.as_ref() {
            if token.refresh_at > Utc::now() {
                return Ok(token.access_token.clone());
            }
        }

        let url = self.realm_url(&["realms"], &["protocol", "openid-connect", "token"])?;
        let response = self
            .client
            .post(url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IdentityDirectoryError::Unavailable(format!(
                "Token request rejected with status {}",
                response.status()
            )));
        }

        let token: TokenResponse = response.json().await?;
        debug!(
            realm = %self.config.realm,
            expires_in = token.expires_in,
            "Obtained Keycloak admin token"
        );

        let refresh_at = refresh_deadline(Utc::now(), token.expires_in)?;
        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            refresh_at,
        });
        Ok(access_token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, IdentityDirectoryError> {
        let token = self.access_token().await?;
        let response = request.bearer_auth(token).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(IdentityDirectoryError::UserNotFound),
            status if status.is_success() => Ok(response),
            status => Err(IdentityDirectoryError::Unavailable(format!(
                "Keycloak returned status {}",
                status
            ))),
        }
    }
}

/// When a token valid for `expires_in` seconds from `now` must be replaced.
fn refresh_deadline(
    now: DateTime<Utc>,
    expires_in: i64,
) -> Result<DateTime<Utc>, IdentityDirectoryError> {
    let lifetime = expires_in.saturating_sub(TOKEN_REFRESH_MARGIN_SECS).max(0);
    Duration::try_seconds(lifetime)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            IdentityDirectoryError::Serialization(format!(
                "Token lifetime out of range: {}",
                expires_in
            ))
        })
}

#[async_trait]
impl IdentityDirectory for KeycloakIdentityDirectory {
    async fn get_user(&self, user_id: &str) -> Result<UserRecord, IdentityDirectoryError> {
        let url = self.users_url(Some(user_id))?;
        let response = self.send(self.client.get(url)).await?;
        Ok(response.json().await?)
    }

    async fn update_user(
        &self,
        user_id: &str,
        user: &UserRecord,
    ) -> Result<(), IdentityDirectoryError> {
        let url = self.users_url(Some(user_id))?;
        self.send(self.client.put(url).json(user)).await?;
        Ok(())
    }

    async fn search_users_by_attribute(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Vec<UserRecord>, IdentityDirectoryError> {
        let url = self.users_url(None)?;
        let query = format!("{}:{}", key, value);
        let response = self
            .send(self.client.get(url).query(&[("q", query.as_str()), ("exact", "true")]))
            .await?;
        Ok(response.json().await?)
    }
}
