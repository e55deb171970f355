use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::directory::UserRecord;
use crate::repositories::errors::identity_directory_errors::IdentityDirectoryError;
use crate::repositories::identity_directory::IdentityDirectory;

/// Directory backed by a map. Every call yields to the scheduler first so
/// concurrent callers interleave the way they would against a remote service.
#[derive(Default)]
pub struct InMemoryIdentityDirectory {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl InMemoryIdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: UserRecord) -> Self {
        self.users.get_mut().insert(user.id.clone(), user);
        self
    }

    pub async fn user(&self, user_id: &str) -> Option<UserRecord> {
        self.users.lock().await.get(user_id).cloned()
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
    async fn get_user(&self, user_id: &str) -> Result<UserRecord, IdentityDirectoryError> {
        tokio::task::yield_now().await;
        self.users
            .lock()
            .await
            .get(user_id)
            .cloned()
            .ok_or(IdentityDirectoryError::UserNotFound)
    }

    async fn update_user(
        &self,
        user_id: &str,
        user: &UserRecord,
    ) -> Result<(), IdentityDirectoryError> {
        tokio::task::yield_now().await;
        let mut users = self.users.lock().await;
        match users.get_mut(user_id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(IdentityDirectoryError::UserNotFound),
        }
    }

    async fn search_users_by_attribute(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Vec<UserRecord>, IdentityDirectoryError> {
        tokio::task::yield_now().await;
        Ok(self
            .users
            .lock()
            .await
            .values()
            .filter(|user| {
                user.attributes
                    .get(key)
                    .map_or(false, |values| values.iter().any(|v| v == value))
            })
            .cloned()
            .collect())
    }
}
