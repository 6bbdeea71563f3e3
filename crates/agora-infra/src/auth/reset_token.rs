//! Password reset tokens stored in the cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use agora_core::ports::{AuthError, Cache, ResetTokenStore};

pub const RESET_TOKEN_PREFIX: &str = "forget-password:";

/// Tokens stay valid for two days.
pub const RESET_TOKEN_TTL: Duration = Duration::from_secs(2 * 24 * 60 * 60);

pub struct CacheResetTokenStore {
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl CacheResetTokenStore {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            cache,
            ttl: RESET_TOKEN_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn key(token: &str) -> String {
        format!("{RESET_TOKEN_PREFIX}{token}")
    }
}

#[async_trait]
impl ResetTokenStore for CacheResetTokenStore {
    async fn issue(&self, user_id: i32) -> Result<String, AuthError> {
        let token = Uuid::new_v4().to_string();

        self.cache
            .set(&Self::key(&token), &user_id.to_string(), Some(self.ttl))
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(token)
    }

    async fn lookup(&self, token: &str) -> Option<i32> {
        if token.is_empty() {
            return None;
        }
        self.cache.get(&Self::key(token)).await?.parse().ok()
    }

    async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        self.cache
            .delete(&Self::key(token))
            .await
            .map_err(|e| AuthError::Store(e.to_string()))
    }
}
