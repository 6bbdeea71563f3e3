//! Cookie sessions stored in the cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use agora_core::ports::{AuthError, Cache, SessionStore};

/// Key prefix for session entries.
pub const SESSION_PREFIX: &str = "sess:";

/// Sessions as `sess:<uuid> -> user id` entries with a fixed TTL.
pub struct CacheSessionStore {
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl CacheSessionStore {
    pub fn new(cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    fn key(session_id: &str) -> String {
        format!("{SESSION_PREFIX}{session_id}")
    }
}

#[async_trait]
impl SessionStore for CacheSessionStore {
    async fn create(&self, user_id: i32) -> Result<String, AuthError> {
        let session_id = Uuid::new_v4().simple().to_string();

        self.cache
            .set(
                &Self::key(&session_id),
                &user_id.to_string(),
                Some(self.ttl),
            )
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        tracing::debug!(user_id, "Session created");
        Ok(session_id)
    }

    async fn resolve(&self, session_id: &str) -> Option<i32> {
        if session_id.is_empty() {
            return None;
        }

        let raw = self.cache.get(&Self::key(session_id)).await?;
        match raw.parse() {
            Ok(user_id) => Some(user_id),
            Err(_) => {
                tracing::warn!("Ignoring session entry with a non-numeric user id");
                None
            }
        }
    }

    async fn destroy(&self, session_id: &str) -> Result<(), AuthError> {
        self.cache
            .delete(&Self::key(session_id))
            .await
            .map_err(|e| AuthError::Store(e.to_string()))
    }
}
