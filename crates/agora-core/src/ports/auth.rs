//! Authentication ports: password hashing, sessions and reset tokens.

use async_trait::async_trait;

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Server-side sessions keyed by an opaque id carried in a cookie.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Start a session for `user_id` and return its id.
    async fn create(&self, user_id: i32) -> Result<String, AuthError>;

    /// The user bound to a session, if it is still alive.
    async fn resolve(&self, session_id: &str) -> Option<i32>;

    async fn destroy(&self, session_id: &str) -> Result<(), AuthError>;
}

/// Single-use password reset tokens.
#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    /// Issue a token that resolves to `user_id` until it expires.
    async fn issue(&self, user_id: i32) -> Result<String, AuthError>;

    async fn lookup(&self, token: &str) -> Option<i32>;

    async fn revoke(&self, token: &str) -> Result<(), AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Hashing error: {0}")]
    HashingError(String),

    #[error("Session store error: {0}")]
    Store(String),
}
