//! # Agora Infrastructure
//!
//! Concrete implementations of the ports defined in `agora-core`:
//! storage, cache, sessions, password hashing and mail.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services: in-memory store and cache, log mailer
//! - `postgres` - PostgreSQL repositories and vote store via SeaORM
//! - `redis` - Redis-backed cache for sessions and reset tokens
//! - `mail` - SMTP delivery via lettre

pub mod auth;
pub mod cache;
pub mod database;
pub mod mail;

// Re-exports - always available
pub use auth::{Argon2PasswordService, CacheResetTokenStore, CacheSessionStore};
pub use cache::InMemoryCache;
pub use database::{DatabaseConfig, InMemoryStore};
pub use mail::LogMailer;

#[cfg(feature = "postgres")]
pub use database::{
    PostgresPostRepository, PostgresUserRepository, PostgresVoteStore, connect,
};

#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};

#[cfg(feature = "mail")]
pub use mail::{SmtpConfig, SmtpMailer};
