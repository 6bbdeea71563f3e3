//! Authentication implementations: password hashing, sessions and reset
//! tokens kept in the cache.

mod password;
mod reset_token;
mod session;

pub use password::Argon2PasswordService;
pub use reset_token::{CacheResetTokenStore, RESET_TOKEN_PREFIX, RESET_TOKEN_TTL};
pub use session::{CacheSessionStore, SESSION_PREFIX};
