//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod cache;
mod mailer;
mod repository;

pub use auth::{AuthError, PasswordService, ResetTokenStore, SessionStore};
pub use cache::{Cache, CacheError};
pub use mailer::{MailError, Mailer};
pub use repository::{
    BaseRepository, FeedQuery, PostRepository, UserRepository, VoteStore, VoteTransaction,
};
