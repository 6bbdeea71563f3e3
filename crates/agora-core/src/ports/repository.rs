use async_trait::async_trait;

use crate::domain::{Cursor, NewPost, NewUser, Post, PostView, User, Vote, VoteValue};
use crate::error::RepoError;

/// Generic repository trait for lookups and removal by primary key.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Delete an entity by its ID. Returns `RepoError::NotFound` if absent.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, i32> {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn list(&self) -> Result<Vec<User>, RepoError>;

    /// Insert a user. A taken username or email is `RepoError::Constraint`.
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), RepoError>;
}

/// Parameters of one feed page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedQuery {
    /// Only posts listed after this position.
    pub cursor: Option<Cursor>,
    /// Maximum number of rows to return.
    pub limit: u64,
    /// Whose vote to attach as `vote_status`.
    pub viewer: Option<i32>,
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, i32> {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError>;

    async fn update_title(&self, id: i32, title: &str) -> Result<Option<Post>, RepoError>;

    /// A single post joined with its creator and the viewer's vote.
    async fn find_view(&self, id: i32, viewer: Option<i32>)
    -> Result<Option<PostView>, RepoError>;

    /// Posts ordered by `created_at` then `id`, both descending, at most
    /// `query.limit` rows.
    async fn feed(&self, query: FeedQuery) -> Result<Vec<PostView>, RepoError>;
}

/// Source of vote transactions.
#[async_trait]
pub trait VoteStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn VoteTransaction>, RepoError>;
}

/// A unit of work over the `votes` table and post scores.
///
/// Nothing is visible to other readers until [`VoteTransaction::commit`];
/// dropping the transaction discards every staged write.
#[async_trait]
pub trait VoteTransaction: Send {
    /// Read the current vote, locking the row against concurrent writers.
    async fn current_vote(
        &mut self,
        user_id: i32,
        post_id: i32,
    ) -> Result<Option<VoteValue>, RepoError>;

    /// Fails with `RepoError::NotFound` if the post does not exist, and with
    /// `RepoError::MissingUser` if the voter does not.
    async fn insert_vote(&mut self, vote: Vote) -> Result<(), RepoError>;

    async fn update_vote(&mut self, vote: Vote) -> Result<(), RepoError>;

    /// Add `delta` to the post's points. `RepoError::NotFound` if no such post.
    async fn adjust_points(&mut self, post_id: i32, delta: i32) -> Result<(), RepoError>;

    async fn commit(self: Box<Self>) -> Result<(), RepoError>;
}
