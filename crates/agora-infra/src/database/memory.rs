//! In-memory store - used when no database is configured, and in tests.
//!
//! Implements every repository port over one shared state. Vote transactions
//! hold the state lock from `begin` until commit or drop, so they run one at a
//! time, and their writes are staged until commit.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use agora_core::domain::{NewPost, NewUser, Post, PostView, User, Vote, VoteValue};
use agora_core::error::RepoError;
use agora_core::ports::{
    BaseRepository, FeedQuery, PostRepository, UserRepository, VoteStore, VoteTransaction,
};

#[derive(Default)]
struct StoreState {
    users: BTreeMap<i32, User>,
    posts: BTreeMap<i32, Post>,
    votes: HashMap<(i32, i32), VoteValue>,
    next_user_id: i32,
    next_post_id: i32,
    last_timestamp: Option<DateTime<Utc>>,
}

impl StoreState {
    /// Strictly increasing clock at Postgres' microsecond precision, so
    /// creation order is always observable through a cursor.
    fn tick(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now().trunc_subsecs(6);
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + TimeDelta::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }

    fn view(&self, post: &Post, viewer: Option<i32>) -> Option<PostView> {
        let creator = self.users.get(&post.creator_id)?.clone();
        let vote_status = viewer.and_then(|user_id| self.votes.get(&(user_id, post.id)).copied());
        Some(PostView {
            post: post.clone(),
            creator,
            vote_status,
        })
    }
}

/// Shared in-memory store. Clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all stored votes on a post.
    pub async fn vote_total(&self, post_id: i32) -> i32 {
        let state = self.state.lock().await;
        state
            .votes
            .iter()
            .filter(|((_, post), _)| *post == post_id)
            .map(|(_, value)| value.as_i32())
            .sum()
    }

    pub async fn vote_count(&self) -> usize {
        self.state.lock().await.votes.len()
    }
}

#[async_trait]
impl BaseRepository<User, i32> for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepoError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn delete(&self, id: i32) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        state.users.remove(&id).ok_or(RepoError::NotFound)?;

        // Same cascade as the foreign keys: the user's posts, their votes,
        // and the user's own votes.
        let owned: Vec<i32> = state
            .posts
            .values()
            .filter(|p| p.creator_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in &owned {
            state.posts.remove(post_id);
        }

        let mut touched: HashMap<i32, i32> = HashMap::new();
        state.votes.retain(|(user_id, post_id), value| {
            let keep = *user_id != id && !owned.contains(post_id);
            if !keep && *user_id == id {
                *touched.entry(*post_id).or_default() += value.as_i32();
            }
            keep
        });
        // A deleted vote no longer counts towards the remaining posts.
        for (post_id, total) in touched {
            if let Some(post) = state.posts.get_mut(&post_id) {
                post.points -= total;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, RepoError> {
        Ok(self.state.lock().await.users.values().cloned().collect())
    }

    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        let mut state = self.state.lock().await;
        let taken = state
            .users
            .values()
            .any(|u| u.username == user.username || u.email == user.email);
        if taken {
            return Err(RepoError::Constraint("users_username_email_unique".into()));
        }

        state.next_user_id += 1;
        let now = state.tick();
        let user = User {
            id: state.next_user_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        let now = state.tick();
        let user = state.users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.password_hash = password_hash.to_string();
        user.updated_at = now;
        Ok(())
    }
}

#[async_trait]
impl BaseRepository<Post, i32> for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Post>, RepoError> {
        Ok(self.state.lock().await.posts.get(&id).cloned())
    }

    async fn delete(&self, id: i32) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        state.posts.remove(&id).ok_or(RepoError::NotFound)?;
        state.votes.retain(|(_, post_id), _| *post_id != id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&post.creator_id) {
            return Err(RepoError::MissingUser);
        }

        state.next_post_id += 1;
        let now = state.tick();
        let post = Post {
            id: state.next_post_id,
            title: post.title,
            text: post.text,
            points: 0,
            creator_id: post.creator_id,
            created_at: now,
            updated_at: now,
        };
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update_title(&self, id: i32, title: &str) -> Result<Option<Post>, RepoError> {
        let mut state = self.state.lock().await;
        let now = state.tick();
        Ok(state.posts.get_mut(&id).map(|post| {
            post.title = title.to_string();
            post.updated_at = now;
            post.clone()
        }))
    }

    async fn find_view(
        &self,
        id: i32,
        viewer: Option<i32>,
    ) -> Result<Option<PostView>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.posts.get(&id).and_then(|post| state.view(post, viewer)))
    }

    async fn feed(&self, query: FeedQuery) -> Result<Vec<PostView>, RepoError> {
        let state = self.state.lock().await;

        let mut posts: Vec<&Post> = state
            .posts
            .values()
            .filter(|p| {
                query
                    .cursor
                    .is_none_or(|cursor| cursor.comes_after(p.created_at, p.id))
            })
            .collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        Ok(posts
            .into_iter()
            .take(query.limit as usize)
            .filter_map(|post| state.view(post, query.viewer))
            .collect())
    }
}

#[async_trait]
impl VoteStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn VoteTransaction>, RepoError> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(InMemoryVoteTransaction {
            state: guard,
            votes: HashMap::new(),
            deltas: HashMap::new(),
        }))
    }
}

/// Holds the store lock for its lifetime; staged writes land on commit.
pub struct InMemoryVoteTransaction {
    state: OwnedMutexGuard<StoreState>,
    votes: HashMap<(i32, i32), VoteValue>,
    deltas: HashMap<i32, i32>,
}

#[async_trait]
impl VoteTransaction for InMemoryVoteTransaction {
    async fn current_vote(
        &mut self,
        user_id: i32,
        post_id: i32,
    ) -> Result<Option<VoteValue>, RepoError> {
        let key = (user_id, post_id);
        Ok(self
            .votes
            .get(&key)
            .or_else(|| self.state.votes.get(&key))
            .copied())
    }

    async fn insert_vote(&mut self, vote: Vote) -> Result<(), RepoError> {
        let key = (vote.user_id, vote.post_id);
        if !self.state.users.contains_key(&vote.user_id) {
            return Err(RepoError::MissingUser);
        }
        if !self.state.posts.contains_key(&vote.post_id) {
            return Err(RepoError::NotFound);
        }
        if self.votes.contains_key(&key) || self.state.votes.contains_key(&key) {
            return Err(RepoError::Conflict("vote already exists".into()));
        }
        self.votes.insert(key, vote.value);
        Ok(())
    }

    async fn update_vote(&mut self, vote: Vote) -> Result<(), RepoError> {
        let key = (vote.user_id, vote.post_id);
        if !self.votes.contains_key(&key) && !self.state.votes.contains_key(&key) {
            return Err(RepoError::NotFound);
        }
        self.votes.insert(key, vote.value);
        Ok(())
    }

    async fn adjust_points(&mut self, post_id: i32, delta: i32) -> Result<(), RepoError> {
        if !self.state.posts.contains_key(&post_id) {
            return Err(RepoError::NotFound);
        }
        *self.deltas.entry(post_id).or_default() += delta;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        let Self {
            mut state,
            votes,
            deltas,
        } = *self;

        state.votes.extend(votes);
        for (post_id, delta) in deltas {
            if let Some(post) = state.posts.get_mut(&post_id) {
                post.points += delta;
            }
        }
        Ok(())
    }
}
