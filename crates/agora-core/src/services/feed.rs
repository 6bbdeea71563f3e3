use std::sync::Arc;

use crate::domain::{Cursor, PostView, redact};
use crate::error::DomainError;
use crate::ports::{FeedQuery, PostRepository};

/// Largest page a client may request.
pub const MAX_FEED_LIMIT: i32 = 50;

/// One page of the feed.
#[derive(Debug, Clone)]
pub struct PaginatedPosts {
    pub posts: Vec<PostView>,
    pub has_more: bool,
    /// Cursor of the last post on this page, to request the next one.
    pub next_cursor: Option<Cursor>,
}

/// Newest-first keyset pagination over posts.
pub struct FeedPaginator {
    posts: Arc<dyn PostRepository>,
}

impl FeedPaginator {
    pub fn new(posts: Arc<dyn PostRepository>) -> Self {
        Self { posts }
    }

    pub async fn list_posts(
        &self,
        limit: i32,
        cursor: Option<&str>,
        viewer: Option<i32>,
    ) -> Result<PaginatedPosts, DomainError> {
        if limit < 1 {
            return Err(DomainError::field("limit", "limit must be positive"));
        }
        let limit = limit.min(MAX_FEED_LIMIT) as usize;
        let cursor = Cursor::parse_opt(cursor)?;

        // One extra row tells us whether another page exists.
        let mut rows = self
            .posts
            .feed(FeedQuery {
                cursor,
                limit: limit as u64 + 1,
                viewer,
            })
            .await?;

        let has_more = rows.len() > limit;
        rows.truncate(limit);

        let next_cursor = rows
            .last()
            .map(|view| Cursor::new(view.post.created_at, view.post.id));
        let posts = rows.into_iter().map(|view| redact(view, viewer)).collect();

        Ok(PaginatedPosts {
            posts,
            has_more,
            next_cursor,
        })
    }
}
