use std::sync::Arc;

use crate::domain::{NewPost, Post, PostView, redact};
use crate::error::{DomainError, RepoError};
use crate::ports::PostRepository;

/// Post lookups and author-only edits.
pub struct PostService {
    posts: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>) -> Self {
        Self { posts }
    }

    pub async fn get_post(
        &self,
        id: i32,
        viewer: Option<i32>,
    ) -> Result<Option<PostView>, DomainError> {
        let view = self.posts.find_view(id, viewer).await?;
        Ok(view.map(|view| redact(view, viewer)))
    }

    pub async fn create_post(
        &self,
        viewer: Option<i32>,
        title: String,
        text: String,
    ) -> Result<Post, DomainError> {
        let creator_id = viewer.ok_or(DomainError::Unauthenticated)?;
        let input = NewPost {
            title,
            text,
            creator_id,
        };

        let errors = input.validate();
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let post = self.posts.create(input).await?;
        tracing::info!(post_id = post.id, creator_id, "Post created");
        Ok(post)
    }

    /// `Ok(None)` when the post does not exist.
    pub async fn update_post(
        &self,
        viewer: Option<i32>,
        id: i32,
        title: &str,
    ) -> Result<Option<Post>, DomainError> {
        let user_id = viewer.ok_or(DomainError::Unauthenticated)?;
        if title.trim().is_empty() {
            return Err(DomainError::field("title", "title cannot be empty"));
        }

        match self.posts.find_by_id(id).await? {
            None => Ok(None),
            Some(post) if post.creator_id != user_id => Err(DomainError::Forbidden),
            Some(_) => Ok(self.posts.update_title(id, title).await?),
        }
    }

    /// `Ok(false)` when there was nothing to delete.
    pub async fn delete_post(&self, viewer: Option<i32>, id: i32) -> Result<bool, DomainError> {
        let user_id = viewer.ok_or(DomainError::Unauthenticated)?;

        match self.posts.find_by_id(id).await? {
            None => Ok(false),
            Some(post) if post.creator_id != user_id => Err(DomainError::Forbidden),
            Some(_) => match self.posts.delete(id).await {
                Ok(()) => {
                    tracing::info!(post_id = id, "Post deleted");
                    Ok(true)
                }
                Err(RepoError::NotFound) => Ok(false),
                Err(err) => Err(err.into()),
            },
        }
    }
}
