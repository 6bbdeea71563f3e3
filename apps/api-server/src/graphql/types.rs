//! GraphQL object and input types.

use async_graphql::{Context, InputObject, Object, Result, SimpleObject};
use chrono::{DateTime, Utc};

use agora_core::domain::{Post, PostView, User};
use agora_core::error::{DomainError, FieldError};
use agora_core::services::PaginatedPosts;

use super::context::viewer;
use crate::middleware::error::gql_error;
use crate::state::AppState;

/// A user as clients see it. The email is blank unless it is the viewer's own.
pub struct UserObject(pub User);

#[Object(name = "User")]
impl UserObject {
    async fn id(&self) -> i32 {
        self.0.id
    }

    async fn username(&self) -> &str {
        &self.0.username
    }

    async fn email(&self) -> &str {
        &self.0.email
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.0.updated_at
    }
}

/// A post, optionally carrying its creator and the viewer's vote when it
/// came from a joined query.
pub struct PostObject {
    post: Post,
    creator: Option<User>,
    vote_status: Option<i32>,
}

impl From<PostView> for PostObject {
    fn from(view: PostView) -> Self {
        Self {
            post: view.post,
            creator: Some(view.creator),
            vote_status: view.vote_status.map(i32::from),
        }
    }
}

impl From<Post> for PostObject {
    fn from(post: Post) -> Self {
        Self {
            post,
            creator: None,
            vote_status: None,
        }
    }
}

#[Object(name = "Post")]
impl PostObject {
    async fn id(&self) -> i32 {
        self.post.id
    }

    async fn title(&self) -> &str {
        &self.post.title
    }

    async fn text(&self) -> &str {
        &self.post.text
    }

    /// The first 70 characters of the text.
    async fn text_snippet(&self) -> &str {
        self.post.text_snippet()
    }

    async fn points(&self) -> i32 {
        self.post.points
    }

    async fn creator_id(&self) -> i32 {
        self.post.creator_id
    }

    async fn creator(&self, ctx: &Context<'_>) -> Result<UserObject> {
        if let Some(creator) = &self.creator {
            return Ok(UserObject(creator.clone()));
        }

        let state = ctx.data::<AppState>()?;
        let id = self.post.creator_id;
        state
            .accounts
            .user(id, viewer(ctx))
            .await
            .map_err(gql_error)?
            .map(UserObject)
            .ok_or_else(|| {
                gql_error(DomainError::NotFound {
                    entity_type: "user",
                    id,
                })
            })
    }

    /// The viewer's own vote: 1, -1, or null.
    async fn vote_status(&self) -> Option<i32> {
        self.vote_status
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.post.created_at
    }

    async fn updated_at(&self) -> DateTime<Utc> {
        self.post.updated_at
    }
}

#[derive(SimpleObject)]
#[graphql(name = "PaginatedPosts")]
pub struct PaginatedPostsObject {
    pub posts: Vec<PostObject>,
    pub has_more: bool,
    /// Pass back as `cursor` to fetch the next page.
    pub next_cursor: Option<String>,
}

impl From<PaginatedPosts> for PaginatedPostsObject {
    fn from(page: PaginatedPosts) -> Self {
        Self {
            posts: page.posts.into_iter().map(PostObject::from).collect(),
            has_more: page.has_more,
            next_cursor: page.next_cursor.map(|c| c.to_string()),
        }
    }
}

#[derive(SimpleObject, Debug, Clone, PartialEq, Eq)]
#[graphql(name = "FieldError")]
pub struct FieldErrorObject {
    pub field: String,
    pub message: String,
}

impl From<FieldError> for FieldErrorObject {
    fn from(err: FieldError) -> Self {
        Self {
            field: err.field,
            message: err.message,
        }
    }
}

/// Either `errors` or `user` is set, never both.
#[derive(SimpleObject)]
pub struct UserResponse {
    pub errors: Option<Vec<FieldErrorObject>>,
    pub user: Option<UserObject>,
}

impl UserResponse {
    pub fn with_user(user: User) -> Self {
        Self {
            errors: None,
            user: Some(UserObject(user)),
        }
    }

    /// Input problems become field errors; anything else stays an error.
    pub fn from_error(err: DomainError) -> Result<Self> {
        let fields = match err {
            DomainError::Validation(fields) => fields,
            DomainError::Conflict(field) => vec![field],
            other => return Err(gql_error(other)),
        };

        Ok(Self {
            errors: Some(fields.into_iter().map(FieldErrorObject::from).collect()),
            user: None,
        })
    }
}

#[derive(InputObject)]
pub struct PostInput {
    pub title: String,
    pub text: String,
}

#[derive(InputObject)]
pub struct UsernamePasswordInput {
    pub username: String,
    pub email: String,
    pub password: String,
}
