//! Post queries and mutations, including voting.

use async_graphql::{Context, Object, Result};

use super::context::viewer;
use super::types::{PaginatedPostsObject, PostInput, PostObject};
use crate::middleware::error::gql_error;
use crate::state::AppState;

#[derive(Default)]
pub struct PostQuery;

#[Object]
impl PostQuery {
    /// Newest posts first. Pass the previous page's `nextCursor` to continue.
    async fn posts(
        &self,
        ctx: &Context<'_>,
        limit: i32,
        cursor: Option<String>,
    ) -> Result<PaginatedPostsObject> {
        let state = ctx.data::<AppState>()?;
        let page = state
            .feed
            .list_posts(limit, cursor.as_deref(), viewer(ctx))
            .await
            .map_err(gql_error)?;

        Ok(page.into())
    }

    async fn post(&self, ctx: &Context<'_>, id: i32) -> Result<Option<PostObject>> {
        let state = ctx.data::<AppState>()?;
        let view = state
            .posts
            .get_post(id, viewer(ctx))
            .await
            .map_err(gql_error)?;

        Ok(view.map(PostObject::from))
    }
}

#[derive(Default)]
pub struct PostMutation;

#[Object]
impl PostMutation {
    /// Up- or downvote a post (`value` is 1 or -1). Voting the same way twice
    /// changes nothing; voting the other way flips the vote.
    async fn vote(&self, ctx: &Context<'_>, post_id: i32, value: i32) -> Result<bool> {
        let state = ctx.data::<AppState>()?;
        state
            .ledger
            .cast_vote(viewer(ctx), post_id, value)
            .await
            .map_err(gql_error)?;

        Ok(true)
    }

    async fn create_post(&self, ctx: &Context<'_>, input: PostInput) -> Result<PostObject> {
        let state = ctx.data::<AppState>()?;
        let post = state
            .posts
            .create_post(viewer(ctx), input.title, input.text)
            .await
            .map_err(gql_error)?;

        Ok(post.into())
    }

    async fn update_post(
        &self,
        ctx: &Context<'_>,
        id: i32,
        title: String,
    ) -> Result<Option<PostObject>> {
        let state = ctx.data::<AppState>()?;
        let post = state
            .posts
            .update_post(viewer(ctx), id, &title)
            .await
            .map_err(gql_error)?;

        Ok(post.map(PostObject::from))
    }

    async fn delete_post(&self, ctx: &Context<'_>, id: i32) -> Result<bool> {
        let state = ctx.data::<AppState>()?;
        state
            .posts
            .delete_post(viewer(ctx), id)
            .await
            .map_err(gql_error)
    }
}
