//! Account queries and mutations. Successful register, login and password
//! change start a session; logout and account deletion end it.

use async_graphql::{Context, Object, Result};

use agora_core::domain::{Registration, User};
use agora_core::error::DomainError;

use super::context::{CookieChange, request_context, viewer};
use super::types::{UserObject, UserResponse, UsernamePasswordInput};
use crate::middleware::error::gql_error;
use crate::state::AppState;

/// Log `user` in on this request, replacing any session it already had.
async fn start_session(ctx: &Context<'_>, user: &User) -> Result<()> {
    let state = ctx.data::<AppState>()?;

    if let Some(old) = request_context(ctx).and_then(|rc| rc.session_id.as_deref()) {
        if let Err(e) = state.sessions.destroy(old).await {
            tracing::warn!(error = %e, "Failed to drop replaced session");
        }
    }

    let session_id = state
        .sessions
        .create(user.id)
        .await
        .map_err(|e| gql_error(DomainError::Internal(e.to_string())))?;

    if let Some(rc) = request_context(ctx) {
        rc.set_cookie(CookieChange::Set(session_id)).await;
    }
    Ok(())
}

/// Destroy the current session, if any, and clear the cookie. `false` if the
/// store failed to forget it.
async fn end_session(ctx: &Context<'_>) -> Result<bool> {
    let state = ctx.data::<AppState>()?;
    let Some(rc) = request_context(ctx) else {
        return Ok(true);
    };

    let mut ended = true;
    if let Some(session_id) = rc.session_id.as_deref() {
        if let Err(e) = state.sessions.destroy(session_id).await {
            tracing::error!(error = %e, "Failed to destroy session");
            ended = false;
        }
    }
    rc.set_cookie(CookieChange::Clear).await;
    Ok(ended)
}

async fn respond(ctx: &Context<'_>, result: Result<User, DomainError>) -> Result<UserResponse> {
    match result {
        Ok(user) => {
            start_session(ctx, &user).await?;
            Ok(UserResponse::with_user(user))
        }
        Err(err) => UserResponse::from_error(err),
    }
}

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// The logged-in user, or null.
    async fn me(&self, ctx: &Context<'_>) -> Result<Option<UserObject>> {
        let state = ctx.data::<AppState>()?;
        let user = state.accounts.me(viewer(ctx)).await.map_err(gql_error)?;
        Ok(user.map(UserObject))
    }

    async fn users(&self, ctx: &Context<'_>) -> Result<Vec<UserObject>> {
        let state = ctx.data::<AppState>()?;
        let users = state.accounts.users(viewer(ctx)).await.map_err(gql_error)?;
        Ok(users.into_iter().map(UserObject).collect())
    }

    async fn user(&self, ctx: &Context<'_>, id: i32) -> Result<Option<UserObject>> {
        let state = ctx.data::<AppState>()?;
        let user = state
            .accounts
            .user(id, viewer(ctx))
            .await
            .map_err(gql_error)?;
        Ok(user.map(UserObject))
    }
}

#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    async fn register(
        &self,
        ctx: &Context<'_>,
        options: UsernamePasswordInput,
    ) -> Result<UserResponse> {
        let state = ctx.data::<AppState>()?;
        let result = state
            .accounts
            .register(Registration {
                username: options.username,
                email: options.email,
                password: options.password,
            })
            .await;

        respond(ctx, result).await
    }

    async fn login(
        &self,
        ctx: &Context<'_>,
        username_or_email: String,
        password: String,
    ) -> Result<UserResponse> {
        let state = ctx.data::<AppState>()?;
        let result = state.accounts.login(&username_or_email, &password).await;

        respond(ctx, result).await
    }

    async fn logout(&self, ctx: &Context<'_>) -> Result<bool> {
        end_session(ctx).await
    }

    /// Email a reset link. `false` for an unknown address or a failed send.
    async fn forgot_password(&self, ctx: &Context<'_>, email: String) -> Result<bool> {
        let state = ctx.data::<AppState>()?;
        state
            .accounts
            .forgot_password(&email)
            .await
            .map_err(gql_error)
    }

    async fn change_password(
        &self,
        ctx: &Context<'_>,
        token: String,
        new_password: String,
    ) -> Result<UserResponse> {
        let state = ctx.data::<AppState>()?;
        let result = state.accounts.change_password(&token, &new_password).await;

        respond(ctx, result).await
    }

    /// Delete your own account, with its posts and votes.
    async fn delete_user(&self, ctx: &Context<'_>, id: i32) -> Result<bool> {
        let state = ctx.data::<AppState>()?;
        let deleted = state
            .accounts
            .delete_user(viewer(ctx), id)
            .await
            .map_err(gql_error)?;

        if deleted {
            end_session(ctx).await?;
        }
        Ok(deleted)
    }
}
