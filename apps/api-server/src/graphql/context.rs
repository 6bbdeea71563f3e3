//! Per-request GraphQL context.

use std::sync::Arc;

use async_graphql::Context;
use tokio::sync::Mutex;

/// What the handler must do with the session cookie once the request is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieChange {
    /// Send a cookie for this new session id.
    Set(String),
    Clear,
}

/// The caller's identity plus any cookie change a mutation asked for.
#[derive(Debug, Default)]
pub struct RequestContext {
    pub viewer: Option<i32>,
    pub session_id: Option<String>,
    cookie: Mutex<Option<CookieChange>>,
}

impl RequestContext {
    pub fn new(viewer: Option<i32>, session_id: Option<String>) -> Self {
        Self {
            viewer,
            session_id,
            cookie: Mutex::new(None),
        }
    }

    /// The last change wins.
    pub async fn set_cookie(&self, change: CookieChange) {
        *self.cookie.lock().await = Some(change);
    }

    pub async fn take_cookie(&self) -> Option<CookieChange> {
        self.cookie.lock().await.take()
    }
}

/// Attached to each request as `Arc<RequestContext>` so the handler keeps a
/// handle after execution.
pub fn request_context<'a>(ctx: &Context<'a>) -> Option<&'a Arc<RequestContext>> {
    ctx.data_opt::<Arc<RequestContext>>()
}

/// The viewer of the current request, `None` when anonymous or when the
/// schema runs without a request context.
pub fn viewer(ctx: &Context<'_>) -> Option<i32> {
    request_context(ctx).and_then(|rc| rc.viewer)
}
