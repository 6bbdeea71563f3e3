//! GraphQL schema.

mod context;
mod post;
mod types;
mod user;

use async_graphql::{EmptySubscription, MergedObject, Schema};

pub use context::{CookieChange, RequestContext};

use crate::state::AppState;

/// Reject queries nested deeper than this.
pub const MAX_QUERY_DEPTH: usize = 10;
pub const MAX_QUERY_COMPLEXITY: usize = 200;

#[derive(MergedObject, Default)]
pub struct QueryRoot(post::PostQuery, user::UserQuery);

#[derive(MergedObject, Default)]
pub struct MutationRoot(post::PostMutation, user::UserMutation);

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(state: AppState) -> AppSchema {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .data(state)
    .limit_depth(MAX_QUERY_DEPTH)
    .limit_complexity(MAX_QUERY_COMPLEXITY)
    .finish()
}
