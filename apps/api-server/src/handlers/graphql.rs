//! GraphQL endpoint.

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use async_graphql::http::GraphiQLSource;

use crate::graphql::{AppSchema, CookieChange, RequestContext};
use crate::middleware::session::{OptionalSession, removal_cookie, session_cookie};
use crate::state::AppState;

/// POST /graphql
///
/// Runs the request with the caller's session, then applies any cookie change
/// a mutation asked for.
pub async fn graphql(
    state: web::Data<AppState>,
    schema: web::Data<AppSchema>,
    session: OptionalSession,
    body: web::Json<async_graphql::Request>,
) -> HttpResponse {
    let rc = Arc::new(RequestContext::new(session.user_id, session.session_id));
    let request = body.into_inner().data(rc.clone());

    let response = schema.execute(request).await;
    if response.is_err() {
        tracing::debug!(errors = response.errors.len(), "GraphQL request returned errors");
    }

    let mut reply = HttpResponse::Ok();
    match rc.take_cookie().await {
        Some(CookieChange::Set(session_id)) => {
            reply.cookie(session_cookie(&state.session, session_id));
        }
        Some(CookieChange::Clear) => {
            reply.cookie(removal_cookie(&state.session));
        }
        None => {}
    }

    reply.json(response)
}

/// GET /graphql - GraphiQL explorer.
pub async fn graphiql() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(GraphiQLSource::build().endpoint("/graphql").finish())
}
