//! Cookie session extractor and cookie builders.

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures::future::LocalBoxFuture;

use crate::config::SessionConfig;
use crate::state::AppState;

/// The session behind the request's cookie, if it is still valid.
///
/// Never fails: a missing, unknown or expired session is an anonymous
/// request.
#[derive(Debug, Clone, Default)]
pub struct OptionalSession {
    pub session_id: Option<String>,
    pub user_id: Option<i32>,
}

impl FromRequest for OptionalSession {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
            tracing::error!("AppState not found in app data");
            return Box::pin(async { Ok(OptionalSession::default()) });
        };

        let session_id = req
            .cookie(&state.session.cookie_name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty());

        Box::pin(async move {
            let Some(session_id) = session_id else {
                return Ok(OptionalSession::default());
            };

            let user_id = state.sessions.resolve(&session_id).await;
            if user_id.is_none() {
                tracing::debug!("Request carried an unknown or expired session");
            }

            Ok(OptionalSession {
                session_id: Some(session_id),
                user_id,
            })
        })
    }
}

/// Cookie carrying a freshly started session.
pub fn session_cookie(config: &SessionConfig, session_id: String) -> Cookie<'static> {
    Cookie::build(config.cookie_name.clone(), session_id)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure)
        .max_age(CookieDuration::seconds(config.ttl.as_secs() as i64))
        .finish()
}

/// Cookie that makes the browser forget the session.
pub fn removal_cookie(config: &SessionConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build(config.cookie_name.clone(), "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure)
        .finish();
    cookie.make_removal();
    cookie
}
