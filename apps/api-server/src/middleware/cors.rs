//! Cross-origin access for the browser frontend.
//!
//! The session lives in a cookie, so the frontend's origin is allowed with
//! credentials and every other origin is refused.

use actix_cors::Cors;
use actix_web::http::header;

/// CORS policy admitting `frontend_url` (scheme, host and port) with cookies.
pub fn frontend_cors(frontend_url: &str) -> Cors {
    Cors::default()
        .allowed_origin(frontend_url.trim_end_matches('/'))
        .allowed_methods(["GET", "POST"])
        .allowed_headers([header::CONTENT_TYPE, header::ACCEPT])
        .supports_credentials()
        .max_age(3600)
}

#[cfg(test)]
mod tests {
    use actix_web::http::{Method, StatusCode};
    use actix_web::{App, HttpResponse, test, web};

    use super::*;

    const FRONTEND: &str = "http://localhost:3000";

    macro_rules! init_app {
        () => {
            test::init_service(
                App::new()
                    .wrap(frontend_cors("http://localhost:3000/"))
                    .route("/graphql", web::post().to(HttpResponse::Ok)),
            )
            .await
        };
    }

    fn preflight(origin: &str) -> test::TestRequest {
        test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/graphql")
            .insert_header((header::ORIGIN, origin))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type"))
    }

    #[actix_web::test]
    async fn test_frontend_preflight_allows_credentials() {
        let app = init_app!();

        let resp = test::call_service(&app, preflight(FRONTEND).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let headers = resp.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            FRONTEND
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[actix_web::test]
    async fn test_frontend_request_is_echoed() {
        let app = init_app!();

        let req = test::TestRequest::post()
            .uri("/graphql")
            .insert_header((header::ORIGIN, FRONTEND))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            FRONTEND
        );
    }

    #[actix_web::test]
    async fn test_other_origins_are_refused() {
        let app = init_app!();

        let resp = test::call_service(&app, preflight("http://evil.example").to_request()).await;

        assert!(resp.status().is_client_error());
        assert!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }
}
