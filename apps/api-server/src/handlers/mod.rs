//! HTTP handlers and route configuration.

mod graphql;
mod health;

use actix_web::{HttpRequest, HttpResponse, web};

use crate::middleware::error::{AppError, AppResult, json_body_error};

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/graphql")
            .app_data(web::JsonConfig::default().error_handler(json_body_error))
            .route(web::post().to(graphql::graphql))
            .route(web::get().to(graphql::graphiql)),
    )
    .service(web::scope("/api").route("/health", web::get().to(health::health_check)))
    .default_service(web::to(not_found));
}

async fn not_found(req: HttpRequest) -> AppResult<HttpResponse> {
    Err(AppError::NotFound(format!("no route for {}", req.path())))
}
