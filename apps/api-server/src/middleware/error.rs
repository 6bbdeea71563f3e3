//! Error handling: RFC 7807 bodies for HTTP routes and coded errors for
//! GraphQL.

use std::fmt;

use actix_web::error::JsonPayloadError;
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use async_graphql::ErrorExtensions;

use agora_core::error::{DomainError, FieldError};
use agora_shared::{ErrorResponse, InvalidField};

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(Vec<FieldError>),
    Conflict(FieldError),
    Unauthenticated,
    Forbidden,
    NotFound(String),
    Internal(String),
}

impl AppError {
    /// The `extensions.code` reported to GraphQL clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) => "BAD_USER_INPUT",
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn fields(&self) -> &[FieldError] {
        match self {
            AppError::Validation(fields) => fields,
            AppError::Conflict(field) => std::slice::from_ref(field),
            _ => &[],
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(fields) => {
                let messages: Vec<_> = fields.iter().map(|e| e.message.as_str()).collect();
                write!(f, "{}", messages.join("; "))
            }
            AppError::Conflict(field) => write!(f, "{}", field.message),
            AppError::Unauthenticated => write!(f, "not authenticated"),
            AppError::Forbidden => write!(f, "not allowed"),
            AppError::NotFound(msg) => write!(f, "{}", msg),
            // Details stay in the logs.
            AppError::Internal(_) => write!(f, "Internal server error"),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(fields) => AppError::Validation(fields),
            DomainError::Conflict(field) => AppError::Conflict(field),
            DomainError::Unauthenticated => AppError::Unauthenticated,
            DomainError::Forbidden => AppError::Forbidden,
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} {} not found", entity_type, id))
            }
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let invalid: Vec<InvalidField> = self
            .fields()
            .iter()
            .map(|f| InvalidField {
                field: f.field.clone(),
                message: f.message.clone(),
            })
            .collect();

        let mut error = ErrorResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or("Error"),
        )
        .with_errors(invalid);

        match self {
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
            }
            AppError::Validation(_) | AppError::NotFound(_) => {
                error = error.with_detail(self.to_string());
            }
            _ => {}
        }

        HttpResponse::build(status).json(error)
    }
}

/// Body extractor errors on JSON routes become 400 problem responses naming
/// the `body` field.
pub fn json_body_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, "Rejected request body");
    AppError::Validation(vec![FieldError::new("body", err.to_string())]).into()
}

impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        if let AppError::Internal(detail) = self {
            tracing::error!(error = %detail, "Internal error in resolver");
        }

        let fields = async_graphql::Value::from_json(serde_json::json!(self.fields()))
            .unwrap_or_default();

        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            e.set("code", self.code());
            if !self.fields().is_empty() {
                e.set("fields", fields);
            }
        })
    }
}

/// Convert a domain error into a GraphQL error carrying its code.
pub fn gql_error(err: DomainError) -> async_graphql::Error {
    AppError::from(err).extend()
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            AppError::from(DomainError::field("cursor", "invalid cursor")).code(),
            "BAD_USER_INPUT"
        );
        assert_eq!(AppError::from(DomainError::Unauthenticated).code(), "UNAUTHENTICATED");
        assert_eq!(AppError::from(DomainError::Forbidden).code(), "FORBIDDEN");
        assert_eq!(
            AppError::from(DomainError::NotFound {
                entity_type: "post",
                id: 3
            })
            .code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn test_internal_details_are_not_leaked() {
        let err = AppError::from(DomainError::Internal("password=hunter2".into()));
        assert_eq!(err.to_string(), "Internal server error");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let gql = err.extend();
        assert!(!gql.message.contains("hunter2"));
    }

    #[test]
    fn test_graphql_error_lists_fields() {
        let gql = gql_error(DomainError::field("limit", "limit must be positive"));
        let extensions = serde_json::to_value(gql.extensions.unwrap()).unwrap();

        assert_eq!(extensions["code"], "BAD_USER_INPUT");
        assert_eq!(extensions["fields"][0]["field"], "limit");
        assert_eq!(gql.message, "limit must be positive");
    }

    #[test]
    fn test_problem_body_for_validation() {
        let resp = AppError::from(DomainError::field("cursor", "invalid cursor")).error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unauthenticated_message() {
        assert_eq!(AppError::Unauthenticated.to_string(), "not authenticated");
        assert_eq!(
            AppError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
