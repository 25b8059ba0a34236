use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::domain::errors::{DomainError, FieldError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound(entity) => AppError::NotFound(entity),
            DomainError::Validation(errors) => AppError::Validation(errors),
            DomainError::InvalidState(msg) | DomainError::Duplicate(msg) => {
                AppError::BadRequest(msg)
            }
            DomainError::Conflict(msg) => AppError::Conflict(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

#[derive(Serialize)]
struct FailBody<'a> {
    status: &'static str,
    errors: &'a [FieldError],
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            AppError::Validation(errors) => builder.json(FailBody {
                status: "fail",
                errors,
            }),
            AppError::BadRequest(msg) | AppError::Conflict(msg) => builder.json(json!({
                "status": "fail",
                "message": msg
            })),
            AppError::NotFound(_) => builder.json(json!({
                "message": self.to_string()
            })),
            AppError::Internal(detail) => {
                log::error!("{detail}");
                builder.json(json!({
                    "status": "error",
                    "message": "Internal server error"
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::ResponseError;

    async fn body_json(err: AppError) -> serde_json::Value {
        let bytes = to_bytes(err.error_response().into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn not_found_returns_404() {
        let resp = AppError::NotFound("Order").error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_error_returns_500() {
        let err = AppError::Internal("something went wrong".to_string());
        assert_eq!(err.error_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn conflict_returns_409() {
        let err = AppError::Conflict("stale".to_string());
        assert_eq!(err.error_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn not_found_display() {
        assert_eq!(AppError::NotFound("Product").to_string(), "Product not found");
    }

    #[actix_web::test]
    async fn validation_body_lists_fields() {
        let body = body_json(AppError::invalid_field("userId", "Invalid user ID")).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(body["errors"][0]["field"], "userId");
        assert_eq!(body["errors"][0]["message"], "Invalid user ID");
    }

    #[actix_web::test]
    async fn internal_body_hides_details() {
        let body = body_json(AppError::Internal("password=hunter2".to_string())).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Internal server error");
        assert!(!body.to_string().contains("hunter2"));
    }

    #[actix_web::test]
    async fn not_found_body_names_entity() {
        let body = body_json(AppError::NotFound("Order")).await;
        assert_eq!(body["message"], "Order not found");
    }

    #[test]
    fn domain_not_found_maps_to_app_not_found() {
        let app_err: AppError = DomainError::NotFound("Order").into();
        assert!(matches!(app_err, AppError::NotFound("Order")));
    }

    #[test]
    fn domain_internal_maps_to_app_internal() {
        let app_err: AppError = DomainError::Internal("oops".to_string()).into();
        assert!(matches!(app_err, AppError::Internal(_)));
    }

    #[test]
    fn domain_state_and_duplicate_map_to_bad_request() {
        let app_err: AppError = DomainError::InvalidState("Cannot cancel delivered order".into()).into();
        assert!(matches!(app_err, AppError::BadRequest(_)));
        let app_err: AppError = DomainError::Duplicate("sku".into()).into();
        assert!(matches!(app_err, AppError::BadRequest(_)));
    }
}
