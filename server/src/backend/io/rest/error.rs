//! Translation of domain errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use shared::ErrorResponse;

use crate::backend::domain::models::{DomainError, ValidationError};

pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(ValidationError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
        DomainError::Validation(ValidationError::UnitNotFound(_)) => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::OperationFailed(_) => StatusCode::BAD_GATEWAY,
    }
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

pub fn domain_error_response(err: DomainError) -> Response {
    error_response(status_for(&err), err.to_string())
}
