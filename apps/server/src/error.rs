use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use catalog_core::errors::{DatabaseError, Error as CoreError, FieldErrors};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("Not Found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorBody {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
            errors: None,
        }
    }

    fn validation(errors: &FieldErrors) -> Self {
        Self {
            code: StatusCode::BAD_REQUEST.as_u16(),
            message: "Validation Failed".to_string(),
            errors: Some(errors.as_map().clone()),
        }
    }
}

fn form_error(message: impl Into<String>) -> FieldErrors {
    let mut errors = FieldErrors::default();
    errors.add(FieldErrors::FORM, message);
    errors
}

/// Details stay in the log; clients get a fixed message.
fn internal_error() -> (StatusCode, ErrorBody) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorBody::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Core(e) => match e {
                CoreError::Validation(v) => (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::validation(&v.field_errors()),
                ),
                CoreError::Database(DatabaseError::NotFound(_)) => (
                    StatusCode::NOT_FOUND,
                    ErrorBody::new(StatusCode::NOT_FOUND, "Not Found"),
                ),
                // Backstop for the unique indexes on code and slug.
                CoreError::Database(DatabaseError::UniqueViolation(_)) => (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::validation(&form_error(
                        "A taxon with the same code or slug already exists.",
                    )),
                ),
                CoreError::Database(DatabaseError::ForeignKeyViolation(_)) => (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::validation(&form_error(
                        "Referenced taxon or locale does not exist.",
                    )),
                ),
                CoreError::ConstraintViolation(_) => (
                    StatusCode::CONFLICT,
                    ErrorBody::new(StatusCode::CONFLICT, e.to_string()),
                ),
                _ => {
                    error!("Request failed: {}", e);
                    internal_error()
                }
            },
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody::new(StatusCode::NOT_FOUND, "Not Found"),
            ),
            ApiError::BadRequest(reason) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::validation(&form_error(reason.clone())),
            ),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
