//! Request extractors shared by the API handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::{de::DeserializeOwned, Deserialize};

use catalog_core::errors::{Error as CoreError, ValidationError};
use catalog_core::PageRequest;

use crate::error::ApiError;
use crate::main_lib::AppState;

/// JSON request body.
///
/// Unlike `axum::Json` the content type is not enforced and an empty body
/// reads as `{}`, so a missing payload surfaces as field validation errors.
/// Malformed JSON is a 400 validation failure.
#[derive(Debug)]
pub struct JsonPayload<T>(pub T);

impl<S, T> FromRequest<S> for JsonPayload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };

        serde_json::from_slice(body)
            .map(JsonPayload)
            .map_err(|e| {
                ApiError::Core(CoreError::Validation(ValidationError::InvalidInput(
                    format!("Invalid JSON body: {e}"),
                )))
            })
    }
}

/// Numeric id from the `{id}` path segment.
///
/// Anything that is not a positive integer cannot name a stored record and is
/// rejected as not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(pub i64);

impl RecordId {
    fn parse(raw: &str) -> Option<Self> {
        raw.parse::<i64>().ok().filter(|id| *id > 0).map(RecordId)
    }
}

impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound)?;
        Self::parse(&raw).ok_or(ApiError::NotFound)
    }
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<String>,
    limit: Option<String>,
}

/// `page` and `limit` query parameters of a list request.
///
/// Both are lenient: values that are not positive integers fall back to
/// the first page and the configured page size, and `limit` is clamped.
#[derive(Debug, Clone, Copy)]
pub struct PageParams(pub PageRequest);

impl PageParams {
    fn parse(page: Option<&str>, limit: Option<&str>, default_limit: u32) -> PageRequest {
        let page = page
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<u32>().ok())
            .filter(|l| *l > 0)
            .unwrap_or(default_limit);
        PageRequest::new(page, limit)
    }
}

impl FromRequestParts<Arc<AppState>> for PageParams {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let query = Query::<PageQuery>::from_request_parts(parts, state)
            .await
            .map(|Query(q)| q)
            .unwrap_or(PageQuery {
                page: None,
                limit: None,
            });
        Ok(PageParams(Self::parse(
            query.page.as_deref(),
            query.limit.as_deref(),
            state.page_size,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_invalid_values_use_defaults() {
        let request = PageParams::parse(None, None, 10);
        assert_eq!((request.page(), request.limit()), (1, 10));

        let request = PageParams::parse(Some("abc"), Some("-5"), 10);
        assert_eq!((request.page(), request.limit()), (1, 10));

        let request = PageParams::parse(Some("0"), Some("0"), 25);
        assert_eq!((request.page(), request.limit()), (1, 25));
    }

    #[test]
    fn record_ids_must_be_positive_integers() {
        assert_eq!(RecordId::parse("42"), Some(RecordId(42)));
        assert_eq!(RecordId::parse("-1"), None);
        assert_eq!(RecordId::parse("0"), None);
        assert_eq!(RecordId::parse("abc"), None);
        assert_eq!(RecordId::parse("99999999999999999999"), None);
    }

    #[test]
    fn limit_is_clamped() {
        let request = PageParams::parse(Some("3"), Some("5000"), 10);
        assert_eq!((request.page(), request.limit()), (3, 100));
    }
}
