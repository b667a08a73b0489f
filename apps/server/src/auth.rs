use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
        HeaderMap, HeaderValue, Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::debug;

use crate::main_lib::AppState;

/// Checks bearer tokens against the tokens provisioned in configuration.
///
/// Tokens are issued elsewhere; this server only accepts or rejects them.
pub struct AuthManager {
    api_tokens: Vec<String>,
}

/// The request carried no acceptable bearer token.
#[derive(Debug)]
pub struct AccessDenied;

#[derive(Serialize)]
struct AccessDeniedBody {
    error: &'static str,
    error_description: &'static str,
}

impl AuthManager {
    pub fn new(api_tokens: Vec<String>) -> Self {
        Self { api_tokens }
    }

    /// True when at least one token is configured.
    pub fn accepts_tokens(&self) -> bool {
        !self.api_tokens.is_empty()
    }

    pub fn validate_token(&self, token: &str) -> Result<(), AccessDenied> {
        if self.api_tokens.iter().any(|known| known == token) {
            Ok(())
        } else {
            debug!("Rejected unknown bearer token");
            Err(AccessDenied)
        }
    }
}

impl IntoResponse for AccessDenied {
    fn into_response(self) -> Response {
        let body = Json(AccessDeniedBody {
            error: "access_denied",
            error_description: "OAuth2 authentication required",
        });
        let mut response = (StatusCode::UNAUTHORIZED, body).into_response();
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        response
    }
}

/// Token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    Some(token.trim()).filter(|token| !token.is_empty())
}

/// Rejects requests without a valid `Authorization: Bearer` token.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AccessDenied> {
    let token = bearer_token(request.headers()).ok_or(AccessDenied)?;
    state.auth.validate_token(token)?;
    Ok(next.run(request).await)
}
