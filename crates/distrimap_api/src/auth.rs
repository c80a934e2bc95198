//! Admin route guard.
//!
//! Only the external contract lives here: a static bearer token compared
//! with the configured one. Issuing and rotating tokens happens elsewhere.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;

/// Rejects the request unless it carries the configured admin token.
///
/// # Errors
/// - `AdminDisabled` (403) when no token is configured.
/// - `Unauthorized` (401) when the header is missing or wrong.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.config().admin_token.as_deref() else {
        return Err(ApiError::AdminDisabled);
    };

    match bearer_token(request.headers()) {
        Some(provided) if tokens_match(provided, expected) => Ok(next.run(request).await),
        _ => Err(ApiError::Unauthorized),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

// Comparison time depends only on the lengths.
fn tokens_match(provided: &str, expected: &str) -> bool {
    let (provided, expected) = (provided.as_bytes(), expected.as_bytes());
    provided.len() == expected.len()
        && provided
            .iter()
            .zip(expected)
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}
