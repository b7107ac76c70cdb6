//! Auth middleware for Axum routes.
//!
//! Validates `Authorization: Bearer <token>` and injects an [`AuthUser`] into
//! request extensions. Rejections never reach the wrapped handler.

use crate::api::handlers::{AppError, TrackerState};
use crate::auth::extractor::AuthUser;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Split an Authorization header value into its bearer token.
///
/// The value must be exactly two space-separated parts, `Bearer` and a
/// non-empty token.
fn bearer_token(header: &str) -> Option<&str> {
    let parts: Vec<&str> = header.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// Middleware that requires a valid JWT Bearer token.
///
/// 1. Missing or empty `Authorization` header → 401
/// 2. Not `Bearer <token>` → 401
/// 3. Token fails verification, or its subject is not a user id → 401
/// 4. Insert [`AuthUser`] for downstream handlers
pub async fn require_auth(
    State(state): State<TrackerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Authorization header required".to_string()))?;

    let token = bearer_token(auth_header).ok_or_else(|| {
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    let subject = state.tokens.verify(token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        AppError::Unauthorized("Invalid token".to_string())
    })?;

    let user_id: Uuid = subject
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    req.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(req).await)
}

// ============================================================================
// Tests
// ============================================================================
