//! Authentication route handlers: password register/login and Google OAuth.
//!
//! Endpoints:
//! - `POST /register`              Create a password account, returns `{token}`
//! - `POST /login`                 Email/password login, returns `{token}`
//! - `GET  /auth/google/login`     Sets the state cookie and redirects to Google
//! - `GET  /auth/google/callback`  Completes the flow, redirects to the frontend with `?token=`
//!
//! Every successful path issues a JWT and writes a best-effort session record.

use crate::api::handlers::{AppError, ServerState, TrackerState};
use crate::auth::password::CredentialError;
use crate::auth::session::record_session;
use crate::auth::state::{build_clear_cookie, build_state_cookie, extract_state_from_cookies};
use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{
        header::{LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request / Response types
// ============================================================================

/// Request body for POST /register
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Request body for POST /login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Query string of GET /auth/google/callback
#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub state: Option<String>,
    pub code: Option<String>,
}

/// Response for POST /register and POST /login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

fn invalid_input() -> AppError {
    AppError::BadRequest("Invalid input".to_string())
}

/// Sign a token for `user_id` and record the session.
async fn issue_token(state: &ServerState, user_id: Uuid) -> Result<String, AppError> {
    let issued = state
        .tokens
        .issue(user_id)
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("Failed to generate token")))?;

    record_session(state.store.as_ref(), user_id, &issued).await;
    Ok(issued.token)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /register
pub async fn register(
    State(state): State<TrackerState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(req) = body.map_err(|_| invalid_input())?;
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(invalid_input());
    }

    let name = req.name.filter(|n| !n.trim().is_empty());
    let user_id = state
        .credentials
        .register(&req.email, &req.password, name)
        .await
        .map_err(|e| match e {
            CredentialError::Persistence(e) => AppError::Internal(e.context("Failed to register")),
            other => other.into(),
        })?;

    let token = issue_token(&state, user_id).await?;
    Ok(Json(TokenResponse { token }))
}

/// POST /login
pub async fn login(
    State(state): State<TrackerState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(req) = body.map_err(|_| invalid_input())?;
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(invalid_input());
    }

    let user_id = state
        .credentials
        .authenticate(&req.email, &req.password)
        .await?;

    let token = issue_token(&state, user_id).await?;
    Ok(Json(TokenResponse { token }))
}

/// GET /auth/google/login
///
/// Mints a fresh state, stores it in the `oauthstate` cookie and sends the
/// browser to Google's consent screen.
pub async fn google_login(State(state): State<TrackerState>) -> Result<Response, AppError> {
    let google = state
        .google
        .as_ref()
        .ok_or_else(|| AppError::Forbidden("Google login is not configured".to_string()))?;

    let start = google.begin_login();
    let cookie = build_state_cookie(&start.state, &state.state_cookie)
        .context("Failed to build state cookie")?;
    let location =
        HeaderValue::from_str(&start.auth_url).context("Failed to build redirect URL")?;

    Ok((
        StatusCode::TEMPORARY_REDIRECT,
        [(SET_COOKIE, cookie), (LOCATION, location)],
    )
        .into_response())
}

/// GET /auth/google/callback
///
/// Checks the state against the cookie, exchanges the code, maps the Google
/// identity to a user and redirects to `{frontend_url}/?token=<jwt>`.
pub async fn google_callback(
    State(state): State<TrackerState>,
    Query(query): Query<GoogleCallbackQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let google = state
        .google
        .as_ref()
        .ok_or_else(|| AppError::Forbidden("Google login is not configured".to_string()))?;

    let cookie_state = extract_state_from_cookies(&headers);
    let profile = google
        .complete_login(
            query.state.as_deref(),
            cookie_state.as_deref(),
            query.code.as_deref(),
        )
        .await?;

    let user_id = state
        .reconciler
        .resolve(
            &profile.subject_id,
            &profile.email,
            profile.display_name.as_deref(),
        )
        .await?;
    tracing::info!(%user_id, "Google login succeeded");

    let token = issue_token(&state, user_id).await?;

    let redirect = format!(
        "{}/?token={}",
        state.frontend_url.trim_end_matches('/'),
        urlencoding::encode(&token)
    );
    let location = HeaderValue::from_str(&redirect).context("Failed to build redirect URL")?;
    let clear = build_clear_cookie(&state.state_cookie).context("Failed to clear state cookie")?;

    Ok((StatusCode::FOUND, [(SET_COOKIE, clear), (LOCATION, location)]).into_response())
}

// ============================================================================
// Tests
// ============================================================================
