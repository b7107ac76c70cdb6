//! Shared server state, the HTTP error type, and the health handler

use crate::auth::google::{GoogleOAuthClient, OAuthError};
use crate::auth::jwt::TokenService;
use crate::auth::password::{CredentialError, CredentialService};
use crate::auth::reconcile::{IdentityReconciler, ReconcileError};
use crate::store::{Store, StoreError};
use crate::{AuthConfig, StateCookieConfig};
use anyhow::Context;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

/// Shared server state. Built once at startup and read-only afterwards.
pub struct ServerState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub credentials: CredentialService,
    pub reconciler: IdentityReconciler,
    /// None when Google login is not configured
    pub google: Option<GoogleOAuthClient>,
    pub state_cookie: StateCookieConfig,
    /// Where the OAuth callback sends the browser with `?token=`
    pub frontend_url: String,
}

/// Shared tracker state
pub type TrackerState = Arc<ServerState>;

impl ServerState {
    /// Wire every service from the auth configuration and a store handle.
    pub fn new(auth: &AuthConfig, store: Arc<dyn Store>) -> anyhow::Result<Self> {
        let tokens = TokenService::from_config(auth).context("Invalid JWT configuration")?;

        let google = auth
            .google
            .as_ref()
            .map(GoogleOAuthClient::new)
            .transpose()
            .context("Failed to build Google OAuth client")?;

        Ok(Self {
            credentials: CredentialService::new(store.clone(), auth.bcrypt_cost),
            reconciler: IdentityReconciler::new(store.clone()),
            store,
            tokens,
            google,
            state_cookie: auth.state_cookie.clone(),
            frontend_url: auth.frontend_url.clone(),
        })
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health(State(_state): State<TrackerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Generic message-only response body
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

// ============================================================================
// Errors
// ============================================================================

/// API error type. Every variant renders as `{"error": "<message>"}`.
#[derive(Debug)]
pub enum AppError {
    /// 500. Only the outermost context is sent to the client; the full
    /// chain is logged.
    Internal(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    /// 502. Upstream provider failure; detail stays in the logs.
    BadGateway(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(anyhow::Error::new(err).context("Storage error"))
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::EmailTaken => AppError::Conflict("Email already registered".into()),
            CredentialError::HashingFailure => {
                AppError::Internal(anyhow::anyhow!("Failed to hash password"))
            }
            // Unknown email and wrong password must look identical
            CredentialError::NotFound | CredentialError::BadCredentials => {
                AppError::Unauthorized("Invalid credentials".into())
            }
            CredentialError::PasswordLoginUnavailable => {
                AppError::BadRequest("Use Google login for this account".into())
            }
            CredentialError::Persistence(e) => AppError::Internal(e.context("Storage error")),
        }
    }
}

impl From<OAuthError> for AppError {
    fn from(err: OAuthError) -> Self {
        if matches!(
            err,
            OAuthError::ExchangeFailed(_)
                | OAuthError::ProfileFetchFailed(_)
                | OAuthError::ProfileParseFailed(_)
                | OAuthError::IncompleteProfile
        ) {
            tracing::warn!("Google OAuth upstream failure: {}", err);
        }
        match err {
            OAuthError::StateMismatch => AppError::Unauthorized("Invalid state parameter".into()),
            OAuthError::MissingCode => AppError::BadRequest("Missing code parameter".into()),
            OAuthError::ExchangeFailed(_) => AppError::BadGateway("Failed to exchange token".into()),
            OAuthError::ProfileFetchFailed(_) => AppError::BadGateway("Failed to get user info".into()),
            OAuthError::ProfileParseFailed(_) => {
                AppError::BadGateway("Failed to parse user info".into())
            }
            OAuthError::IncompleteProfile => {
                AppError::BadGateway("Invalid user info: missing ID or email".into())
            }
        }
    }
}

impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::EmailPasswordConflict => AppError::Conflict(
                "Email registered with password. Use email login.".into(),
            ),
            ReconcileError::Persistence(e) => AppError::Internal(e.context("Failed to save user")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_are_identical() {
        let a = body_json(CredentialError::NotFound.into()).await;
        let b = body_json(CredentialError::BadCredentials.into()).await;
        assert_eq!(a, b);
        assert_eq!(a.0, StatusCode::UNAUTHORIZED);
        assert_eq!(a.1["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let err = anyhow::anyhow!("connection refused to bolt://db:7687").context("Failed to save user");
        let (status, json) = body_json(AppError::Internal(err)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Failed to save user");
    }

    #[tokio::test]
    async fn test_upstream_errors_are_opaque_502() {
        let (status, json) =
            body_json(OAuthError::ExchangeFailed("invalid_grant: secret detail".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"], "Failed to exchange token");
    }

    #[tokio::test]
    async fn test_oauth_status_mapping() {
        let cases: Vec<(OAuthError, StatusCode)> = vec![
            (OAuthError::StateMismatch, StatusCode::UNAUTHORIZED),
            (OAuthError::MissingCode, StatusCode::BAD_REQUEST),
            (OAuthError::ProfileFetchFailed("x".into()), StatusCode::BAD_GATEWAY),
            (OAuthError::ProfileParseFailed("x".into()), StatusCode::BAD_GATEWAY),
            (OAuthError::IncompleteProfile, StatusCode::BAD_GATEWAY),
        ];
        for (err, expected) in cases {
            let (status, _) = body_json(err.into()).await;
            assert_eq!(status, expected);
        }
    }

    #[tokio::test]
    async fn test_credential_storage_failure_is_neutral_500() {
        let err = CredentialError::Persistence(anyhow::anyhow!("bolt connection reset"));
        let (status, json) = body_json(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Storage error");
    }

    #[tokio::test]
    async fn test_conflicts_are_409() {
        let (status, _) = body_json(CredentialError::EmailTaken.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) = body_json(ReconcileError::EmailPasswordConflict.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
