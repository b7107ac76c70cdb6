//! Google OAuth2 Authorization Code Flow
//!
//! Handles the server side of Google login:
//! 1. Mint an anti-forgery state and build the authorization URL
//! 2. On callback, check the state against the cookie copy
//! 3. Exchange the authorization code for an access token
//! 4. Fetch the user's profile from the userinfo endpoint
//!
//! Every step after the state check is a single outbound call bounded by
//! the configured timeout. Nothing is retried.

use std::time::Duration;

use serde::Deserialize;

use crate::auth::state::generate_state;
use crate::GoogleConfig;

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("state parameter does not match the state cookie")]
    StateMismatch,
    #[error("missing authorization code")]
    MissingCode,
    #[error("token exchange failed: {0}")]
    ExchangeFailed(String),
    #[error("userinfo fetch failed: {0}")]
    ProfileFetchFailed(String),
    #[error("userinfo parse failed: {0}")]
    ProfileParseFailed(String),
    #[error("userinfo is missing the subject id or email")]
    IncompleteProfile,
}

/// Raw userinfo payload. Every field is optional; Google returns `sub` from
/// the v3 endpoint and `id` from the legacy v2 one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleUserInfo {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
}

/// Verified identity claims extracted from [`GoogleUserInfo`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleProfile {
    /// Stable subject identifier (`sub`, or `id` when `sub` is empty)
    pub subject_id: String,
    pub email: String,
    /// `name`, or `given_name` when `name` is empty
    pub display_name: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl GoogleUserInfo {
    /// Apply the fallback rules and require a subject id and an email.
    pub fn into_profile(self) -> Result<GoogleProfile, OAuthError> {
        let subject_id = non_empty(self.sub)
            .or_else(|| non_empty(self.id))
            .ok_or(OAuthError::IncompleteProfile)?;
        let email = non_empty(self.email).ok_or(OAuthError::IncompleteProfile)?;
        let display_name = non_empty(self.name).or_else(|| non_empty(self.given_name));

        Ok(GoogleProfile {
            subject_id,
            email,
            display_name,
        })
    }
}

/// Result of starting a login: the state to put in the cookie and the
/// URL to redirect the browser to.
#[derive(Debug, Clone)]
pub struct LoginStart {
    pub state: String,
    pub auth_url: String,
}

/// Google token endpoint response
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: Option<String>,
    #[allow(dead_code)]
    expires_in: Option<u64>,
}

/// Google OAuth2 client for the authorization code flow
pub struct GoogleOAuthClient {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_endpoint: String,
    token_endpoint: String,
    userinfo_endpoint: String,
    scopes: String,
    http_client: reqwest::Client,
}

impl GoogleOAuthClient {
    /// Create a client from the Google section of the auth configuration.
    pub fn new(config: &GoogleConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            auth_endpoint: config.auth_endpoint.clone(),
            token_endpoint: config.token_endpoint.clone(),
            userinfo_endpoint: config.userinfo_endpoint.clone(),
            scopes: config.scopes.clone(),
            http_client,
        })
    }

    /// Build the authorization URL for `state`.
    ///
    /// Requests offline access and forces consent plus account selection so a
    /// repeat login can pick a different Google account.
    pub fn auth_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt={}&state={}",
            self.auth_endpoint,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&self.scopes),
            urlencoding::encode("consent select_account"),
            urlencoding::encode(state),
        )
    }

    /// Mint a fresh state and the matching authorization URL.
    pub fn begin_login(&self) -> LoginStart {
        let state = generate_state();
        let auth_url = self.auth_url(&state);
        LoginStart { state, auth_url }
    }

    /// Run the callback half of the flow.
    ///
    /// The state check happens before any network call. `cookie_state` is
    /// `None` when the browser did not send the cookie, which is a mismatch.
    pub async fn complete_login(
        &self,
        query_state: Option<&str>,
        cookie_state: Option<&str>,
        code: Option<&str>,
    ) -> Result<GoogleProfile, OAuthError> {
        match (query_state, cookie_state) {
            (Some(query), Some(cookie)) if !query.is_empty() && query == cookie => {}
            _ => return Err(OAuthError::StateMismatch),
        }

        let code = code
            .filter(|c| !c.is_empty())
            .ok_or(OAuthError::MissingCode)?;

        let access_token = self.exchange_code(code).await?;
        let user_info = self.fetch_user_info(&access_token).await?;
        user_info.into_profile()
    }

    /// POST the authorization code to the token endpoint.
    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let response = self
            .http_client
            .post(&self.token_endpoint)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::ExchangeFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OAuthError::ExchangeFailed(format!(
                "token endpoint returned {}",
                status
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::ExchangeFailed(e.to_string()))?;

        if token.access_token.is_empty() {
            return Err(OAuthError::ExchangeFailed("empty access token".to_string()));
        }
        Ok(token.access_token)
    }

    /// GET the userinfo endpoint with the bearer access token.
    async fn fetch_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, OAuthError> {
        let response = self
            .http_client
            .get(&self.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuthError::ProfileFetchFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OAuthError::ProfileFetchFailed(format!(
                "userinfo endpoint returned {}",
                status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| OAuthError::ProfileFetchFailed(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| OAuthError::ProfileParseFailed(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
