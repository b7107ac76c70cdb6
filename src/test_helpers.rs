//! Test helper factories and mock state builders
//!
//! Provides an auth configuration with cheap bcrypt and server states backed
//! by an in-memory store.
#![allow(dead_code)]

use crate::api::handlers::{ServerState, TrackerState};
use crate::store::MemoryStore;
use crate::{AuthConfig, GoogleConfig, StateCookieConfig};
use std::sync::Arc;

pub const TEST_SECRET: &str = "test-secret-key-minimum-32-chars!!";

/// Auth config with Google login disabled and the minimum bcrypt cost
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiry_secs: 86400,
        bcrypt_cost: 4,
        frontend_url: "http://localhost:5174".to_string(),
        state_cookie: StateCookieConfig::default(),
        google: None,
    }
}

/// Google config whose token and userinfo endpoints live under `base`
/// (usually a wiremock server URI)
pub fn test_google_config(base: &str) -> GoogleConfig {
    GoogleConfig {
        client_id: "123456.apps.googleusercontent.com".to_string(),
        client_secret: "secret123".to_string(),
        redirect_uri: "http://localhost:8080/auth/google/callback".to_string(),
        token_endpoint: format!("{}/token", base),
        userinfo_endpoint: format!("{}/userinfo", base),
        request_timeout_secs: 2,
        ..GoogleConfig::default()
    }
}

/// Server state with default test auth and an empty memory store
pub fn test_state() -> TrackerState {
    test_state_with(test_auth_config(), Arc::new(MemoryStore::new()))
}

/// Server state over a caller-held memory store
pub fn test_state_with(auth: AuthConfig, store: Arc<MemoryStore>) -> TrackerState {
    Arc::new(ServerState::new(&auth, store).expect("test state"))
}
