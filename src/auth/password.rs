//! Password registration and login.
//!
//! Passwords are hashed with bcrypt on the blocking pool. One account per
//! email: registering an email that already exists is refused even when the
//! existing account only has a Google identity.

use std::sync::Arc;

use uuid::Uuid;

use crate::store::{Store, StoreError, User};

/// bcrypt cost used when the config does not override it
pub const DEFAULT_BCRYPT_COST: u32 = 12;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("email already registered")]
    EmailTaken,
    #[error("failed to hash password")]
    HashingFailure,
    #[error("no account for this email")]
    NotFound,
    #[error("account has no password; use Google login")]
    PasswordLoginUnavailable,
    #[error("invalid credentials")]
    BadCredentials,
    #[error("persistence failure: {0}")]
    Persistence(#[source] anyhow::Error),
}

impl From<StoreError> for CredentialError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => CredentialError::EmailTaken,
            StoreError::Backend(e) => CredentialError::Persistence(e),
        }
    }
}

pub struct CredentialService {
    store: Arc<dyn Store>,
    cost: u32,
}

impl CredentialService {
    pub fn new(store: Arc<dyn Store>, cost: u32) -> Self {
        Self { store, cost }
    }

    /// Create a password account and return its internal id.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<String>,
    ) -> Result<Uuid, CredentialError> {
        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(CredentialError::EmailTaken);
        }

        let password = password.to_string();
        let cost = self.cost;
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|_| CredentialError::HashingFailure)?
            .map_err(|_| CredentialError::HashingFailure)?;

        let user = User::with_password(email, password_hash, name);
        // A concurrent registration can win between lookup and insert;
        // the store reports that as DuplicateEmail → EmailTaken.
        self.store.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, "Registered password account");
        Ok(user.id)
    }

    /// Check an email/password pair and return the account's internal id.
    ///
    /// `NotFound` and `BadCredentials` must be reported identically to the
    /// client; only `PasswordLoginUnavailable` is user-facing.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Uuid, CredentialError> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or(CredentialError::NotFound)?;

        let Some(hash) = user.password_hash.clone().filter(|h| !h.is_empty()) else {
            return Err(CredentialError::PasswordLoginUnavailable);
        };

        let password = password.to_string();
        let password_ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|_| CredentialError::BadCredentials)?
            .unwrap_or(false);

        if !password_ok {
            return Err(CredentialError::BadCredentials);
        }
        Ok(user.id)
    }
}
