//! Map a verified Google identity onto an internal user, creating one on
//! first login.
//!
//! An email that belongs to a password account is never linked to a Google
//! identity; that case is a conflict. An email that already has any Google
//! subject id on file is accepted as the same user.

use std::sync::Arc;

use uuid::Uuid;

use crate::store::{Store, StoreError, User};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("email is registered with a password")]
    EmailPasswordConflict,
    #[error("persistence failure: {0}")]
    Persistence(#[source] anyhow::Error),
}

impl From<StoreError> for ReconcileError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Backend(e) => ReconcileError::Persistence(e),
            StoreError::DuplicateEmail => ReconcileError::Persistence(anyhow::anyhow!(err)),
        }
    }
}

pub struct IdentityReconciler {
    store: Arc<dyn Store>,
}

impl IdentityReconciler {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Resolve `(subject_id, email)` to an internal user id.
    pub async fn resolve(
        &self,
        subject_id: &str,
        email: &str,
        display_name: Option<&str>,
    ) -> Result<Uuid, ReconcileError> {
        if let Some(existing) = self.lookup(email).await? {
            return Self::accept_existing(&existing);
        }

        let user = User::with_google_id(email, subject_id, display_name.map(str::to_string));
        match self.store.insert_user(&user).await {
            Ok(()) => {
                tracing::info!(user_id = %user.id, "Created user from Google profile");
                Ok(user.id)
            }
            // Lost a race with a concurrent first login (or registration):
            // re-read and apply the same rules to whoever won.
            Err(StoreError::DuplicateEmail) => match self.lookup(email).await? {
                Some(existing) => Self::accept_existing(&existing),
                None => Err(ReconcileError::Persistence(anyhow::anyhow!(
                    "user vanished after duplicate email"
                ))),
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn lookup(&self, email: &str) -> Result<Option<User>, ReconcileError> {
        Ok(self.store.find_user_by_email(email).await?)
    }

    // No check that the stored subject id equals the incoming one.
    fn accept_existing(user: &User) -> Result<Uuid, ReconcileError> {
        if user.has_google_id() {
            Ok(user.id)
        } else {
            Err(ReconcileError::EmailPasswordConflict)
        }
    }
}
