//! Store trait definition
//!
//! Abstract interface over the document store holding users, the session
//! log, and calorie entries. Implemented by [`Neo4jStore`](super::Neo4jStore)
//! and the in-memory [`MemoryStore`](super::MemoryStore).

use crate::store::models::{CalorieEntry, EntryInput, Session, User};
use async_trait::async_trait;
use uuid::Uuid;

/// Errors surfaced by a store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A user with this email already exists
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence operations. Every call is independent; there are no
/// cross-collection transactions.
#[async_trait]
pub trait Store: Send + Sync {
    // ========================================================================
    // Users
    // ========================================================================

    /// Find a user by exact (case-sensitive) email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Find a user by internal id
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Insert a new user. Fails with [`StoreError::DuplicateEmail`] if the
    /// email is already taken.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;

    // ========================================================================
    // Session log
    // ========================================================================

    /// Append a session record
    async fn insert_session(&self, session: &Session) -> StoreResult<()>;

    // ========================================================================
    // Calorie entries
    // ========================================================================

    async fn insert_entry(&self, entry: &CalorieEntry) -> StoreResult<()>;

    /// All entries owned by `user_id`
    async fn list_entries(&self, user_id: Uuid) -> StoreResult<Vec<CalorieEntry>>;

    /// Replace the fields of an entry owned by `user_id`.
    /// Returns false when no owned entry matched.
    async fn update_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        input: &EntryInput,
    ) -> StoreResult<bool>;

    /// Delete an entry owned by `user_id`. Returns false when no owned entry matched.
    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> StoreResult<bool>;
}
