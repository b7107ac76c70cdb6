//! Session log writes.
//!
//! The session record is an audit trail only. Token verification never reads
//! it, so a failed insert is logged and dropped and the login still succeeds.

use uuid::Uuid;

use crate::auth::jwt::IssuedToken;
use crate::store::{Session, Store};

/// Insert a session record for `issued`, discarding any store error.
pub async fn record_session(store: &dyn Store, user_id: Uuid, issued: &IssuedToken) {
    let session = Session::new(user_id, &issued.token, issued.expires_at);
    if let Err(e) = store.insert_session(&session).await {
        tracing::warn!(%user_id, "Failed to record session: {e:#}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenService;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_session_matches_token_expiry() {
        let store = MemoryStore::new();
        let tokens = TokenService::new("test-secret-key-minimum-32-chars!!", 86400).unwrap();
        let user_id = Uuid::new_v4();
        let issued = tokens.issue(user_id).unwrap();

        record_session(&store, user_id, &issued).await;

        let sessions = store.sessions.read().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].user_id, user_id);
        assert_eq!(sessions[0].token, issued.token);
        assert_eq!(sessions[0].expires_at, issued.expires_at.timestamp());
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let store = MemoryStore::new();
        store.fail_session_inserts();
        let tokens = TokenService::new("test-secret-key-minimum-32-chars!!", 86400).unwrap();
        let issued = tokens.issue(Uuid::new_v4()).unwrap();

        // Returns normally
        record_session(&store, Uuid::new_v4(), &issued).await;
        assert_eq!(store.session_count().await, 0);
    }
}
