//! In-memory implementation of [`Store`].
//!
//! Collections are `tokio::sync::RwLock<HashMap<K, V>>`. Used by the test
//! suite and by `serve --in-memory` for local development.

use crate::store::models::{CalorieEntry, EntryInput, Session, User};
use crate::store::traits::{Store, StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    pub users: RwLock<HashMap<Uuid, User>>,
    pub sessions: RwLock<Vec<Session>>,
    pub entries: RwLock<HashMap<Uuid, CalorieEntry>>,
    fail_sessions: AtomicBool,
    fail_users: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `insert_session` fail
    pub fn fail_session_inserts(&self) {
        self.fail_sessions.store(true, Ordering::SeqCst);
    }

    /// Make every subsequent `insert_user` fail with a backend error
    pub fn fail_user_inserts(&self) {
        self.fail_users.store(true, Ordering::SeqCst);
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        if self.fail_users.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("user collection unavailable").into());
        }
        // Check and insert under one write lock so concurrent inserts race safely
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn insert_session(&self, session: &Session) -> StoreResult<()> {
        if self.fail_sessions.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("session collection unavailable").into());
        }
        self.sessions.write().await.push(session.clone());
        Ok(())
    }

    async fn insert_entry(&self, entry: &CalorieEntry) -> StoreResult<()> {
        self.entries.write().await.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn list_entries(&self, user_id: Uuid) -> StoreResult<Vec<CalorieEntry>> {
        let entries = self.entries.read().await;
        let mut owned: Vec<CalorieEntry> = entries
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn update_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        input: &EntryInput,
    ) -> StoreResult<bool> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&entry_id) {
            Some(entry) if entry.user_id == user_id => {
                entry.date = input.date.clone();
                entry.meal = input.meal.clone();
                entry.calories = input.calories;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> StoreResult<bool> {
        let mut entries = self.entries.write().await;
        match entries.get(&entry_id) {
            Some(entry) if entry.user_id == user_id => {
                entries.remove(&entry_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
