//! Neo4j-backed implementation of [`Store`].
//!
//! Users, sessions, and calorie entries are stored as `:User`, `:Session`
//! and `:CalorieEntry` nodes in one database. Each label plays the role of
//! a collection; there are no cross-label transactions.

use crate::store::models::{CalorieEntry, EntryInput, Session, User};
use crate::store::traits::{Store, StoreError, StoreResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use neo4rs::{query, Graph, Query};
use std::sync::Arc;
use uuid::Uuid;

/// Store backed by a Neo4j graph
pub struct Neo4jStore {
    graph: Arc<Graph>,
}

impl Neo4jStore {
    /// Connect and initialize the schema
    pub async fn new(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .context("Failed to connect to Neo4j")?;

        let store = Self {
            graph: Arc::new(graph),
        };
        store.init_schema().await;

        Ok(store)
    }

    /// Create uniqueness constraints and indexes
    async fn init_schema(&self) {
        let statements = [
            "CREATE CONSTRAINT user_id IF NOT EXISTS FOR (u:User) REQUIRE u.id IS UNIQUE",
            "CREATE CONSTRAINT user_email IF NOT EXISTS FOR (u:User) REQUIRE u.email IS UNIQUE",
            "CREATE CONSTRAINT calorie_entry_id IF NOT EXISTS FOR (e:CalorieEntry) REQUIRE e.id IS UNIQUE",
            "CREATE INDEX calorie_entry_user IF NOT EXISTS FOR (e:CalorieEntry) ON (e.user_id)",
            "CREATE INDEX session_user IF NOT EXISTS FOR (s:Session) ON (s.user_id)",
        ];

        for statement in statements {
            if let Err(e) = self.graph.run(query(statement)).await {
                tracing::warn!("Constraint or index may already exist: {}", e);
            }
        }
    }

    async fn fetch_user(&self, q: Query) -> Result<Option<User>> {
        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("u")?;
            Ok(Some(node_to_user(&node)?))
        } else {
            Ok(None)
        }
    }

    /// Create the user unless the email is taken. Returns false on a taken email.
    async fn create_user(&self, user: &User) -> Result<bool> {
        let q = query(
            r#"
            OPTIONAL MATCH (existing:User {email: $email})
            WITH existing WHERE existing IS NULL
            CREATE (u:User {
                id: $id,
                email: $email,
                google_id: $google_id,
                password_hash: $password_hash,
                name: $name
            })
            RETURN u
            "#,
        )
        .param("id", user.id.to_string())
        .param("email", user.email.clone())
        .param("google_id", user.google_id.clone().unwrap_or_default())
        .param("password_hash", user.password_hash.clone().unwrap_or_default())
        .param("name", user.name.clone().unwrap_or_default());

        let mut result = self.graph.execute(q).await?;
        Ok(result.next().await?.is_some())
    }

    async fn create_session(&self, session: &Session) -> Result<()> {
        let q = query(
            r#"
            CREATE (s:Session {
                id: $id,
                user_id: $user_id,
                token: $token,
                expires_at: $expires_at
            })
            "#,
        )
        .param("id", session.id.to_string())
        .param("user_id", session.user_id.to_string())
        .param("token", session.token.clone())
        .param("expires_at", session.expires_at);

        self.graph.run(q).await?;
        Ok(())
    }

    async fn create_entry(&self, entry: &CalorieEntry) -> Result<()> {
        let q = query(
            r#"
            CREATE (e:CalorieEntry {
                id: $id,
                user_id: $user_id,
                date: $date,
                meal: $meal,
                calories: $calories
            })
            "#,
        )
        .param("id", entry.id.to_string())
        .param("user_id", entry.user_id.to_string())
        .param("date", entry.date.clone())
        .param("meal", entry.meal.clone())
        .param("calories", entry.calories);

        self.graph.run(q).await?;
        Ok(())
    }

    async fn entries_for(&self, user_id: Uuid) -> Result<Vec<CalorieEntry>> {
        let q = query(
            "MATCH (e:CalorieEntry {user_id: $user_id}) RETURN e ORDER BY e.date, e.id",
        )
        .param("user_id", user_id.to_string());

        let mut result = self.graph.execute(q).await?;
        let mut entries = Vec::new();
        while let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("e")?;
            entries.push(node_to_entry(&node)?);
        }
        Ok(entries)
    }

    async fn set_entry(&self, user_id: Uuid, entry_id: Uuid, input: &EntryInput) -> Result<bool> {
        let q = query(
            r#"
            MATCH (e:CalorieEntry {id: $id, user_id: $user_id})
            SET e.date = $date, e.meal = $meal, e.calories = $calories
            RETURN e
            "#,
        )
        .param("id", entry_id.to_string())
        .param("user_id", user_id.to_string())
        .param("date", input.date.clone())
        .param("meal", input.meal.clone())
        .param("calories", input.calories);

        let mut result = self.graph.execute(q).await?;
        Ok(result.next().await?.is_some())
    }

    async fn remove_entry(&self, user_id: Uuid, entry_id: Uuid) -> Result<bool> {
        let q = query(
            r#"
            MATCH (e:CalorieEntry {id: $id, user_id: $user_id})
            WITH e, e.id AS removed
            DELETE e
            RETURN count(removed) AS deleted
            "#,
        )
        .param("id", entry_id.to_string())
        .param("user_id", user_id.to_string());

        let mut result = self.graph.execute(q).await?;
        let deleted = match result.next().await? {
            Some(row) => row.get::<i64>("deleted")?,
            None => 0,
        };
        Ok(deleted > 0)
    }
}

#[async_trait]
impl Store for Neo4jStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let q = query("MATCH (u:User {email: $email}) RETURN u").param("email", email);
        Ok(self.fetch_user(q).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let q = query("MATCH (u:User {id: $id}) RETURN u").param("id", id.to_string());
        Ok(self.fetch_user(q).await?)
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        match self.create_user(user).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(StoreError::DuplicateEmail),
            // A concurrent insert of the same email trips the unique constraint
            Err(e) if is_constraint_violation(&e) => Err(StoreError::DuplicateEmail),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_session(&self, session: &Session) -> StoreResult<()> {
        Ok(self.create_session(session).await?)
    }

    async fn insert_entry(&self, entry: &CalorieEntry) -> StoreResult<()> {
        Ok(self.create_entry(entry).await?)
    }

    async fn list_entries(&self, user_id: Uuid) -> StoreResult<Vec<CalorieEntry>> {
        Ok(self.entries_for(user_id).await?)
    }

    async fn update_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        input: &EntryInput,
    ) -> StoreResult<bool> {
        Ok(self.set_entry(user_id, entry_id, input).await?)
    }

    async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> StoreResult<bool> {
        Ok(self.remove_entry(user_id, entry_id).await?)
    }
}

fn is_constraint_violation(err: &anyhow::Error) -> bool {
    format!("{err:#}").contains("ConstraintValidationFailed")
}

/// Empty strings are how absent optional fields are stored
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn node_to_user(node: &neo4rs::Node) -> Result<User> {
    Ok(User {
        id: node.get::<String>("id")?.parse()?,
        email: node.get("email")?,
        google_id: non_empty(node.get::<String>("google_id").ok()),
        password_hash: non_empty(node.get::<String>("password_hash").ok()),
        name: non_empty(node.get::<String>("name").ok()),
    })
}

fn node_to_entry(node: &neo4rs::Node) -> Result<CalorieEntry> {
    Ok(CalorieEntry {
        id: node.get::<String>("id")?.parse()?,
        user_id: node.get::<String>("user_id")?.parse()?,
        date: node.get("date")?,
        meal: node.get("meal")?,
        calories: node.get("calories")?,
    })
}
