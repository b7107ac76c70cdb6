//! Persistence for users, the session log, and calorie entries

pub mod memory;
pub mod models;
pub mod neo4j;
pub mod traits;

pub use memory::MemoryStore;
pub use models::*;
pub use neo4j::Neo4jStore;
pub use traits::{Store, StoreError, StoreResult};
