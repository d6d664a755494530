//! Account lookup for callers holding an otherwise valid token.
//!
//! Tokens outlive account deletion, so the extractor asks the directory
//! whether the subject still exists on every request.

use std::collections::BTreeSet;

use async_trait::async_trait;
use firewatch_core::types::DbId;
use firewatch_db::repositories::UserRepo;
use sqlx::PgPool;
use tokio::sync::RwLock;

#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// True while the account exists.
    async fn is_active(&self, user_id: DbId) -> Result<bool, sqlx::Error>;
}

/// Looks accounts up in the `users` table.
pub struct PgAccountDirectory {
    pool: PgPool,
}

impl PgAccountDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountDirectory for PgAccountDirectory {
    async fn is_active(&self, user_id: DbId) -> Result<bool, sqlx::Error> {
        Ok(UserRepo::find_by_id(&self.pool, user_id).await?.is_some())
    }
}

/// A fixed set of account ids kept in memory.
#[derive(Debug, Default)]
pub struct MemoryAccountDirectory {
    ids: RwLock<BTreeSet<DbId>>,
}

impl MemoryAccountDirectory {
    pub fn new(ids: impl IntoIterator<Item = DbId>) -> Self {
        Self {
            ids: RwLock::new(ids.into_iter().collect()),
        }
    }

    pub async fn insert(&self, user_id: DbId) {
        self.ids.write().await.insert(user_id);
    }

    /// Returns `false` if the id was not present.
    pub async fn remove(&self, user_id: DbId) -> bool {
        self.ids.write().await.remove(&user_id)
    }
}

#[async_trait]
impl AccountDirectory for MemoryAccountDirectory {
    async fn is_active(&self, user_id: DbId) -> Result<bool, sqlx::Error> {
        Ok(self.ids.read().await.contains(&user_id))
    }
}
