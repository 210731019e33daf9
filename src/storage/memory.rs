//! In-process storage backend.
//!
//! Used by the test suite and by `--seed-file` development runs. Ids are
//! assigned sequentially; no natural-key deduplication is performed, so a
//! post inserted twice is stored twice.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::models::{
    InsertResult, PostEntry, PostMatch, ShareEntry, ShareMatch, UserEntry, UserMatch,
};
use crate::storage::StorageClient;

/// Serializable contents of a [`MemoryStorage`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<UserEntry>,
    #[serde(default)]
    pub posts: Vec<PostEntry>,
    #[serde(default)]
    pub shares: Vec<ShareEntry>,
}

#[derive(Debug, Default)]
struct Tables {
    data: Snapshot,
    next_id: i64,
}

impl Tables {
    fn assign_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Storage backend holding everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a snapshot, keeping the ids it carries.
    pub fn from_snapshot(data: Snapshot) -> Self {
        let next_id = data
            .users
            .iter()
            .map(|u| u.global_id)
            .chain(data.posts.iter().map(|p| p.global_id))
            .max()
            .unwrap_or(0);
        Self {
            tables: RwLock::new(Tables { data, next_id }),
        }
    }

    /// Load a JSON snapshot from disk.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let data: Snapshot = serde_json::from_slice(&bytes)?;
        log::info!(
            "Loaded {} users, {} posts, {} shares from {}",
            data.users.len(),
            data.posts.len(),
            data.shares.len(),
            path.as_ref().display()
        );
        Ok(Self::from_snapshot(data))
    }

    /// Record a share row; shares are never created through the RPC contract.
    pub async fn insert_share(&self, share: ShareEntry) {
        self.tables.write().await.data.shares.push(share);
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.tables.read().await.data.clone()
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn find_users(&self, matcher: &UserMatch) -> Result<Vec<UserEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .data
            .users
            .iter()
            .filter(|u| matcher.matches(u))
            .cloned()
            .collect())
    }

    async fn find_posts(&self, matcher: &PostMatch) -> Result<Vec<PostEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .data
            .posts
            .iter()
            .filter(|p| matcher.matches(p))
            .cloned()
            .collect())
    }

    async fn find_shares(&self, matcher: &ShareMatch) -> Result<Vec<ShareEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .data
            .shares
            .iter()
            .filter(|s| matcher.matches(s))
            .cloned()
            .collect())
    }

    async fn insert_user(&self, entry: &UserEntry) -> Result<InsertResult> {
        let mut tables = self.tables.write().await;
        let global_id = tables.assign_id();
        tables.data.users.push(UserEntry {
            global_id,
            ..entry.clone()
        });
        Ok(InsertResult { global_id })
    }

    async fn insert_post(&self, entry: &PostEntry) -> Result<InsertResult> {
        let mut tables = self.tables.write().await;
        let global_id = tables.assign_id();
        tables.data.posts.push(PostEntry {
            global_id,
            ..entry.clone()
        });
        Ok(InsertResult { global_id })
    }
}
