//! Storage RPC contract.
//!
//! Every component reads and writes persistent data through
//! [`StorageClient`]. Two backends are provided:
//!
//! - [`HttpStorageClient`]: JSON over HTTP against the storage service
//! - [`MemoryStorage`]: in-process tables for development and tests
//!
//! Match requests follow match-by-zero-value semantics: an unset field is
//! not filtered on.

pub mod http;
pub mod memory;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{
    InsertResult, PostEntry, PostMatch, ShareEntry, ShareMatch, UserEntry, UserMatch,
};

pub use http::HttpStorageClient;
pub use memory::MemoryStorage;

/// Trait for storage service clients.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Find users matching the request.
    async fn find_users(&self, matcher: &UserMatch) -> Result<Vec<UserEntry>>;

    /// Find posts matching the request.
    async fn find_posts(&self, matcher: &PostMatch) -> Result<Vec<PostEntry>>;

    /// Find shares matching the request.
    async fn find_shares(&self, matcher: &ShareMatch) -> Result<Vec<ShareEntry>>;

    /// Insert a user; storage assigns the id.
    async fn insert_user(&self, entry: &UserEntry) -> Result<InsertResult>;

    /// Insert a post; storage assigns the id.
    async fn insert_post(&self, entry: &PostEntry) -> Result<InsertResult>;
}

/// Find exactly one user.
///
/// Zero matches is [`AppError::NotFound`], more than one is
/// [`AppError::Ambiguous`].
pub async fn find_one_user(db: &dyn StorageClient, matcher: &UserMatch) -> Result<UserEntry> {
    let mut users = db.find_users(matcher).await?;
    match users.len() {
        0 => Err(AppError::not_found(format!("user {}", describe(matcher)))),
        1 => Ok(users.remove(0)),
        n => Err(AppError::ambiguous(format!("user {}", describe(matcher)), n)),
    }
}

/// Resolve an author by global id.
pub async fn author_by_id(db: &dyn StorageClient, global_id: i64) -> Result<UserEntry> {
    find_one_user(db, &UserMatch::by_id(global_id)).await
}

fn describe(matcher: &UserMatch) -> String {
    match (&matcher.global_id, &matcher.handle) {
        (Some(id), _) => format!("id({id})"),
        (None, Some(handle)) => match &matcher.host {
            Some(host) => format!("{handle}@{host}"),
            None => handle.clone(),
        },
        (None, None) => "(any)".to_string(),
    }
}
