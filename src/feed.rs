// src/feed.rs

//! Timelines built from stored posts and shares.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{PostMatch, ShareMatch, ShareObject, UserMatch, ViewObject};
use crate::storage::{StorageClient, find_one_user};
use crate::utils::parse_username;
use crate::view;

pub struct FeedService {
    db: Arc<dyn StorageClient>,
}

impl FeedService {
    pub fn new(db: Arc<dyn StorageClient>) -> Self {
        Self { db }
    }

    /// Every stored post, capped by view assembly.
    pub async fn global_feed(&self) -> Result<Vec<ViewObject>> {
        let posts = self.db.find_posts(&PostMatch::default()).await?;
        Ok(view::convert_posts(self.db.as_ref(), &posts).await)
    }

    /// Posts written by `username` (`"@alice"` or `"alice@host"`).
    pub async fn user_feed(&self, username: &str) -> Result<Vec<ViewObject>> {
        let author_id = self.resolve(username).await?;
        let posts = self.db.find_posts(&PostMatch::by_author(author_id)).await?;
        Ok(view::convert_posts(self.db.as_ref(), &posts).await)
    }

    /// Posts re-shared by `username`.
    pub async fn user_shares(&self, username: &str) -> Result<Vec<ShareObject>> {
        let sharer_id = self.resolve(username).await?;
        let shares = self.db.find_shares(&ShareMatch::by_sharer(sharer_id)).await?;
        Ok(view::convert_shares(self.db.as_ref(), &shares).await)
    }

    async fn resolve(&self, username: &str) -> Result<i64> {
        let (handle, host) = parse_username(username)?;
        let user = find_one_user(self.db.as_ref(), &UserMatch::by_handle(handle, host)).await?;
        Ok(user.global_id)
    }
}
