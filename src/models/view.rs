//! Consumer-facing projections of stored content.

use serde::{Deserialize, Serialize};

/// A post enriched with its author's details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ViewObject {
    pub global_id: i64,
    pub author: String,
    pub author_display: String,
    pub author_host: Option<String>,
    pub author_id: i64,
    pub title: String,
    pub bio: String,
    pub body: String,
    pub md_body: String,
    pub image: String,
    pub likes_count: i64,
    pub shares_count: i64,
    pub is_liked: bool,
    pub is_shared: bool,
    pub is_followed: bool,
    /// Formatted creation time
    pub published: String,
    pub tags: Vec<String>,
    pub summary: String,
}

/// A re-share carrying both the original author and the sharer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ShareObject {
    pub global_id: i64,
    pub author: String,
    pub author_display: String,
    pub author_host: Option<String>,
    pub author_id: i64,
    pub title: String,
    pub bio: String,
    pub body: String,
    pub image: String,
    pub likes_count: i64,
    pub shares_count: i64,
    pub is_liked: bool,
    pub is_shared: bool,
    pub is_followed: bool,
    pub published: String,
    pub tags: Vec<String>,
    pub summary: String,
    pub sharer: String,
    pub sharer_host: Option<String>,
    pub sharer_bio: String,
    /// Formatted time of the share itself
    pub share_datetime: String,
}

/// A user stripped of storage-only fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserView {
    pub global_id: i64,
    pub handle: String,
    pub host: Option<String>,
    pub display_name: String,
    pub bio: String,
    pub is_followed: bool,
    pub private: bool,
    pub custom_css: String,
}
