//! Stored content and identity rows exchanged with the storage service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wire timestamp as stored by the storage service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Timestamp {
    pub seconds: i64,
    #[serde(default)]
    pub nanos: u32,
}

impl Timestamp {
    /// Convert to a chrono datetime; `None` when out of range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        }
    }

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }
}

/// A unit of published content.
///
/// `is_liked`, `is_shared` and `is_followed` are relative to the requesting
/// user, not intrinsic to the item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PostEntry {
    /// Assigned by storage; ignored on insert
    #[serde(default)]
    pub global_id: i64,
    pub author_id: i64,
    #[serde(default)]
    pub title: String,
    /// Rendered body
    #[serde(default)]
    pub body: String,
    /// Markdown / source body
    #[serde(default)]
    pub md_body: String,
    #[serde(default)]
    pub creation_datetime: Option<Timestamp>,
    /// Tags joined with `|`; a literal `|` inside a tag is `%7C`
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub shares_count: i64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub is_followed: bool,
}

/// A re-share of a post by another user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ShareEntry {
    #[serde(flatten)]
    pub post: PostEntry,
    pub sharer_id: i64,
    #[serde(default)]
    pub announce_datetime: Option<Timestamp>,
}

/// An author, local (`host == None`) or remote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserEntry {
    #[serde(default)]
    pub global_id: i64,
    pub handle: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub bio: String,
    /// Source URL when the user stands in for an external feed
    #[serde(default)]
    pub rss: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub is_followed: bool,
    #[serde(default)]
    pub custom_css: String,
}

/// Result of an insert call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsertResult {
    pub global_id: i64,
}

/// User match request. Unset fields are not filtered on.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UserMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Restrict to local users
    #[serde(default)]
    pub host_is_null: bool,
}

impl UserMatch {
    pub fn by_id(global_id: i64) -> Self {
        Self {
            global_id: Some(global_id),
            ..Self::default()
        }
    }

    /// Match on handle; a missing host selects local users only.
    pub fn by_handle(handle: impl Into<String>, host: Option<String>) -> Self {
        let host_is_null = host.is_none();
        Self {
            handle: Some(handle.into()),
            host,
            host_is_null,
            ..Self::default()
        }
    }

    pub fn matches(&self, user: &UserEntry) -> bool {
        if self.global_id.is_some_and(|id| id != user.global_id) {
            return false;
        }
        if self.handle.as_ref().is_some_and(|h| *h != user.handle) {
            return false;
        }
        if let Some(host) = &self.host {
            if user.host.as_ref() != Some(host) {
                return false;
            }
        }
        if self.host_is_null && user.host.is_some() {
            return false;
        }
        true
    }
}

/// Post match request. Unset fields are not filtered on.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PostMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<i64>,
}

impl PostMatch {
    pub fn by_author(author_id: i64) -> Self {
        Self {
            author_id: Some(author_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, post: &PostEntry) -> bool {
        self.global_id.is_none_or(|id| id == post.global_id)
            && self.author_id.is_none_or(|id| id == post.author_id)
    }
}

/// Share match request. Unset fields are not filtered on.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ShareMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharer_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_id: Option<i64>,
}

impl ShareMatch {
    pub fn by_sharer(sharer_id: i64) -> Self {
        Self {
            sharer_id: Some(sharer_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, share: &ShareEntry) -> bool {
        self.sharer_id.is_none_or(|id| id == share.sharer_id)
            && self.global_id.is_none_or(|id| id == share.post.global_id)
    }
}
