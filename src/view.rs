// src/view.rs

//! View assembly.
//!
//! Turns stored rows into enriched, consumer-ready view objects. Used by the
//! search engine, the feed service and the RSS publisher.
//!
//! Conversions never fail as a whole: a row whose author cannot be resolved
//! is logged and dropped, and the rest of the batch continues. At most
//! [`MAX_ITEMS_RETURNED`] input rows are considered.

use chrono::Utc;
use futures::future;
use futures::stream::{self, StreamExt};

use crate::models::{
    MAX_ITEMS_RETURNED, PostEntry, ShareEntry, ShareObject, Timestamp, UserEntry, UserView,
    ViewObject,
};
use crate::storage::{StorageClient, author_by_id};

/// Image used when a post carries none.
pub const DEFAULT_IMAGE: &str =
    "https://upload.wikimedia.org/wikipedia/commons/8/89/Portrait_Placeholder.png";

/// Format of `published` / `share_datetime`.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

const TAG_DELIMITER: char = '|';
const ESCAPED_DELIMITER: &str = "%7C";

/// Author lookups in flight per batch.
const LOOKUP_CONCURRENCY: usize = 8;

/// Convert post rows, preserving input order.
pub async fn convert_posts(db: &dyn StorageClient, posts: &[PostEntry]) -> Vec<ViewObject> {
    let mut lookups = stream::iter(posts.iter().take(MAX_ITEMS_RETURNED).cloned())
        .map(|post| async move {
            let author = author_by_id(db, post.author_id).await;
            (post, author)
        })
        .buffered(LOOKUP_CONCURRENCY);

    let mut views = Vec::new();
    while let Some((post, author)) = lookups.next().await {
        match author {
            Ok(author) => views.push(view_object(&post, &author)),
            Err(e) => log::warn!("Skipping post {}: {}", post.global_id, e),
        }
    }
    views
}

/// Convert share rows; both the author and the sharer must resolve.
pub async fn convert_shares(db: &dyn StorageClient, shares: &[ShareEntry]) -> Vec<ShareObject> {
    let mut lookups = stream::iter(shares.iter().take(MAX_ITEMS_RETURNED).cloned())
        .map(|share| async move {
            let people = future::try_join(
                author_by_id(db, share.post.author_id),
                author_by_id(db, share.sharer_id),
            )
            .await;
            (share, people)
        })
        .buffered(LOOKUP_CONCURRENCY);

    let mut views = Vec::new();
    while let Some((share, people)) = lookups.next().await {
        match people {
            Ok((author, sharer)) => views.push(share_object(&share, &author, &sharer)),
            Err(e) => log::warn!(
                "Skipping share of post {} by {}: {}",
                share.post.global_id,
                share.sharer_id,
                e
            ),
        }
    }
    views
}

/// Strip storage-only fields from users.
pub fn convert_users(users: &[UserEntry]) -> Vec<UserView> {
    users
        .iter()
        .take(MAX_ITEMS_RETURNED)
        .map(strip_user)
        .collect()
}

pub fn strip_user(user: &UserEntry) -> UserView {
    UserView {
        global_id: user.global_id,
        handle: user.handle.clone(),
        host: user.host.clone(),
        display_name: user.display_name.clone(),
        bio: user.bio.clone(),
        is_followed: user.is_followed,
        private: user.private,
        custom_css: user.custom_css.clone(),
    }
}

/// Split a `|`-delimited tag string, dropping empty tags.
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(TAG_DELIMITER)
        .filter(|tag| !tag.is_empty())
        .map(|tag| tag.replace(ESCAPED_DELIMITER, "|"))
        .collect()
}

/// Format a stored timestamp; an absent or out-of-range one becomes now.
pub fn format_timestamp(ts: Option<Timestamp>) -> String {
    match ts.and_then(Timestamp::to_datetime) {
        Some(dt) => dt.format(TIME_FORMAT).to_string(),
        None => {
            log::debug!("Unconvertible timestamp {:?}, using current time", ts);
            Utc::now().format(TIME_FORMAT).to_string()
        }
    }
}

fn view_object(post: &PostEntry, author: &UserEntry) -> ViewObject {
    ViewObject {
        global_id: post.global_id,
        author: author.handle.clone(),
        author_display: author.display_name.clone(),
        author_host: author.host.clone(),
        author_id: post.author_id,
        title: post.title.clone(),
        bio: author.bio.clone(),
        body: post.body.clone(),
        md_body: post.md_body.clone(),
        image: DEFAULT_IMAGE.to_string(),
        likes_count: post.likes_count,
        shares_count: post.shares_count,
        is_liked: post.is_liked,
        is_shared: post.is_shared,
        is_followed: post.is_followed,
        published: format_timestamp(post.creation_datetime),
        tags: split_tags(&post.tags),
        summary: post.summary.clone(),
    }
}

fn share_object(share: &ShareEntry, author: &UserEntry, sharer: &UserEntry) -> ShareObject {
    let post = &share.post;
    ShareObject {
        global_id: post.global_id,
        author: author.handle.clone(),
        author_display: author.display_name.clone(),
        author_host: author.host.clone(),
        author_id: author.global_id,
        title: post.title.clone(),
        bio: author.bio.clone(),
        body: post.body.clone(),
        image: DEFAULT_IMAGE.to_string(),
        likes_count: post.likes_count,
        shares_count: post.shares_count,
        is_liked: post.is_liked,
        is_shared: post.is_shared,
        is_followed: post.is_followed,
        published: format_timestamp(post.creation_datetime),
        tags: split_tags(&post.tags),
        summary: post.summary.clone(),
        sharer: sharer.handle.clone(),
        sharer_host: sharer.host.clone(),
        sharer_bio: sharer.bio.clone(),
        share_datetime: format_timestamp(share.announce_datetime),
    }
}
