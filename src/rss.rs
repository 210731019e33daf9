// src/rss.rs

//! Outbound RSS 2.0 documents for a single user.

use std::fmt::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{PostEntry, PostMatch, RssConfig, RssResponse, UserEntry};
use crate::storage::{StorageClient, author_by_id};
use crate::utils::normalise_host;

/// Maximum items in one document.
pub const RSS_MAX_ITEMS: usize = 10;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>"#;

/// Channel header of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct RssChannel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: DateTime<Utc>,
    pub items: Vec<RssItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RssItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: DateTime<Utc>,
}

impl RssChannel {
    /// Serialize as an RSS 2.0 document. All text is escaped.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(512 + self.items.len() * 512);
        out.push_str(XML_DECLARATION);
        out.push_str(r#"<rss version="2.0"><channel>"#);
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "<title>{}</title><link>{}</link><description>{}</description><pubDate>{}</pubDate>",
            escape(&self.title),
            escape(&self.link),
            escape(&self.description),
            self.pub_date.to_rfc2822()
        );
        for item in &self.items {
            let _ = write!(
                out,
                "<item><title>{}</title><link>{}</link><description>{}</description><pubDate>{}</pubDate></item>",
                escape(&item.title),
                escape(&item.link),
                escape(&item.description),
                item.pub_date.to_rfc2822()
            );
        }
        out.push_str("</channel></rss>");
        out
    }
}

/// Builds per-user RSS documents from stored posts.
pub struct RssPublisher {
    db: Arc<dyn StorageClient>,
    config: RssConfig,
}

impl RssPublisher {
    pub fn new(db: Arc<dyn StorageClient>, config: RssConfig) -> Self {
        Self { db, config }
    }

    /// Publish the feed of `user_id`.
    ///
    /// Unknown or ambiguous users and storage failures give `ERROR`; a
    /// private user gives `DENIED` before any post is fetched.
    pub async fn publish_user_feed(&self, user_id: i64) -> RssResponse {
        let user = match author_by_id(self.db.as_ref(), user_id).await {
            Ok(user) => user,
            Err(e) => {
                log::warn!("RSS request for user {}: {}", user_id, e);
                return RssResponse::error(format!("Could not find user {user_id}: {e}"));
            }
        };

        if user.private {
            log::info!("RSS request for private user @{} denied", user.handle);
            return RssResponse::denied(format!("User @{} is private", user.handle));
        }

        match self.user_channel(&user).await {
            Ok(channel) => RssResponse::ok(channel.render()),
            Err(e) => {
                log::warn!("RSS posts for @{} unavailable: {}", user.handle, e);
                RssResponse::error(format!("Could not load posts for @{}: {e}", user.handle))
            }
        }
    }

    async fn user_channel(&self, user: &UserEntry) -> Result<RssChannel> {
        let mut posts = self.db.find_posts(&PostMatch::by_author(user.global_id)).await?;
        select_posts(&mut posts);

        let now = Utc::now();
        let base = self.user_link(&user.handle);
        let items = posts
            .iter()
            .map(|post| RssItem {
                title: post.title.clone(),
                link: format!("{base}/{}", post.global_id),
                description: if post.md_body.is_empty() {
                    post.body.clone()
                } else {
                    post.md_body.clone()
                },
                pub_date: post
                    .creation_datetime
                    .and_then(|t| t.to_datetime())
                    .unwrap_or(now),
            })
            .collect();

        Ok(RssChannel {
            title: format!("{} blog for {}", self.config.site_name, user.handle),
            link: base,
            description: user.bio.clone(),
            pub_date: now,
            items,
        })
    }

    fn user_link(&self, handle: &str) -> String {
        let host = normalise_host(&self.config.hostname);
        format!("{}/c2s/@{}", host.trim_end_matches('/'), handle)
    }
}

/// Stable ascending sort by creation second, then keep the first
/// [`RSS_MAX_ITEMS`]: the oldest posts, not the newest.
fn select_posts(posts: &mut Vec<PostEntry>) {
    posts.sort_by_key(|p| p.creation_datetime.map(|t| t.seconds));
    posts.truncate(RSS_MAX_ITEMS);
}

/// Escape the five XML special characters.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResultCode, Timestamp};
    use crate::storage::MemoryStorage;
    use crate::storage::memory::Snapshot;
    use crate::testing::FlakyStorage;

    async fn add_user(db: &MemoryStorage, handle: &str, private: bool) -> i64 {
        db.insert_user(&UserEntry {
            handle: handle.to_string(),
            bio: format!("{handle}'s bio"),
            private,
            ..UserEntry::default()
        })
        .await
        .unwrap()
        .global_id
    }

    async fn add_post(db: &MemoryStorage, author_id: i64, title: &str, seconds: i64) {
        db.insert_post(&PostEntry {
            author_id,
            title: title.to_string(),
            md_body: format!("body of {title}"),
            creation_datetime: Some(Timestamp { seconds, nanos: 0 }),
            ..PostEntry::default()
        })
        .await
        .unwrap();
    }

    fn publisher(db: Arc<dyn StorageClient>) -> RssPublisher {
        RssPublisher::new(
            db,
            RssConfig {
                hostname: "https://rabble.example/".into(),
                site_name: "Rabble".into(),
            },
        )
    }

    #[tokio::test]
    async fn test_publish_renders_header_and_items() {
        let db = Arc::new(MemoryStorage::new());
        let id = add_user(&db, "alice", false).await;
        add_post(&db, id, "hello", 1_500_000_000).await;

        let resp = publisher(db).publish_user_feed(id).await;
        assert_eq!(resp.result_type, ResultCode::Ok);
        let feed = resp.feed;
        assert!(feed.starts_with(r#"<?xml version="1.0" encoding="UTF-8" ?><rss version="2.0"><channel>"#));
        assert!(feed.ends_with("</channel></rss>"));
        assert!(feed.contains("<title>Rabble blog for alice</title>"));
        assert!(feed.contains("<link>https://rabble.example/c2s/@alice</link>"));
        assert!(feed.contains("<description>alice&apos;s bio</description>"));
        assert!(feed.contains("<link>https://rabble.example/c2s/@alice/2</link>"));
        assert!(feed.contains("<description>body of hello</description>"));
        assert!(feed.contains("<pubDate>Fri, 14 Jul 2017 02:40:00 +0000</pubDate>"));
    }

    #[tokio::test]
    async fn test_private_user_denied_without_fetching_posts() {
        let db = Arc::new(FlakyStorage::new(MemoryStorage::new()));
        let id = add_user(db.inner(), "hidden", true).await;
        add_post(db.inner(), id, "secret", 1).await;

        let resp = publisher(db.clone()).publish_user_feed(id).await;
        assert_eq!(resp.result_type, ResultCode::Denied);
        assert!(resp.feed.is_empty());
        assert_eq!(db.post_find_calls(), 0);
    }

    #[tokio::test]
    async fn test_keeps_the_oldest_ten() {
        let db = Arc::new(MemoryStorage::new());
        let id = add_user(&db, "prolific", false).await;
        // Inserted newest first so storage order differs from time order.
        for i in (0..15).rev() {
            add_post(&db, id, &format!("post-{i:02}"), 1_000 + i).await;
        }

        let feed = publisher(db).publish_user_feed(id).await.feed;
        assert_eq!(feed.matches("<item>").count(), RSS_MAX_ITEMS);
        for i in 0..10 {
            assert!(feed.contains(&format!("<title>post-{i:02}</title>")));
        }
        for i in 10..15 {
            assert!(!feed.contains(&format!("<title>post-{i:02}</title>")));
        }
        let first = feed.find("post-00").unwrap();
        let last = feed.find("post-09").unwrap();
        assert!(first < last);
    }

    #[test]
    fn test_sort_is_stable_for_equal_seconds() {
        let mut posts: Vec<PostEntry> = ["b", "a", "c"]
            .iter()
            .map(|title| PostEntry {
                title: title.to_string(),
                creation_datetime: Some(Timestamp {
                    seconds: 5,
                    nanos: 0,
                }),
                ..PostEntry::default()
            })
            .collect();
        select_posts(&mut posts);
        let titles: Vec<&str> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_unknown_user_is_error() {
        let resp = publisher(Arc::new(MemoryStorage::new()))
            .publish_user_feed(42)
            .await;
        assert_eq!(resp.result_type, ResultCode::Error);
        assert!(!resp.message.is_empty());
    }

    #[tokio::test]
    async fn test_ambiguous_user_is_error() {
        let twin = UserEntry {
            global_id: 3,
            handle: "twin".into(),
            ..UserEntry::default()
        };
        let db = MemoryStorage::from_snapshot(Snapshot {
            users: vec![twin.clone(), twin],
            ..Snapshot::default()
        });
        let resp = publisher(Arc::new(db)).publish_user_feed(3).await;
        assert_eq!(resp.result_type, ResultCode::Error);
    }

    #[tokio::test]
    async fn test_post_fetch_failure_is_error() {
        let db = Arc::new(FlakyStorage::new(MemoryStorage::new()));
        let id = add_user(db.inner(), "alice", false).await;
        db.fail_post_finds(true);

        let resp = publisher(db).publish_user_feed(id).await;
        assert_eq!(resp.result_type, ResultCode::Error);
    }

    #[tokio::test]
    async fn test_user_without_posts_gets_empty_channel() {
        let db = Arc::new(MemoryStorage::new());
        let id = add_user(&db, "quiet", false).await;
        let resp = publisher(db).publish_user_feed(id).await;
        assert_eq!(resp.result_type, ResultCode::Ok);
        assert!(!resp.feed.contains("<item>"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&apos;s&lt;/a&gt;"
        );
    }
}
