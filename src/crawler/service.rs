// src/crawler/service.rs

//! Feed registration and polling.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use crate::crawler::feed::{FeedItem, FeedParser, ParsedFeed};
use crate::error::{AppError, Result};
use crate::models::{CrawlerConfig, PostEntry, Timestamp, UserEntry, UserMatch};
use crate::storage::StorageClient;
use crate::utils::handle_from_url;

/// Outcome of submitting the items of one feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemStats {
    pub submitted: usize,
    pub failed: usize,
}

/// Summary of one poll cycle.
#[derive(Debug, Clone)]
pub struct PollStats {
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub sources: usize,
    pub source_failures: usize,
    pub items_submitted: usize,
    pub items_failed: usize,
}

/// Registers external feeds and re-ingests their items.
pub struct FeedCrawler {
    db: Arc<dyn StorageClient>,
    parser: Arc<dyn FeedParser>,
    config: CrawlerConfig,
    poll_guard: Mutex<()>,
}

impl FeedCrawler {
    pub fn new(
        db: Arc<dyn StorageClient>,
        parser: Arc<dyn FeedParser>,
        config: CrawlerConfig,
    ) -> Self {
        Self {
            db,
            parser,
            config,
            poll_guard: Mutex::new(()),
        }
    }

    /// Parse `url`, create its feed source and submit every item.
    ///
    /// Parsing happens before anything is written, so a bad URL leaves no
    /// trace in storage. Item failures are logged and do not fail the call.
    pub async fn register_feed(&self, url: &str) -> Result<i64> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::validation("rss_url is empty"));
        }

        let feed = self.parser.parse_url(url).await?;
        let source = feed_source(url);
        let global_id = self.db.insert_user(&source).await?.global_id;
        log::info!(
            "Registered feed {} as @{} (id {})",
            url,
            source.handle,
            global_id
        );

        let stats = self.submit_items(global_id, &feed).await;
        log::info!(
            "Submitted {} items from {} ({} failed)",
            stats.submitted,
            url,
            stats.failed
        );
        Ok(global_id)
    }

    /// Re-fetch every registered feed and submit all of its items.
    ///
    /// Only listing the sources can fail; a feed that cannot be fetched or
    /// parsed is counted and skipped. Concurrent callers queue on the poll
    /// guard.
    pub async fn poll_all(&self) -> Result<PollStats> {
        let _guard = self.poll_guard.lock().await;
        let started = Utc::now();

        let sources: Vec<UserEntry> = self
            .db
            .find_users(&UserMatch {
                host_is_null: true,
                ..UserMatch::default()
            })
            .await?
            .into_iter()
            .filter(|u| u.rss.as_deref().is_some_and(|r| !r.is_empty()))
            .collect();

        let mut stats = PollStats {
            started,
            finished: started,
            sources: sources.len(),
            source_failures: 0,
            items_submitted: 0,
            items_failed: 0,
        };

        let mut polls = stream::iter(sources)
            .map(|source| async move {
                let result = self.poll_source(&source).await;
                (source, result)
            })
            .buffer_unordered(self.config.max_concurrent.max(1));

        while let Some((source, result)) = polls.next().await {
            match result {
                Ok(items) => {
                    stats.items_submitted += items.submitted;
                    stats.items_failed += items.failed;
                }
                Err(e) => {
                    stats.source_failures += 1;
                    log::warn!("Failed to poll feed for @{}: {}", source.handle, e);
                }
            }
        }

        stats.finished = Utc::now();
        Ok(stats)
    }

    async fn poll_source(&self, source: &UserEntry) -> Result<ItemStats> {
        let url = source.rss.as_deref().unwrap_or_default();
        let feed = self.parser.parse_url(url).await?;
        Ok(self.submit_items(source.global_id, &feed).await)
    }

    async fn submit_items(&self, author_id: i64, feed: &ParsedFeed) -> ItemStats {
        let mut stats = ItemStats::default();
        for item in &feed.items {
            match self.db.insert_post(&item_to_post(author_id, item)).await {
                Ok(_) => stats.submitted += 1,
                Err(e) => {
                    stats.failed += 1;
                    log::warn!("Skipping item {:?} for source {}: {}", item.title, author_id, e);
                }
            }
        }
        stats
    }
}

/// Local identity standing in for an external feed.
pub fn feed_source(url: &str) -> UserEntry {
    let handle = handle_from_url(url);
    UserEntry {
        bio: format!("RSS/Atom feed from {handle} converted to a local user"),
        display_name: handle.clone(),
        handle,
        host: None,
        rss: Some(url.to_string()),
        private: true,
        ..UserEntry::default()
    }
}

/// Content row for one feed item. An item without a date is stamped now.
pub fn item_to_post(author_id: i64, item: &FeedItem) -> PostEntry {
    let body = item.body().to_string();
    let creation = item
        .published
        .map(Timestamp::from_datetime)
        .unwrap_or_else(Timestamp::now);
    PostEntry {
        author_id,
        title: item.title.clone(),
        md_body: body.clone(),
        body,
        creation_datetime: Some(creation),
        ..PostEntry::default()
    }
}
