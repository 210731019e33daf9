//! Test doubles shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::api::server::serve_listener;
use crate::crawler::{FeedParser, ParsedFeed};
use crate::error::{AppError, Result};
use crate::models::{
    InsertResult, PostEntry, PostMatch, ShareEntry, ShareMatch, UserEntry, UserMatch,
};
use crate::storage::{MemoryStorage, StorageClient};

/// [`MemoryStorage`] wrapper that can be told to fail and counts post finds.
pub struct FlakyStorage {
    inner: MemoryStorage,
    fail_user_finds: AtomicBool,
    fail_post_finds: AtomicBool,
    post_find_calls: AtomicUsize,
    rejected_titles: Mutex<HashSet<String>>,
}

impl FlakyStorage {
    pub fn new(inner: MemoryStorage) -> Self {
        Self {
            inner,
            fail_user_finds: AtomicBool::new(false),
            fail_post_finds: AtomicBool::new(false),
            post_find_calls: AtomicUsize::new(0),
            rejected_titles: Mutex::new(HashSet::new()),
        }
    }

    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }

    pub fn fail_user_finds(&self, fail: bool) {
        self.fail_user_finds.store(fail, Ordering::SeqCst);
    }

    pub fn fail_post_finds(&self, fail: bool) {
        self.fail_post_finds.store(fail, Ordering::SeqCst);
    }

    /// Make `insert_post` fail for posts with this title.
    pub fn reject_title(&self, title: &str) {
        self.rejected_titles.lock().unwrap().insert(title.to_string());
    }

    pub fn post_find_calls(&self) -> usize {
        self.post_find_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageClient for FlakyStorage {
    async fn find_users(&self, matcher: &UserMatch) -> Result<Vec<UserEntry>> {
        if self.fail_user_finds.load(Ordering::SeqCst) {
            return Err(AppError::upstream("storage", "users/find unavailable"));
        }
        self.inner.find_users(matcher).await
    }

    async fn find_posts(&self, matcher: &PostMatch) -> Result<Vec<PostEntry>> {
        self.post_find_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_post_finds.load(Ordering::SeqCst) {
            return Err(AppError::upstream("storage", "posts/find unavailable"));
        }
        self.inner.find_posts(matcher).await
    }

    async fn find_shares(&self, matcher: &ShareMatch) -> Result<Vec<ShareEntry>> {
        self.inner.find_shares(matcher).await
    }

    async fn insert_user(&self, entry: &UserEntry) -> Result<InsertResult> {
        self.inner.insert_user(entry).await
    }

    async fn insert_post(&self, entry: &PostEntry) -> Result<InsertResult> {
        let rejected = self.rejected_titles.lock().unwrap().contains(&entry.title);
        if rejected {
            return Err(AppError::upstream("storage", "posts/insert rejected"));
        }
        self.inner.insert_post(entry).await
    }
}

/// Feed parser answering from a fixed URL table. Unknown URLs fail to parse.
/// Tracks how many parses overlap.
#[derive(Default)]
pub struct FakeFeedParser {
    feeds: HashMap<String, ParsedFeed>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeFeedParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, url: &str, feed: ParsedFeed) -> Self {
        self.feeds.insert(url.to_string(), feed);
        self
    }

    /// Sleep this long inside every parse.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Highest number of parses seen running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedParser for FakeFeedParser {
    async fn parse_url(&self, url: &str) -> Result<ParsedFeed> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.feeds
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::feed_parse(url, "not a feed"))
    }
}

/// Serve `app` on an ephemeral local port. Returns the base URL and the
/// shutdown sender; dropping the sender stops the server.
pub async fn spawn_app(app: Router) -> (String, watch::Sender<bool>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = watch::channel(false);
    tokio::spawn(serve_listener(listener, app, rx));
    (base, tx)
}
