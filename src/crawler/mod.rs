//! Ingestion of external syndicated feeds.
//!
//! - `feed`: fetching and parsing RSS/Atom documents
//! - `service`: feed registration and the poll cycle
//! - `scheduler`: the background task driving polls

pub mod feed;
pub mod scheduler;
pub mod service;

pub use feed::{FeedItem, FeedParser, HttpFeedParser, ParsedFeed};
pub use scheduler::run_scheduler;
pub use service::{FeedCrawler, ItemStats, PollStats};
