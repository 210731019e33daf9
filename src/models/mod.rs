// src/models/mod.rs

//! Domain models for the syndication services.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod content;
mod response;
mod view;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, LoggingConfig, RssConfig, SearchConfig, ServerConfig, StorageConfig,
};
pub use content::{
    InsertResult, PostEntry, PostMatch, ShareEntry, ShareMatch, Timestamp, UserEntry, UserMatch,
};
pub use response::{
    FeedResponse, GeneralResponse, NewFeedRequest, NewFeedResponse, ResultCode, RssResponse,
    SearchResponse, SharesResponse,
};
pub use view::{ShareObject, UserView, ViewObject};

/// Upper bound on view objects returned from any list conversion.
pub const MAX_ITEMS_RETURNED: usize = 50;
