// src/crawler/feed.rs

//! Fetching and parsing external syndicated feeds (RSS 2.0 / Atom).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;
use crate::utils::http;

/// A parsed external feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    pub title: String,
    pub items: Vec<FeedItem>,
}

/// One entry of an external feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub content: String,
    pub description: String,
    pub link: Option<String>,
    /// Publication time; `updated` for Atom entries without `published`
    pub published: Option<DateTime<Utc>>,
}

impl FeedItem {
    /// Full content when present, otherwise the description.
    pub fn body(&self) -> &str {
        if self.content.is_empty() {
            &self.description
        } else {
            &self.content
        }
    }
}

/// Turns a feed URL into a parsed feed. Has no side effects on this system.
#[async_trait]
pub trait FeedParser: Send + Sync {
    async fn parse_url(&self, url: &str) -> Result<ParsedFeed>;
}

/// Feed parser fetching over HTTP.
pub struct HttpFeedParser {
    client: Client,
}

impl HttpFeedParser {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_async_client(config)?,
        })
    }
}

#[async_trait]
impl FeedParser for HttpFeedParser {
    async fn parse_url(&self, url: &str) -> Result<ParsedFeed> {
        let bytes = http::fetch_bytes(&self.client, url)
            .await
            .map_err(|e| AppError::feed_parse(url, e))?;
        parse_bytes(url, &bytes)
    }
}

/// Parse a raw RSS or Atom document.
pub fn parse_bytes(url: &str, bytes: &[u8]) -> Result<ParsedFeed> {
    let feed = feed_rs::parser::parse(bytes).map_err(|e| AppError::feed_parse(url, e))?;

    let items = feed
        .entries
        .into_iter()
        .map(|entry| FeedItem {
            title: entry.title.map(|t| t.content).unwrap_or_default(),
            content: entry
                .content
                .and_then(|c| c.body)
                .unwrap_or_default(),
            description: entry.summary.map(|t| t.content).unwrap_or_default(),
            link: entry.links.into_iter().next().map(|l| l.href),
            published: entry.published.or(entry.updated),
        })
        .collect();

    Ok(ParsedFeed {
        title: feed.title.map(|t| t.content).unwrap_or_default(),
        items,
    })
}
