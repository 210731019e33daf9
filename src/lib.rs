// src/lib.rs

//! Syndication services: feed ingestion, view assembly, full-text search
//! and outbound RSS.

pub mod api;
pub mod crawler;
pub mod error;
pub mod feed;
pub mod models;
pub mod rss;
pub mod search;
pub mod storage;
pub mod utils;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;
