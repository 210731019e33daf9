// src/crawler/scheduler.rs

//! Fixed-period background polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::crawler::FeedCrawler;

/// Poll every registered feed once per `period` until `shutdown` flips.
///
/// The poll is awaited inside the loop, so a slow cycle delays the next tick
/// instead of overlapping it. Shutdown is observed between polls; a poll in
/// progress runs to completion.
pub async fn run_scheduler(
    crawler: Arc<FeedCrawler>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    log::info!("Feed scheduler started, polling every {:?}", period);

    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {
                match crawler.poll_all().await {
                    Ok(stats) => log::info!(
                        "Poll finished: {} sources ({} failed), {} items submitted, {} skipped in {}ms",
                        stats.sources,
                        stats.source_failures,
                        stats.items_submitted,
                        stats.items_failed,
                        (stats.finished - stats.started).num_milliseconds()
                    ),
                    Err(e) => log::error!("Poll failed to list feed sources: {}", e),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    log::info!("Feed scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::feed::{FeedItem, ParsedFeed};
    use crate::crawler::service::feed_source;
    use crate::models::{CrawlerConfig, PostMatch};
    use crate::storage::{MemoryStorage, StorageClient};
    use crate::testing::FakeFeedParser;

    const URL: &str = "https://example.org/rss";

    async fn setup() -> (Arc<MemoryStorage>, Arc<FeedCrawler>) {
        let db = Arc::new(MemoryStorage::new());
        db.insert_user(&feed_source(URL)).await.unwrap();
        let parser = FakeFeedParser::new().with_feed(
            URL,
            ParsedFeed {
                title: "t".into(),
                items: vec![FeedItem {
                    title: "item".into(),
                    ..FeedItem::default()
                }],
            },
        );
        let crawler = FeedCrawler::new(db.clone(), Arc::new(parser), CrawlerConfig::default());
        (db, Arc::new(crawler))
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_each_tick_and_stops_on_shutdown() {
        let (db, crawler) = setup().await;
        let (tx, rx) = watch::channel(false);
        let period = Duration::from_secs(60);
        let handle = tokio::spawn(run_scheduler(crawler, period, rx));

        // Nothing happens before the first period elapses.
        time::sleep(Duration::from_secs(30)).await;
        assert!(db.find_posts(&PostMatch::default()).await.unwrap().is_empty());

        time::sleep(Duration::from_secs(100)).await;
        assert_eq!(db.find_posts(&PostMatch::default()).await.unwrap().len(), 2);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_exits_when_sender_dropped() {
        let (_db, crawler) = setup().await;
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(run_scheduler(crawler, Duration::from_secs(3600), rx));
        drop(tx);
        handle.await.unwrap();
    }
}
