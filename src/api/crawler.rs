// src/api/crawler.rs

use std::sync::Arc;

use axum::routing::post;
use axum::{Extension, Json, Router};

use crate::crawler::FeedCrawler;
use crate::models::{NewFeedRequest, NewFeedResponse, ResultCode};

/// `POST /feeds` with `{"rss_url": ...}`.
pub fn crawler_router(crawler: Arc<FeedCrawler>) -> Router {
    Router::new()
        .route("/feeds", post(handle_new_feed))
        .layer(Extension(crawler))
}

async fn handle_new_feed(
    Extension(crawler): Extension<Arc<FeedCrawler>>,
    Json(req): Json<NewFeedRequest>,
) -> Json<NewFeedResponse> {
    let response = match crawler.register_feed(&req.rss_url).await {
        Ok(global_id) => NewFeedResponse {
            result_type: ResultCode::Ok,
            global_id,
            message: String::new(),
        },
        Err(e) => {
            log::warn!("Could not register feed {}: {}", req.rss_url, e);
            NewFeedResponse {
                result_type: ResultCode::Error,
                global_id: 0,
                message: e.to_string(),
            }
        }
    };
    Json(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::ParsedFeed;
    use crate::models::CrawlerConfig;
    use crate::storage::MemoryStorage;
    use crate::testing::{FakeFeedParser, spawn_app};

    #[tokio::test]
    async fn test_register_feed_over_http() {
        let url = "https://example.net/atom.xml";
        let parser = FakeFeedParser::new().with_feed(url, ParsedFeed::default());
        let crawler = Arc::new(FeedCrawler::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(parser),
            CrawlerConfig::default(),
        ));
        let (base, _stop) = spawn_app(crawler_router(crawler)).await;
        let client = reqwest::Client::new();

        let ok: NewFeedResponse = client
            .post(format!("{base}/feeds"))
            .json(&NewFeedRequest {
                rss_url: url.into(),
            })
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(ok.result_type, ResultCode::Ok);
        assert!(ok.global_id > 0);

        let bad: NewFeedResponse = client
            .post(format!("{base}/feeds"))
            .json(&NewFeedRequest {
                rss_url: "https://example.net/missing".into(),
            })
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(bad.result_type, ResultCode::Error);
        assert!(!bad.message.is_empty());
    }
}
