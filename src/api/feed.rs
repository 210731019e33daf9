// src/api/feed.rs

use std::sync::Arc;

use axum::extract::Path;
use axum::routing::get;
use axum::{Extension, Json, Router};

use crate::error::Result;
use crate::feed::FeedService;
use crate::models::{FeedResponse, SharesResponse, ViewObject};

/// `GET /feed`, `GET /feed/:username` and `GET /shares/:username`.
pub fn feed_router(service: Arc<FeedService>) -> Router {
    Router::new()
        .route("/feed", get(handle_global))
        .route("/feed/:username", get(handle_user))
        .route("/shares/:username", get(handle_shares))
        .layer(Extension(service))
}

fn feed_response(result: Result<Vec<ViewObject>>) -> Json<FeedResponse> {
    Json(match result {
        Ok(results) => FeedResponse {
            results,
            ..FeedResponse::default()
        },
        Err(e) => {
            log::warn!("Feed request failed: {}", e);
            FeedResponse {
                result_type: e.result_code(),
                error: e.to_string(),
                ..FeedResponse::default()
            }
        }
    })
}

async fn handle_global(Extension(service): Extension<Arc<FeedService>>) -> Json<FeedResponse> {
    feed_response(service.global_feed().await)
}

async fn handle_user(
    Path(username): Path<String>,
    Extension(service): Extension<Arc<FeedService>>,
) -> Json<FeedResponse> {
    feed_response(service.user_feed(&username).await)
}

async fn handle_shares(
    Path(username): Path<String>,
    Extension(service): Extension<Arc<FeedService>>,
) -> Json<SharesResponse> {
    Json(match service.user_shares(&username).await {
        Ok(results) => SharesResponse {
            results,
            ..SharesResponse::default()
        },
        Err(e) => {
            log::warn!("Shares request for {} failed: {}", username, e);
            SharesResponse {
                result_type: e.result_code(),
                error: e.to_string(),
                ..SharesResponse::default()
            }
        }
    })
}
