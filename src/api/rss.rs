// src/api/rss.rs

use std::sync::Arc;

use axum::extract::Path;
use axum::routing::get;
use axum::{Extension, Json, Router};

use crate::models::RssResponse;
use crate::rss::RssPublisher;

/// `GET /rss/:user_id`.
pub fn rss_router(publisher: Arc<RssPublisher>) -> Router {
    Router::new()
        .route("/rss/:user_id", get(handle_user_feed))
        .layer(Extension(publisher))
}

async fn handle_user_feed(
    Path(user_id): Path<i64>,
    Extension(publisher): Extension<Arc<RssPublisher>>,
) -> Json<RssResponse> {
    Json(publisher.publish_user_feed(user_id).await)
}
