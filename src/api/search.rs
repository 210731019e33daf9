// src/api/search.rs

use std::sync::Arc;

use axum::extract::Query;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;

use crate::models::{GeneralResponse, PostEntry, SearchResponse};
use crate::search::SearchEngine;
use crate::storage::StorageClient;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// `GET /search?q=` and `POST /index`.
pub fn search_router(engine: Arc<SearchEngine>, db: Arc<dyn StorageClient>) -> Router {
    Router::new()
        .route("/search", get(handle_search))
        .route("/index", post(handle_index))
        .layer(Extension(engine))
        .layer(Extension(db))
}

async fn handle_search(
    Query(params): Query<SearchParams>,
    Extension(engine): Extension<Arc<SearchEngine>>,
) -> Json<SearchResponse> {
    let response = match engine.search(&params.q).await {
        Ok(results) => SearchResponse {
            results,
            ..SearchResponse::default()
        },
        Err(e) => {
            log::warn!("Search for {:?} failed: {}", params.q, e);
            SearchResponse {
                result_type: e.result_code(),
                error: e.to_string(),
                ..SearchResponse::default()
            }
        }
    };
    Json(response)
}

async fn handle_index(
    Extension(engine): Extension<Arc<SearchEngine>>,
    Extension(db): Extension<Arc<dyn StorageClient>>,
    Json(post): Json<PostEntry>,
) -> Json<GeneralResponse> {
    match engine.index_one(db.as_ref(), &post).await {
        Ok(id) => {
            log::debug!("Indexed post {}", id);
            Json(GeneralResponse::ok())
        }
        Err(e) => {
            log::warn!("Indexing post {} failed: {}", post.global_id, e);
            Json(GeneralResponse::from_error(&e))
        }
    }
}
