// src/storage/http.rs

//! JSON-over-HTTP client for the storage service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{
    InsertResult, PostEntry, PostMatch, ResultCode, ShareEntry, ShareMatch, StorageConfig,
    UserEntry, UserMatch,
};
use crate::storage::StorageClient;

const SERVICE: &str = "storage";

#[derive(Debug, Deserialize)]
struct FindResponse<T> {
    result_type: ResultCode,
    #[serde(default)]
    error: String,
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct InsertResponse {
    result_type: ResultCode,
    #[serde(default)]
    error: String,
    #[serde(default)]
    global_id: i64,
}

/// Storage client speaking JSON over HTTP.
///
/// Point lookups and inserts use the short timeout, post listings the bulk
/// one. A timeout surfaces as [`AppError::Http`]; nothing is retried.
#[derive(Clone)]
pub struct HttpStorageClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
    bulk_timeout: Duration,
}

impl HttpStorageClient {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let client = Client::builder().timeout(config.bulk_timeout()).build()?;

        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
            timeout: config.timeout(),
            bulk_timeout: config.bulk_timeout(),
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B, timeout: Duration) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.base_url.join(path)?;
        log::debug!("storage call {}", url);
        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn find<B, T>(&self, path: &str, matcher: &B, timeout: Duration) -> Result<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp: FindResponse<T> = self.post(path, matcher, timeout).await?;
        if resp.result_type != ResultCode::Ok {
            return Err(AppError::upstream(
                SERVICE,
                format!("{path} failed: {}", resp.error),
            ));
        }
        Ok(resp.results)
    }

    async fn insert<B>(&self, path: &str, entry: &B) -> Result<InsertResult>
    where
        B: Serialize + ?Sized,
    {
        let resp: InsertResponse = self.post(path, entry, self.timeout).await?;
        if resp.result_type != ResultCode::Ok {
            return Err(AppError::upstream(
                SERVICE,
                format!("{path} failed: {}", resp.error),
            ));
        }
        Ok(InsertResult {
            global_id: resp.global_id,
        })
    }
}

#[async_trait]
impl StorageClient for HttpStorageClient {
    async fn find_users(&self, matcher: &UserMatch) -> Result<Vec<UserEntry>> {
        self.find("users/find", matcher, self.timeout).await
    }

    async fn find_posts(&self, matcher: &PostMatch) -> Result<Vec<PostEntry>> {
        self.find("posts/find", matcher, self.bulk_timeout).await
    }

    async fn find_shares(&self, matcher: &ShareMatch) -> Result<Vec<ShareEntry>> {
        self.find("shares/find", matcher, self.bulk_timeout).await
    }

    async fn insert_user(&self, entry: &UserEntry) -> Result<InsertResult> {
        self.insert("users/insert", entry).await
    }

    async fn insert_post(&self, entry: &PostEntry) -> Result<InsertResult> {
        self.insert("posts/insert", entry).await
    }
}
