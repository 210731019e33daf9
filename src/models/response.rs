//! Structured results returned by the service surfaces.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{ShareObject, ViewObject};

/// Machine-checkable outcome of a request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    #[default]
    Ok,
    Error,
    /// The request was refused, e.g. a private user's feed
    Denied,
    AlreadyExists,
    NotFound,
}

/// Result of a call that carries no payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GeneralResponse {
    pub result_type: ResultCode,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl GeneralResponse {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn from_error(err: &AppError) -> Self {
        Self {
            result_type: err.result_code(),
            error: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchResponse {
    pub result_type: ResultCode,
    pub results: Vec<ViewObject>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Outcome of a per-user feed publication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RssResponse {
    pub result_type: ResultCode,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub feed: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl RssResponse {
    pub fn ok(feed: String) -> Self {
        Self {
            result_type: ResultCode::Ok,
            feed,
            message: String::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            result_type: ResultCode::Error,
            feed: String::new(),
            message: message.into(),
        }
    }

    pub fn denied(message: impl Into<String>) -> Self {
        Self {
            result_type: ResultCode::Denied,
            feed: String::new(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewFeedRequest {
    pub rss_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NewFeedResponse {
    pub result_type: ResultCode,
    #[serde(default)]
    pub global_id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FeedResponse {
    pub result_type: ResultCode,
    pub results: Vec<ViewObject>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SharesResponse {
    pub result_type: ResultCode,
    pub results: Vec<ShareObject>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}
