//! Feed API request and response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Query parameters shared by every feed endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQuery {
    /// Id of the last post of the previous page
    pub cursor: Option<String>,
    /// Requested page size; clamped server-side
    pub limit: Option<usize>,
}

/// One feed page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPageResponse {
    pub records: Vec<PostRecordResponse>,
    pub pagination: PaginationResponse,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationResponse {
    /// Empty when there is nothing more to fetch
    pub next_cursor: String,
    pub limit: usize,
    pub total_matching_count: i64,
}

/// A decorated post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecordResponse {
    pub id: String,
    pub author: AuthorResponse,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub like_count: i64,
    pub viewer_liked: bool,
    pub comment_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repost_of_id: Option<String>,
    /// Embedded original; absent for plain posts and deleted originals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repost: Option<Box<PostRecordResponse>>,
}

/// Author display block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorResponse {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}
