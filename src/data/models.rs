//! Data models
//!
//! Rust structs representing database entities.
//! Post IDs are UUID v4 strings, timestamps are chrono UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum post content length, in characters
pub const MAX_CONTENT_CHARS: usize = 256;

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (UUID v4, hyphenated lowercase)
///
/// Example: "67e55044-10b1-426f-9247-bb680e5fe0c8"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new random ID
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Parse a client-supplied ID, normalizing it to the stored form.
    ///
    /// Returns `None` for anything that is not a UUID.
    pub fn parse(raw: &str) -> Option<Self> {
        uuid::Uuid::parse_str(raw.trim())
            .ok()
            .map(|id| Self(id.to_string()))
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a timestamp in the fixed-width form used for storage.
///
/// Microsecond precision and a literal `Z` keep text ordering equal to
/// chronological ordering inside SQLite.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

// =============================================================================
// Users
// =============================================================================

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub username: String,
    pub nickname: Option<String>,
    /// Storage key for the avatar image
    pub avatar_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Display attributes of a user, as shown next to their posts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DisplayInfo {
    pub nickname: Option<String>,
    pub avatar_key: Option<String>,
}

// =============================================================================
// Post
// =============================================================================

/// A post
///
/// Can be a plain post or a repost of another post (`repost_of_id`).
/// The repost target is a soft reference and may no longer exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    /// Author username
    pub author: String,
    pub content: String,
    /// Storage key of the attached image
    pub image_key: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub accuracy: Option<f64>,
    /// ID of the post this one reposts
    pub repost_of_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Build a new post authored now
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: EntityId::new().0,
            author: author.into(),
            content: content.into(),
            image_key: None,
            longitude: None,
            latitude: None,
            accuracy: None,
            repost_of_id: None,
            created_at: Utc::now(),
        }
    }

    /// Location block, present when any coordinate field is set
    pub fn location(&self) -> Option<Location> {
        if self.longitude.is_none() && self.latitude.is_none() && self.accuracy.is_none() {
            return None;
        }

        Some(Location {
            longitude: self.longitude,
            latitude: self.latitude,
            accuracy: self.accuracy,
        })
    }
}

/// Where a post was written
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub accuracy: Option<f64>,
}

/// One page of a windowed post query
///
/// `total_count` is the number of posts matching the query's base filter,
/// independent of the anchor and the limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostWindow {
    pub posts: Vec<Post>,
    pub total_count: i64,
}

// =============================================================================
// Engagement
// =============================================================================

/// Comment on a post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        post_id: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new().0,
            post_id: post_id.into(),
            author: author.into(),
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}
