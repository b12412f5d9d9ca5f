//! Cursor resolution
//!
//! Turns the client's "last seen post id" into a pagination anchor.

use std::sync::Arc;

use super::store::PostStore;
use crate::data::{EntityId, Post};
use crate::error::AppError;
use crate::metrics::record_degraded;

/// Outcome of resolving a cursor token
#[derive(Debug, Clone, PartialEq)]
pub enum Cursor {
    /// No cursor: start at the newest post
    Start,
    /// Continue strictly below this post's `(created_at, id)` position
    Anchored(Post),
    /// Token named no existing post; treated as [`Cursor::Start`]
    Stale(String),
}

impl Cursor {
    pub fn anchor(&self) -> Option<&Post> {
        match self {
            Self::Anchored(post) => Some(post),
            Self::Start | Self::Stale(_) => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }
}

/// Resolves cursor tokens against the post store
#[derive(Clone)]
pub struct CursorResolver {
    posts: Arc<dyn PostStore>,
}

impl CursorResolver {
    pub fn new(posts: Arc<dyn PostStore>) -> Self {
        Self { posts }
    }

    /// Resolve `token`
    ///
    /// Tokens naming no post, deleted or never existing, are not errors:
    /// clients routinely hold cursors captured before a post was deleted.
    ///
    /// # Errors
    /// Only storage faults
    pub async fn resolve(&self, token: &str) -> Result<Cursor, AppError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(Cursor::Start);
        }

        // Ids are stored as written, so the raw token is tried first. A
        // UUID in another spelling falls back to its canonical form.
        if let Some(post) = self.posts.get_by_id(token).await? {
            return Ok(Cursor::Anchored(post));
        }

        if let Some(id) = EntityId::parse(token).filter(|id| id.0 != token) {
            if let Some(post) = self.posts.get_by_id(&id.0).await? {
                return Ok(Cursor::Anchored(post));
            }
        }

        tracing::warn!(cursor = %token, "Feed cursor names no existing post; starting from the newest post");
        record_degraded("stale_cursor");
        Ok(Cursor::Stale(token.to_string()))
    }
}
