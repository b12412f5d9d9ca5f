//! Engagement decoration
//!
//! Viewer-relative like/comment figures for a single post.

use std::sync::Arc;

use serde::Serialize;

use super::store::EngagementStore;
use crate::data::Post;
use crate::error::AppError;

/// Engagement figures of one post, relative to one viewer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Engagement {
    pub like_count: i64,
    pub viewer_liked: bool,
    pub comment_count: i64,
}

/// Computes [`Engagement`] for posts
///
/// The three reads are independent point queries issued concurrently. They
/// are a best-effort snapshot: counts are not consistent with each other
/// under concurrent likes and comments.
#[derive(Clone)]
pub struct EngagementDecorator {
    engagement: Arc<dyn EngagementStore>,
}

impl EngagementDecorator {
    pub fn new(engagement: Arc<dyn EngagementStore>) -> Self {
        Self { engagement }
    }

    /// Decorate `post` for `viewer`
    ///
    /// An anonymous viewer never liked anything, and no existence query is
    /// issued for it.
    ///
    /// # Errors
    /// The first storage fault among the three reads
    pub async fn decorate(&self, post: &Post, viewer: Option<&str>) -> Result<Engagement, AppError> {
        let viewer_liked = async {
            match viewer {
                Some(username) => self.engagement.find_like(&post.id, username).await,
                None => Ok(false),
            }
        };

        let (like_count, viewer_liked, comment_count) = tokio::try_join!(
            self.engagement.count_likes(&post.id),
            viewer_liked,
            self.engagement.count_comments(&post.id),
        )?;

        Ok(Engagement {
            like_count,
            viewer_liked,
            comment_count,
        })
    }
}
