//! Repost expansion
//!
//! Embeds the original of a repost, exactly one level deep.

use std::sync::Arc;

use super::author::AuthorDirectory;
use super::context::FeedContext;
use super::engagement::EngagementDecorator;
use super::feed::DecoratedPost;
use super::store::PostStore;
use crate::data::Post;
use crate::error::AppError;
use crate::metrics::record_degraded;

/// Resolves and decorates repost targets
#[derive(Clone)]
pub struct RepostResolver {
    posts: Arc<dyn PostStore>,
    engagement: EngagementDecorator,
    authors: AuthorDirectory,
}

impl RepostResolver {
    pub fn new(
        posts: Arc<dyn PostStore>,
        engagement: EngagementDecorator,
        authors: AuthorDirectory,
    ) -> Self {
        Self {
            posts,
            engagement,
            authors,
        }
    }

    /// Decorated original of `post`
    ///
    /// Returns `None` for plain posts and for reposts whose original was
    /// deleted. The original's own repost target is never followed, so the
    /// embedded record always has `repost: None`.
    pub async fn resolve_original(
        &self,
        post: &Post,
        ctx: &FeedContext,
    ) -> Result<Option<DecoratedPost>, AppError> {
        let Some(target_id) = post.repost_of_id.as_deref() else {
            return Ok(None);
        };

        let Some(original) = self.posts.get_by_id(target_id).await? else {
            tracing::debug!(
                post_id = %post.id,
                repost_of_id = %target_id,
                "Repost target not found; rendering without original"
            );
            record_degraded("missing_repost_target");
            return Ok(None);
        };

        let (engagement, author) = tokio::try_join!(
            self.engagement.decorate(&original, ctx.viewer()),
            self.authors.lookup(ctx, &original.author),
        )?;

        Ok(Some(DecoratedPost {
            post: original,
            author,
            engagement,
            repost: None,
        }))
    }
}
