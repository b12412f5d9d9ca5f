//! Author display lookup with per-request memoization

use std::sync::Arc;

use super::context::FeedContext;
use super::store::IdentityStore;
use crate::data::DisplayInfo;
use crate::error::AppError;
use crate::metrics::record_degraded;

/// Resolves post authors to display attributes
#[derive(Clone)]
pub struct AuthorDirectory {
    identities: Arc<dyn IdentityStore>,
}

impl AuthorDirectory {
    pub fn new(identities: Arc<dyn IdentityStore>) -> Self {
        Self { identities }
    }

    /// Display attributes of `username`, `None` when the user is gone.
    ///
    /// Each username is looked up at most once per context, missing users
    /// included. Two concurrent first lookups of the same name may both reach
    /// the store.
    pub async fn lookup(
        &self,
        ctx: &FeedContext,
        username: &str,
    ) -> Result<Option<DisplayInfo>, AppError> {
        if let Some(known) = ctx.cached_author(username) {
            return Ok(known);
        }

        let info = self.identities.find_display_info(username).await?;
        if info.is_none() {
            tracing::debug!(author = %username, "Post author not found; rendering without display info");
            record_degraded("missing_author");
        }

        ctx.remember_author(username, info.clone());
        Ok(info)
    }
}
