//! Feed service
//!
//! Assembles decorated, viewer-relative feed pages from windowed post
//! queries.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt, TryStreamExt};
use thiserror::Error;

use super::author::AuthorDirectory;
use super::context::{CancelReason, FeedContext};
use super::cursor::CursorResolver;
use super::engagement::{Engagement, EngagementDecorator};
use super::repost::RepostResolver;
use super::store::{EngagementStore, IdentityStore, PostStore};
use crate::config::FeedConfig;
use crate::data::{DisplayInfo, Post, PostWindow, normalize_tag};
use crate::error::AppError;
use crate::metrics::{FEED_ASSEMBLY_DURATION_SECONDS, FEED_PAGES_TOTAL};

/// Which posts a feed is made of
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMode {
    /// Every post
    Global,
    /// Posts by the subject and by everyone the subject follows
    Following(String),
    /// Posts carrying a hashtag
    Hashtag(String),
}

impl FeedMode {
    /// Metric/log label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Following(_) => "following",
            Self::Hashtag(_) => "hashtag",
        }
    }
}

/// A post with viewer-relative engagement and author display info
#[derive(Debug, Clone, PartialEq)]
pub struct DecoratedPost {
    pub post: Post,
    /// `None` when the author no longer exists
    pub author: Option<DisplayInfo>,
    pub engagement: Engagement,
    /// Decorated original of a repost; `None` for plain posts and for
    /// reposts whose original is gone
    pub repost: Option<Box<DecoratedPost>>,
}

/// One assembled feed page
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub records: Vec<DecoratedPost>,
    /// Id of the last record, empty at the end of the feed
    pub next_cursor: String,
    /// Effective page size
    pub limit: usize,
    /// Posts matching the mode's base filter, cursor ignored
    pub total_matching_count: i64,
}

/// Why a mode cannot be served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModeRejection {
    #[error("following feed requires an authenticated viewer")]
    MissingViewer,
    #[error("following feed requires a subject")]
    MissingSubject,
    #[error("hashtag must not be empty")]
    EmptyTag,
}

/// Feed assembly errors
#[derive(Debug, Error)]
pub enum FeedError {
    /// The mode cannot be served for this request
    #[error("Invalid feed mode: {0}")]
    InvalidMode(ModeRejection),

    /// A store failed; no partial page is returned
    #[error("Feed store unavailable: {0}")]
    Upstream(#[from] AppError),

    /// Deadline passed or the caller went away
    #[error("Feed assembly cancelled: {0}")]
    Cancelled(CancelReason),
}

impl FeedError {
    fn outcome(&self) -> &'static str {
        match self {
            Self::InvalidMode(_) => "invalid_mode",
            Self::Upstream(_) => "upstream",
            Self::Cancelled(_) => "cancelled",
        }
    }
}

impl From<FeedError> for AppError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::InvalidMode(ModeRejection::MissingViewer) => AppError::Unauthorized,
            FeedError::InvalidMode(rejection) => AppError::Validation(rejection.to_string()),
            FeedError::Upstream(error) => error,
            FeedError::Cancelled(reason) => AppError::Cancelled(reason.to_string()),
        }
    }
}

/// Base filter after validation
enum WindowQuery<'a> {
    Global,
    Following(&'a str),
    Hashtag(String),
}

/// Feed assembler
///
/// Pages are ordered by `(created_at, id)` descending. Cursors are not
/// snapshots: a post written during pagination shows up on a later page only
/// if it sorts below the current anchor, so freshly created posts appear on
/// the next first page rather than mid-scroll.
pub struct FeedAssembler {
    posts: Arc<dyn PostStore>,
    cursors: CursorResolver,
    engagement: EngagementDecorator,
    authors: AuthorDirectory,
    reposts: RepostResolver,
    config: FeedConfig,
}

impl FeedAssembler {
    /// Create new feed assembler
    pub fn new(
        posts: Arc<dyn PostStore>,
        engagement: Arc<dyn EngagementStore>,
        identities: Arc<dyn IdentityStore>,
        config: FeedConfig,
    ) -> Self {
        let engagement = EngagementDecorator::new(engagement);
        let authors = AuthorDirectory::new(identities);
        let reposts = RepostResolver::new(posts.clone(), engagement.clone(), authors.clone());

        Self {
            cursors: CursorResolver::new(posts.clone()),
            posts,
            engagement,
            authors,
            reposts,
            config,
        }
    }

    /// Effective page size for a requested one; `0` means the default
    pub fn page_size(&self, requested: usize) -> usize {
        let max = self.config.max_page_size.max(1);
        match requested {
            0 => self.config.default_page_size.clamp(1, max),
            requested => requested.min(max),
        }
    }

    /// Assemble one feed page
    ///
    /// # Arguments
    /// * `mode` - Which posts to select
    /// * `cursor_token` - Id of the last post seen, empty for the first page
    /// * `page_size` - Requested page size, clamped to the configured maximum
    /// * `ctx` - Viewer, deadline and cancellation of this request
    ///
    /// # Errors
    /// * `InvalidMode` - following feed without a viewer, or a blank subject or tag
    /// * `Upstream` - any store fault
    /// * `Cancelled` - deadline passed or cancellation requested
    pub async fn assemble(
        &self,
        mode: &FeedMode,
        cursor_token: &str,
        page_size: usize,
        ctx: &FeedContext,
    ) -> Result<FeedPage, FeedError> {
        let started = Instant::now();
        let _timer = FEED_ASSEMBLY_DURATION_SECONDS
            .with_label_values(&[mode.label()])
            .start_timer();

        let result = match self.window_query(mode, ctx) {
            Ok(query) => {
                let limit = self.page_size(page_size);
                ctx.guard(self.assemble_page(query, cursor_token, limit, ctx))
                    .await
                    .map_err(FeedError::Cancelled)
                    .and_then(|page| page)
            }
            Err(error) => Err(error),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(error) => error.outcome(),
        };
        FEED_PAGES_TOTAL
            .with_label_values(&[mode.label(), outcome])
            .inc();

        match &result {
            Ok(page) => tracing::debug!(
                mode = mode.label(),
                records = page.records.len(),
                total = page.total_matching_count,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Feed page assembled"
            ),
            Err(error) => tracing::info!(
                mode = mode.label(),
                %error,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Feed page failed"
            ),
        }

        result
    }

    /// Validate the mode against the request before touching any store
    fn window_query<'a>(
        &self,
        mode: &'a FeedMode,
        ctx: &FeedContext,
    ) -> Result<WindowQuery<'a>, FeedError> {
        match mode {
            FeedMode::Global => Ok(WindowQuery::Global),
            FeedMode::Following(subject) => {
                if ctx.viewer().is_none() {
                    return Err(FeedError::InvalidMode(ModeRejection::MissingViewer));
                }
                let subject = subject.trim();
                if subject.is_empty() {
                    return Err(FeedError::InvalidMode(ModeRejection::MissingSubject));
                }
                Ok(WindowQuery::Following(subject))
            }
            FeedMode::Hashtag(tag) => normalize_tag(tag)
                .map(WindowQuery::Hashtag)
                .ok_or(FeedError::InvalidMode(ModeRejection::EmptyTag)),
        }
    }

    async fn assemble_page(
        &self,
        query: WindowQuery<'_>,
        cursor_token: &str,
        limit: usize,
        ctx: &FeedContext,
    ) -> Result<FeedPage, FeedError> {
        let cursor = self.cursors.resolve(cursor_token).await?;
        let anchor = cursor.anchor();

        let window: PostWindow = match &query {
            WindowQuery::Global => self.posts.window_global(anchor, limit).await?,
            WindowQuery::Following(subject) => {
                self.posts.window_following(subject, anchor, limit).await?
            }
            WindowQuery::Hashtag(tag) => self.posts.window_hashtag(tag, anchor, limit).await?,
        };

        // `buffered` yields in input order, so the window's order survives
        // concurrent decoration. The first failure drops the rest.
        let records: Vec<DecoratedPost> = stream::iter(window.posts)
            .map(|post| self.decorate(post, ctx))
            .buffered(self.config.decoration_concurrency.max(1))
            .try_collect()
            .await?;

        let next_cursor = records
            .last()
            .map(|record| record.post.id.clone())
            .unwrap_or_default();

        Ok(FeedPage {
            records,
            next_cursor,
            limit,
            total_matching_count: window.total_count,
        })
    }

    /// Decorate one post of the window, including its repost target
    async fn decorate(&self, post: Post, ctx: &FeedContext) -> Result<DecoratedPost, AppError> {
        let (engagement, author, repost) = tokio::try_join!(
            self.engagement.decorate(&post, ctx.viewer()),
            self.authors.lookup(ctx, &post.author),
            self.reposts.resolve_original(&post, ctx),
        )?;

        Ok(DecoratedPost {
            post,
            author,
            engagement,
            repost: repost.map(Box::new),
        })
    }
}
