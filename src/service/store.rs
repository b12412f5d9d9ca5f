//! Store contracts consumed by the feed engine
//!
//! The engine only reads. `Database` implements every contract; tests swap in
//! fakes and mocks.

use std::time::Instant;

use async_trait::async_trait;

use crate::data::{Database, DisplayInfo, Post, PostWindow};
use crate::error::AppError;
use crate::metrics::observe_db_query;

/// Post storage: point lookups and reverse-chronological windows
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<Option<Post>, AppError>;

    async fn window_global(
        &self,
        anchor: Option<&Post>,
        limit: usize,
    ) -> Result<PostWindow, AppError>;

    async fn window_following(
        &self,
        subject: &str,
        anchor: Option<&Post>,
        limit: usize,
    ) -> Result<PostWindow, AppError>;

    async fn window_hashtag(
        &self,
        tag: &str,
        anchor: Option<&Post>,
        limit: usize,
    ) -> Result<PostWindow, AppError>;
}

/// Like and comment storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementStore: Send + Sync {
    async fn count_likes(&self, post_id: &str) -> Result<i64, AppError>;

    /// `Ok(false)` when the like does not exist
    async fn find_like(&self, post_id: &str, username: &str) -> Result<bool, AppError>;

    async fn count_comments(&self, post_id: &str) -> Result<i64, AppError>;
}

/// User display attributes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// `Ok(None)` when the user does not exist
    async fn find_display_info(&self, username: &str) -> Result<Option<DisplayInfo>, AppError>;
}

#[async_trait]
impl PostStore for Database {
    async fn get_by_id(&self, id: &str) -> Result<Option<Post>, AppError> {
        let started = Instant::now();
        let post = self.get_post(id).await;
        observe_db_query("SELECT", "posts", started);
        post
    }

    async fn window_global(
        &self,
        anchor: Option<&Post>,
        limit: usize,
    ) -> Result<PostWindow, AppError> {
        let started = Instant::now();
        let window = Database::window_global(self, anchor, limit).await;
        observe_db_query("WINDOW", "posts", started);
        window
    }

    async fn window_following(
        &self,
        subject: &str,
        anchor: Option<&Post>,
        limit: usize,
    ) -> Result<PostWindow, AppError> {
        let started = Instant::now();
        let window = Database::window_following(self, subject, anchor, limit).await;
        observe_db_query("WINDOW", "posts_following", started);
        window
    }

    async fn window_hashtag(
        &self,
        tag: &str,
        anchor: Option<&Post>,
        limit: usize,
    ) -> Result<PostWindow, AppError> {
        let started = Instant::now();
        let window = Database::window_hashtag(self, tag, anchor, limit).await;
        observe_db_query("WINDOW", "posts_hashtag", started);
        window
    }
}

#[async_trait]
impl EngagementStore for Database {
    async fn count_likes(&self, post_id: &str) -> Result<i64, AppError> {
        let started = Instant::now();
        let count = Database::count_likes(self, post_id).await;
        observe_db_query("COUNT", "likes", started);
        count
    }

    async fn find_like(&self, post_id: &str, username: &str) -> Result<bool, AppError> {
        let started = Instant::now();
        let liked = self.has_liked(post_id, username).await;
        observe_db_query("EXISTS", "likes", started);
        liked
    }

    async fn count_comments(&self, post_id: &str) -> Result<i64, AppError> {
        let started = Instant::now();
        let count = Database::count_comments(self, post_id).await;
        observe_db_query("COUNT", "comments", started);
        count
    }
}

#[async_trait]
impl IdentityStore for Database {
    async fn find_display_info(&self, username: &str) -> Result<Option<DisplayInfo>, AppError> {
        let started = Instant::now();
        let info = self.get_display_info(username).await;
        observe_db_query("SELECT", "users", started);
        info
    }
}
