//! SQLite database operations
//!
//! All database access goes through this module.

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Sqlite};
use std::path::Path;

use super::hashtags::extract_hashtags;
use super::models::*;
use crate::error::AppError;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Base filter of a windowed post query
#[derive(Debug, Clone, Copy)]
enum WindowFilter<'a> {
    /// Every post
    Global,
    /// Posts by the subject or by anyone the subject follows
    Following(&'a str),
    /// Posts tagged with a normalized hashtag
    Hashtag(&'a str),
}

impl WindowFilter<'_> {
    fn push_where(&self, query: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Self::Global => {
                query.push(" WHERE 1 = 1");
            }
            Self::Following(subject) => {
                query
                    .push(" WHERE (author = ")
                    .push_bind(subject.to_string())
                    .push(" OR author IN (SELECT followee FROM follows WHERE follower = ")
                    .push_bind(subject.to_string())
                    .push("))");
            }
            Self::Hashtag(tag) => {
                query
                    .push(
                        " WHERE id IN (SELECT ph.post_id FROM post_hashtags ph \
                         INNER JOIN hashtags h ON h.id = ph.hashtag_id WHERE h.name = ",
                    )
                    .push_bind(tag.to_string())
                    .push(")");
            }
        }
    }
}

fn validate_new_post(post: &Post) -> Result<(), AppError> {
    if post.content.chars().count() > MAX_CONTENT_CHARS {
        return Err(AppError::Validation(format!(
            "post content must be at most {} characters",
            MAX_CONTENT_CHARS
        )));
    }

    if post.content.trim().is_empty() && post.image_key.is_none() {
        return Err(AppError::Validation(
            "post content or image is required".to_string(),
        ));
    }

    Ok(())
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        Self::connect_with_max_connections(path, DEFAULT_MAX_CONNECTIONS).await
    }

    /// Connect with an explicit pool size.
    pub async fn connect_with_max_connections(
        path: &Path,
        max_connections: u32,
    ) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert or update a user
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (username, nickname, avatar_key, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(username) DO UPDATE SET
                nickname = excluded.nickname,
                avatar_key = excluded.avatar_key
            "#,
        )
        .bind(&user.username)
        .bind(&user.nickname)
        .bind(&user.avatar_key)
        .bind(format_timestamp(&user.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get display attributes for a username
    pub async fn get_display_info(&self, username: &str) -> Result<Option<DisplayInfo>, AppError> {
        let info = sqlx::query_as::<_, DisplayInfo>(
            "SELECT nickname, avatar_key FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(info)
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Get post by ID
    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// Insert a new post and link its hashtags atomically.
    ///
    /// # Errors
    /// `Validation` when the content is too long, when both content and
    /// image are missing, or when the repost target does not exist.
    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        validate_new_post(post)?;

        let mut tx = self.pool.begin().await?;

        if let Some(target_id) = &post.repost_of_id {
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE id = ?")
                .bind(target_id)
                .fetch_one(&mut *tx)
                .await?;
            if exists == 0 {
                return Err(AppError::Validation(
                    "repost target does not exist".to_string(),
                ));
            }
        }

        sqlx::query(
            r#"
            INSERT INTO posts (
                id, author, content, image_key, longitude, latitude, accuracy,
                repost_of_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.author)
        .bind(&post.content)
        .bind(&post.image_key)
        .bind(post.longitude)
        .bind(post.latitude)
        .bind(post.accuracy)
        .bind(&post.repost_of_id)
        .bind(format_timestamp(&post.created_at))
        .execute(&mut *tx)
        .await?;

        for tag in extract_hashtags(&post.content) {
            sqlx::query("INSERT INTO hashtags (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
                .bind(&tag)
                .execute(&mut *tx)
                .await?;
            let hashtag_id: i64 = sqlx::query_scalar("SELECT id FROM hashtags WHERE name = ?")
                .bind(&tag)
                .fetch_one(&mut *tx)
                .await?;
            sqlx::query("INSERT OR IGNORE INTO post_hashtags (post_id, hashtag_id) VALUES (?, ?)")
                .bind(&post.id)
                .bind(hashtag_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Delete a post
    ///
    /// Likes, comments and hashtag links go with it. Reposts of it stay and
    /// keep pointing at the missing id.
    pub async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Newest posts of the whole instance older than `anchor`
    pub async fn window_global(
        &self,
        anchor: Option<&Post>,
        limit: usize,
    ) -> Result<PostWindow, AppError> {
        self.window(WindowFilter::Global, anchor, limit).await
    }

    /// Newest posts by `subject` or anyone `subject` follows, older than `anchor`
    pub async fn window_following(
        &self,
        subject: &str,
        anchor: Option<&Post>,
        limit: usize,
    ) -> Result<PostWindow, AppError> {
        self.window(WindowFilter::Following(subject), anchor, limit)
            .await
    }

    /// Newest posts tagged with `tag` (already normalized), older than `anchor`
    pub async fn window_hashtag(
        &self,
        tag: &str,
        anchor: Option<&Post>,
        limit: usize,
    ) -> Result<PostWindow, AppError> {
        self.window(WindowFilter::Hashtag(tag), anchor, limit).await
    }

    /// Windowed query ordered by `(created_at, id)` descending.
    ///
    /// The anchor is exclusive. The total count covers the base filter only.
    async fn window(
        &self,
        filter: WindowFilter<'_>,
        anchor: Option<&Post>,
        limit: usize,
    ) -> Result<PostWindow, AppError> {
        let mut page_query = QueryBuilder::<Sqlite>::new("SELECT * FROM posts");
        filter.push_where(&mut page_query);
        if let Some(anchor) = anchor {
            let anchor_ts = format_timestamp(&anchor.created_at);
            page_query
                .push(" AND (created_at < ")
                .push_bind(anchor_ts.clone())
                .push(" OR (created_at = ")
                .push_bind(anchor_ts)
                .push(" AND id < ")
                .push_bind(anchor.id.clone())
                .push("))");
        }
        page_query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit as i64);

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts");
        filter.push_where(&mut count_query);

        let (posts, total_count) = tokio::try_join!(
            page_query.build_query_as::<Post>().fetch_all(&self.pool),
            count_query
                .build_query_scalar::<i64>()
                .fetch_one(&self.pool),
        )?;

        Ok(PostWindow { posts, total_count })
    }

    // =========================================================================
    // Likes
    // =========================================================================

    /// Like a post; liking twice is a no-op
    pub async fn insert_like(&self, post_id: &str, username: &str) -> Result<(), AppError> {
        sqlx::query("INSERT OR IGNORE INTO likes (post_id, username, created_at) VALUES (?, ?, ?)")
            .bind(post_id)
            .bind(username)
            .bind(format_timestamp(&Utc::now()))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Remove a like
    pub async fn delete_like(&self, post_id: &str, username: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM likes WHERE post_id = ? AND username = ?")
            .bind(post_id)
            .bind(username)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Count likes of a post
    pub async fn count_likes(&self, post_id: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Check if `username` liked the post
    pub async fn has_liked(&self, post_id: &str, username: &str) -> Result<bool, AppError> {
        let liked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE post_id = ? AND username = ?)",
        )
        .bind(post_id)
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(liked)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Insert a comment
    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO comments (id, post_id, author, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&comment.id)
        .bind(&comment.post_id)
        .bind(&comment.author)
        .bind(&comment.content)
        .bind(format_timestamp(&comment.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Count comments of a post
    pub async fn count_comments(&self, post_id: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Follows
    // =========================================================================

    /// Record that `follower` follows `followee`; idempotent
    pub async fn insert_follow(&self, follower: &str, followee: &str) -> Result<(), AppError> {
        sqlx::query("INSERT OR IGNORE INTO follows (follower, followee, created_at) VALUES (?, ?, ?)")
            .bind(follower)
            .bind(followee)
            .bind(format_timestamp(&Utc::now()))
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
