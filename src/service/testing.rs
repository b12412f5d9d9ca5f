//! In-memory store used by the service tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use super::store::{EngagementStore, IdentityStore, PostStore};
use crate::data::{DisplayInfo, Post, PostWindow, extract_hashtags};
use crate::error::AppError;

/// `2024-01-01T00:00:00Z` plus `seconds`
pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(seconds)
}

/// Post with a fixed id and timestamp
pub fn post(id: &str, author: &str, content: &str, created_at: DateTime<Utc>) -> Post {
    Post {
        id: id.to_string(),
        created_at,
        ..Post::new(author, content)
    }
}

/// UUID-shaped id ending in `n`, so ids sort by `n`
pub fn id(n: u32) -> String {
    format!("00000000-0000-4000-8000-{n:012}")
}

/// Like [`id`] but with hex letters, in uppercase
pub fn upper_id(n: u32) -> String {
    format!("ABCDEF00-0000-4000-8000-{n:012}")
}

#[derive(Default)]
pub struct MemoryStore {
    posts: Mutex<Vec<Post>>,
    users: Mutex<HashMap<String, DisplayInfo>>,
    follows: Mutex<HashSet<(String, String)>>,
    likes: Mutex<HashSet<(String, String)>>,
    comments: Mutex<HashMap<String, i64>>,
    fail_windows: AtomicBool,
    fail_likes_for: Mutex<Option<String>>,
    window_delay: Mutex<Option<Duration>>,
    engagement_delay: Mutex<Option<Duration>>,
    pub display_lookups: AtomicUsize,
    pub like_lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, username: &str, nickname: &str) {
        self.users.lock().unwrap().insert(
            username.to_string(),
            DisplayInfo {
                nickname: Some(nickname.to_string()),
                avatar_key: Some(format!("avatars/{username}.png")),
            },
        );
    }

    pub fn add_post(&self, post: Post) {
        self.posts.lock().unwrap().push(post);
    }

    pub fn remove_post(&self, id: &str) {
        self.posts.lock().unwrap().retain(|post| post.id != id);
    }

    pub fn follow(&self, follower: &str, followee: &str) {
        self.follows
            .lock()
            .unwrap()
            .insert((follower.to_string(), followee.to_string()));
    }

    pub fn like(&self, post_id: &str, username: &str) {
        self.likes
            .lock()
            .unwrap()
            .insert((post_id.to_string(), username.to_string()));
    }

    pub fn comment(&self, post_id: &str) {
        *self
            .comments
            .lock()
            .unwrap()
            .entry(post_id.to_string())
            .or_default() += 1;
    }

    /// Every window query fails from now on
    pub fn fail_windows(&self) {
        self.fail_windows.store(true, Ordering::SeqCst);
    }

    /// Like counting fails for this post
    pub fn fail_likes_for(&self, post_id: &str) {
        *self.fail_likes_for.lock().unwrap() = Some(post_id.to_string());
    }

    /// Window queries sleep before answering
    pub fn delay_windows(&self, delay: Duration) {
        *self.window_delay.lock().unwrap() = Some(delay);
    }

    /// Like counting sleeps before answering
    pub fn delay_engagement(&self, delay: Duration) {
        *self.engagement_delay.lock().unwrap() = Some(delay);
    }

    async fn window<F>(&self, anchor: Option<&Post>, limit: usize, filter: F) -> Result<PostWindow, AppError>
    where
        F: Fn(&Post) -> bool,
    {
        let delay = *self.window_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_windows.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut matching: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|post| filter(post))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total_count = matching.len() as i64;
        let posts = matching
            .into_iter()
            .filter(|post| match anchor {
                Some(anchor) => {
                    (post.created_at, &post.id) < (anchor.created_at, &anchor.id)
                }
                None => true,
            })
            .take(limit)
            .collect();

        Ok(PostWindow { posts, total_count })
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<Post>, AppError> {
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|post| post.id == id)
            .cloned())
    }

    async fn window_global(
        &self,
        anchor: Option<&Post>,
        limit: usize,
    ) -> Result<PostWindow, AppError> {
        self.window(anchor, limit, |_| true).await
    }

    async fn window_following(
        &self,
        subject: &str,
        anchor: Option<&Post>,
        limit: usize,
    ) -> Result<PostWindow, AppError> {
        let follows = self.follows.lock().unwrap().clone();
        self.window(anchor, limit, |post| {
            post.author == subject
                || follows.contains(&(subject.to_string(), post.author.clone()))
        })
        .await
    }

    async fn window_hashtag(
        &self,
        tag: &str,
        anchor: Option<&Post>,
        limit: usize,
    ) -> Result<PostWindow, AppError> {
        self.window(anchor, limit, |post| {
            extract_hashtags(&post.content).iter().any(|t| t == tag)
        })
        .await
    }
}

#[async_trait]
impl EngagementStore for MemoryStore {
    async fn count_likes(&self, post_id: &str) -> Result<i64, AppError> {
        let delay = *self.engagement_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_likes_for.lock().unwrap().as_deref() == Some(post_id) {
            return Err(AppError::Database(sqlx::Error::PoolClosed));
        }
        Ok(self
            .likes
            .lock()
            .unwrap()
            .iter()
            .filter(|(post, _)| post == post_id)
            .count() as i64)
    }

    async fn find_like(&self, post_id: &str, username: &str) -> Result<bool, AppError> {
        self.like_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .likes
            .lock()
            .unwrap()
            .contains(&(post_id.to_string(), username.to_string())))
    }

    async fn count_comments(&self, post_id: &str) -> Result<i64, AppError> {
        Ok(self
            .comments
            .lock()
            .unwrap()
            .get(post_id)
            .copied()
            .unwrap_or(0))
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_display_info(&self, username: &str) -> Result<Option<DisplayInfo>, AppError> {
        self.display_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.lock().unwrap().get(username).cloned())
    }
}
