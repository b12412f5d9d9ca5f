//! Common test utilities for E2E tests

#![allow(dead_code)]

use agora::data::{Comment, Post, User};
use agora::{AppState, config};
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            database: config::DatabaseConfig {
                path: db_path,
                max_connections: 5,
            },
            media: config::MediaConfig {
                public_url: "https://media.test.example.com".to_string(),
            },
            feed: config::FeedConfig {
                default_page_size: 10,
                max_page_size: 20,
                decoration_concurrency: 4,
                request_timeout_ms: 5000,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        agora::metrics::init_metrics();

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = agora::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// GET `path` as `viewer` (anonymous when `None`)
    pub async fn get_as(&self, path: &str, viewer: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.url(path));
        if let Some(username) = viewer {
            request = request.header(agora::api::VIEWER_HEADER, username);
        }
        request.send().await.unwrap()
    }

    /// GET a feed page and decode it
    pub async fn feed_as(&self, path: &str, viewer: Option<&str>) -> serde_json::Value {
        let response = self.get_as(path, viewer).await;
        assert_eq!(response.status(), 200, "GET {path} failed");
        response.json().await.unwrap()
    }

    /// Create a user with an avatar
    pub async fn create_user(&self, username: &str, nickname: &str) {
        self.state
            .db
            .upsert_user(&User {
                username: username.to_string(),
                nickname: Some(nickname.to_string()),
                avatar_key: Some(format!("avatars/{username}.png")),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    /// Create a post `seconds` after a fixed epoch
    pub async fn create_post(&self, author: &str, content: &str, seconds: i64) -> Post {
        let post = Post {
            created_at: at(seconds),
            ..Post::new(author, content)
        };
        self.state.db.insert_post(&post).await.unwrap();
        post
    }

    /// Repost `original`
    pub async fn create_repost(&self, author: &str, original: &Post, seconds: i64) -> Post {
        let post = Post {
            repost_of_id: Some(original.id.clone()),
            created_at: at(seconds),
            ..Post::new(author, "boost")
        };
        self.state.db.insert_post(&post).await.unwrap();
        post
    }

    pub async fn like(&self, post: &Post, username: &str) {
        self.state.db.insert_like(&post.id, username).await.unwrap();
    }

    pub async fn comment(&self, post: &Post, username: &str) {
        self.state
            .db
            .insert_comment(&Comment::new(post.id.clone(), username, "nice"))
            .await
            .unwrap();
    }

    pub async fn follow(&self, follower: &str, followee: &str) {
        self.state
            .db
            .insert_follow(follower, followee)
            .await
            .unwrap();
    }
}

/// `2024-01-01T00:00:00Z` plus `seconds`
pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(seconds)
}

/// Ids of a decoded page's records
pub fn record_ids(page: &serde_json::Value) -> Vec<String> {
    page["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["id"].as_str().unwrap().to_string())
        .collect()
}
