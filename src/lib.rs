//! Agora - feed assembly service for a small social network
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Global, following and hashtag feeds                      │
//! │  - Health and Prometheus metrics                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Cursor resolution, decoration, repost expansion          │
//! │  - Feed assembly                                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Feed engine
//! - `data`: Database layer
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;

use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Feed engine, reading through `db`
    pub feed: Arc<service::FeedAssembler>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database and run migrations
    /// 2. Wire the feed engine to the database
    ///
    /// # Errors
    /// Returns error if the database cannot be opened or migrated
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let db = data::Database::connect_with_max_connections(
            &config.database.path,
            config.database.max_connections,
        )
        .await?;
        tracing::info!(path = %config.database.path.display(), "Database connected");

        Ok(Self::with_database(config, Arc::new(db)))
    }

    /// State over an already connected database
    pub fn with_database(config: config::AppConfig, db: Arc<data::Database>) -> Self {
        let feed = service::FeedAssembler::new(
            db.clone(),
            db.clone(),
            db.clone(),
            config.feed.clone(),
        );

        Self {
            config: Arc::new(config),
            db,
            feed: Arc::new(feed),
        }
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api", api::feed_api_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(api::metrics_router())
}

async fn health_check() -> &'static str {
    "OK"
}
