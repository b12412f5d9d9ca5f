//! API layer
//!
//! HTTP handlers for:
//! - Feed API (global, following and hashtag feeds)
//! - Metrics (Prometheus)

mod converters;
mod dto;
mod feeds;
pub mod metrics;
mod viewer;

use axum::{Router, routing::get};

use crate::AppState;

pub use converters::*;
pub use dto::*;
pub use metrics::metrics_router;
pub use viewer::{VIEWER_HEADER, Viewer};

/// Create feed API router, mounted under `/api`
pub fn feed_api_router() -> Router<AppState> {
    Router::new()
        .route("/v1/feed", get(feeds::global_feed))
        .route("/v1/feed/following", get(feeds::following_feed))
        .route("/v1/tags/:tag/feed", get(feeds::hashtag_feed))
}
