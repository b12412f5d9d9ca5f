//! Feed endpoints

use axum::{
    extract::{Path, Query, State},
    response::Json,
};

use super::converters::page_to_response;
use super::dto::{FeedPageResponse, FeedQuery};
use super::viewer::Viewer;
use crate::AppState;
use crate::error::AppError;
use crate::metrics::{HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL};
use crate::service::{FeedContext, FeedMode};

/// GET /api/v1/feed
pub async fn global_feed(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<FeedQuery>,
) -> Result<Json<FeedPageResponse>, AppError> {
    serve_feed(&state, "/api/v1/feed", FeedMode::Global, viewer, params).await
}

/// GET /api/v1/feed/following
///
/// Posts by the viewer and everyone they follow.
pub async fn following_feed(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<FeedQuery>,
) -> Result<Json<FeedPageResponse>, AppError> {
    let subject = viewer.username().unwrap_or_default().to_string();
    serve_feed(
        &state,
        "/api/v1/feed/following",
        FeedMode::Following(subject),
        viewer,
        params,
    )
    .await
}

/// GET /api/v1/tags/:tag/feed
pub async fn hashtag_feed(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    viewer: Viewer,
    Query(params): Query<FeedQuery>,
) -> Result<Json<FeedPageResponse>, AppError> {
    serve_feed(
        &state,
        "/api/v1/tags/:tag/feed",
        FeedMode::Hashtag(tag),
        viewer,
        params,
    )
    .await
}

async fn serve_feed(
    state: &AppState,
    endpoint: &str,
    mode: FeedMode,
    viewer: Viewer,
    params: FeedQuery,
) -> Result<Json<FeedPageResponse>, AppError> {
    // Start timing the request
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", endpoint])
        .start_timer();

    let deadline = tokio::time::Instant::now() + state.config.feed.request_timeout();
    let ctx = FeedContext::new(viewer.username()).with_deadline(deadline);

    let result = state
        .feed
        .assemble(
            &mode,
            params.cursor.as_deref().unwrap_or_default(),
            params.limit.unwrap_or(0),
            &ctx,
        )
        .await
        .map(|page| Json(page_to_response(&page, &state.config.media)))
        .map_err(AppError::from);

    let status = match &result {
        Ok(_) => axum::http::StatusCode::OK,
        Err(error) => error.status_code(),
    };
    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", endpoint, status.as_str()])
        .inc();

    result
}
