//! Prometheus metrics endpoint
//!
//! Exposes the feed engine's metrics in Prometheus text format.

use axum::{
    Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::{Encoder, TextEncoder};

use crate::metrics::REGISTRY;

/// Render every registered metric family
fn render_metrics() -> Result<String, prometheus::Error> {
    let families = REGISTRY.gather();
    TextEncoder::new().encode_to_string(&families)
}

/// Metrics endpoint handler
async fn metrics_handler() -> Response {
    match render_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TextEncoder::new().format_type())],
            body,
        )
            .into_response(),
        Err(error) => {
            tracing::error!(%error, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics",
            )
                .into_response()
        }
    }
}

/// Create metrics router exposing `/metrics`
pub fn metrics_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/metrics", get(metrics_handler))
}
