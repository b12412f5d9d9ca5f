//! Viewer extraction
//!
//! Authentication happens upstream; the authenticated username arrives in a
//! request header.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};

/// Header carrying the authenticated username
pub const VIEWER_HEADER: &str = "x-authenticated-user";

/// Optional viewer extractor
///
/// `None` when the header is missing, blank or not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer(pub Option<String>);

impl Viewer {
    pub fn username(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

fn viewer_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(VIEWER_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|username| !username.is_empty())
        .map(ToOwned::to_owned)
}

#[async_trait]
impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Viewer(viewer_from_headers(&parts.headers)))
    }
}
