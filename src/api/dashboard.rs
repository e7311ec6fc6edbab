//! Protected dashboard document
//!
//! The HTML is generated and rewritten out-of-band by the refresh script,
//! so it is read from disk on every request and served uncached.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
};
use tokio::fs;

use crate::api::middleware::{AppState, AuthenticatedUser};

/// GET / - Serve the dashboard to an authenticated user
pub async fn serve_dashboard(State(state): State<AppState>, _user: AuthenticatedUser) -> Response {
    match fs::read(state.dashboard_file.as_ref()).await {
        Ok(contents) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
            .header(header::CACHE_CONTROL, "no-store")
            .body(Body::from(contents))
            .unwrap_or_else(|_| unavailable()),
        Err(e) => {
            tracing::error!(file = %state.dashboard_file, "dashboard document unreadable: {}", e);
            unavailable()
        }
    }
}

fn unavailable() -> Response {
    Response::builder()
        .status(StatusCode::SERVICE_UNAVAILABLE)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(
            "Dashboard is not available yet. Try again after the next refresh.",
        ))
        .unwrap_or_default()
}
