//! API layer - HTTP handlers and routing
//!
//! This module contains the full HTTP surface:
//! - Sign-in flow endpoints under /auth
//! - The protected dashboard document at /
//!
//! Anonymous requests to protected routes are redirected to the sign-in
//! page rather than answered with a bare 401.

pub mod auth;
pub mod dashboard;
pub mod middleware;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

pub use middleware::{AppState, AuthenticatedUser, LOGIN_PATH, SESSION_COOKIE};

/// Build the complete router
pub fn build_router(state: AppState) -> Router {
    // Protected routes (valid session required)
    let protected_routes = Router::new()
        .route("/", get(dashboard::serve_dashboard))
        .route("/auth/logout", get(auth::logout))
        .route("/auth/user", get(auth::current_user))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .route("/auth/login", get(auth::login_page))
        .route("/auth/google", get(auth::google_start))
        .route("/auth/google/callback", get(auth::google_callback))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
