//! API middleware
//!
//! Contains the shared application state, session-cookie extraction, and
//! the authentication middleware that redirects anonymous requests to the
//! sign-in page.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::models::User;
use crate::oauth::GoogleOAuthClient;
use crate::services::{AuthGate, CookieSigner};

/// Session cookie name
pub const SESSION_COOKIE: &str = "session";
/// Short-lived cookie holding the OAuth CSRF state during the redirect flow
pub const STATE_COOKIE: &str = "oauth_state";
/// Sign-in page path, the target of every auth failure
pub const LOGIN_PATH: &str = "/auth/login";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AuthGate>,
    pub oauth: Arc<GoogleOAuthClient>,
    pub signer: CookieSigner,
    /// Path to the dashboard document on disk
    pub dashboard_file: Arc<str>,
    /// Whether the configured callback URL is https (fallback for the
    /// secure-cookie decision when no proxy header is present)
    pub callback_is_https: bool,
}

/// Authenticated user extracted from the request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Extract and verify the session credential from the cookie header.
///
/// Returns the session id only when the cookie signature checks out;
/// everything else reads as "no session".
pub fn extract_session_id(headers: &HeaderMap, signer: &CookieSigner) -> Option<String> {
    cookie_value(headers, SESSION_COOKIE).and_then(|value| signer.verify(&value))
}

/// Read a single cookie from the Cookie header
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_str = headers.get(header::COOKIE)?.to_str().ok()?;
    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some(value) = cookie.strip_prefix(name) {
            if let Some(value) = value.strip_prefix('=') {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Whether the original request arrived over https.
///
/// Behind a reverse proxy the terminated scheme is always http, so
/// `X-Forwarded-Proto` wins when present; otherwise fall back to the
/// configured callback scheme.
pub fn request_is_secure(headers: &HeaderMap, callback_is_https: bool) -> bool {
    if let Some(proto) = headers.get("x-forwarded-proto") {
        if let Ok(proto) = proto.to_str() {
            return proto.trim().eq_ignore_ascii_case("https");
        }
    }
    callback_is_https
}

/// Authentication middleware.
///
/// A request with a valid, unexpired session proceeds with
/// [`AuthenticatedUser`] attached; anything else is redirected to the
/// sign-in page. A session going away between this check and the handler is
/// tolerated — the next request simply lands back here.
pub async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let session_id = match extract_session_id(request.headers(), &state.signer) {
        Some(id) => id,
        None => return Redirect::to(LOGIN_PATH).into_response(),
    };

    match state.gate.validate_session(&session_id).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(AuthenticatedUser(user));
            next.run(request).await
        }
        Ok(None) => Redirect::to(LOGIN_PATH).into_response(),
        Err(e) => {
            tracing::error!("session validation failed: {}", e);
            Redirect::to(LOGIN_PATH).into_response()
        }
    }
}

// Extractor for AuthenticatedUser from request extensions
impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| Redirect::to(LOGIN_PATH))
    }
}
