//! Authentication endpoints
//!
//! Handles the sign-in flow:
//! - GET /auth/login - Sign-in page (with optional error reason)
//! - GET /auth/google - Redirect to the Google consent screen
//! - GET /auth/google/callback - Complete the exchange, establish a session
//! - GET /auth/logout - Invalidate the session
//! - GET /auth/user - Current user as JSON

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::middleware::{
    cookie_value, extract_session_id, request_is_secure, AppState, AuthenticatedUser,
    LOGIN_PATH, SESSION_COOKIE, STATE_COOKIE,
};
use crate::models::{Session, User};

/// State cookie lifetime: long enough for the consent screen round trip
const STATE_COOKIE_MAX_AGE_SECS: i64 = 600;

/// Query parameters for the sign-in page
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// Query parameters Google sends to the callback
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Response for the current user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            picture: user.picture,
        }
    }
}

/// GET /auth/login - Sign-in page
///
/// The `error` query parameter is one of the two coarse reason codes;
/// anything else gets the generic message. Nothing provider-internal is
/// ever rendered here.
pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Html<String> {
    let message = match query.error.as_deref() {
        Some("domain") => format!(
            r#"<p class="error">Access is limited to @{} accounts.</p>"#,
            state.gate.allowed_domain()
        ),
        Some(_) => r#"<p class="error">Sign-in failed. Please try again.</p>"#.to_string(),
        None => String::new(),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Powerplugs Dashboard</title>
<style>
  body {{ font-family: -apple-system, sans-serif; display: flex; align-items: center;
         justify-content: center; min-height: 100vh; margin: 0; background: #f5f5f7; }}
  .card {{ background: #fff; padding: 2.5rem 3rem; border-radius: 12px;
           box-shadow: 0 2px 12px rgba(0,0,0,.08); text-align: center; }}
  .error {{ color: #c0392b; }}
  a.button {{ display: inline-block; margin-top: 1rem; padding: .6rem 1.4rem;
              background: #4285f4; color: #fff; border-radius: 6px; text-decoration: none; }}
</style>
</head>
<body>
<div class="card">
<h1>Powerplugs Dashboard</h1>
{}
<a class="button" href="/auth/google">Sign in with Google</a>
</div>
</body>
</html>"#,
        message
    ))
}

/// GET /auth/google - Start the provider flow
///
/// Issues the consent-screen redirect and parks the CSRF state in a
/// short-lived cookie (the non-durable mid-flow state).
pub async fn google_start(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let csrf_state = Uuid::new_v4().to_string();
    let url = state.oauth.authorization_url(&csrf_state);

    let secure = request_is_secure(&headers, state.callback_is_https);
    let cookie = build_cookie(STATE_COOKIE, &csrf_state, STATE_COOKIE_MAX_AGE_SECS, secure);

    ([(header::SET_COOKIE, cookie)], Redirect::to(&url)).into_response()
}

/// GET /auth/google/callback - Complete authentication
///
/// Every failure resolves to a redirect back to the sign-in page with one
/// of the two reason codes; success sets the session cookie and lands on
/// the protected page.
pub async fn google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let secure = request_is_secure(&headers, state.callback_is_https);

    if let Some(provider_error) = &query.error {
        tracing::warn!(error = %provider_error, "provider returned an error on callback");
        return login_redirect("generic", secure);
    }

    let code = match query.code.as_deref() {
        Some(c) if !c.is_empty() => c,
        _ => return login_redirect("generic", secure),
    };

    // CSRF check: the state Google echoes back must match the cookie we set
    let expected_state = cookie_value(&headers, STATE_COOKIE);
    if expected_state.is_none() || expected_state != query.state {
        tracing::warn!("callback state mismatch");
        return login_redirect("generic", secure);
    }

    let token = match state.oauth.exchange_code(code).await {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!("token exchange failed: {}", e);
            return login_redirect("generic", secure);
        }
    };

    let profile = match state.oauth.fetch_profile(&token.access_token).await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("userinfo request failed: {}", e);
            return login_redirect("generic", secure);
        }
    };

    match state.gate.complete_login(profile).await {
        Ok(session) => session_response(&state, session, secure),
        Err(e) => login_redirect(e.reason_code(), secure),
    }
}

/// GET /auth/logout - Invalidate the session
///
/// Clears the cookie and deletes the server-side record; repeating the
/// request with the same (now dead) credential takes the anonymous path
/// through the middleware instead.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(session_id) = extract_session_id(&headers, &state.signer) {
        if let Err(e) = state.gate.logout(&session_id).await {
            tracing::error!("logout failed: {}", e);
        }
    }

    let secure = request_is_secure(&headers, state.callback_is_https);
    let clear = build_cookie(SESSION_COOKIE, "", 0, secure);
    ([(header::SET_COOKIE, clear)], Redirect::to(LOGIN_PATH)).into_response()
}

/// GET /auth/user - Current user
pub async fn current_user(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(user.0.into())
}

/// Set the session cookie and redirect to the protected resource
fn session_response(state: &AppState, session: Session, secure: bool) -> Response {
    let max_age = (session.expires_at - session.created_at).num_seconds();
    let session_cookie = build_cookie(SESSION_COOKIE, &state.signer.sign(&session.id), max_age, secure);
    // the mid-flow state cookie has served its purpose
    let clear_state = build_cookie(STATE_COOKIE, "", 0, secure);

    (
        axum::response::AppendHeaders([
            (header::SET_COOKIE, session_cookie),
            (header::SET_COOKIE, clear_state),
        ]),
        Redirect::to("/"),
    )
        .into_response()
}

/// Redirect to the sign-in page with a machine-readable reason code
fn login_redirect(reason: &str, secure: bool) -> Response {
    let clear_state = build_cookie(STATE_COOKIE, "", 0, secure);
    let location = format!("{}?error={}", LOGIN_PATH, urlencoding::encode(reason));
    ([(header::SET_COOKIE, clear_state)], Redirect::to(&location)).into_response()
}

/// Build a Set-Cookie value. `max_age` of zero expires the cookie.
fn build_cookie(name: &str, value: &str, max_age: i64, secure: bool) -> HeaderValue {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name, value, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}
