//! End-to-end tests for the auth gate HTTP surface
//!
//! The provider exchange itself is not exercised here (that would need a
//! live token endpoint); sessions are seeded straight into the injected
//! store and the tests drive the routes the way a browser would.

use std::io::Write;
use std::sync::Arc;

use axum::http::{header, HeaderName, StatusCode};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use tempfile::NamedTempFile;

use dashgate::api::{self, AppState};
use dashgate::models::{Session, User};
use dashgate::oauth::{GoogleOAuthClient, OAuthConfig};
use dashgate::services::{AuthGate, CookieSigner};
use dashgate::store::{MemorySessionStore, SessionStore};

const DASHBOARD_HTML: &str = "<html><body>powerplugs dashboard</body></html>";

struct TestApp {
    server: TestServer,
    store: Arc<dyn SessionStore>,
    signer: CookieSigner,
    // keeps the dashboard file alive for the duration of the test
    _dashboard: NamedTempFile,
}

fn test_oauth_config() -> OAuthConfig {
    OAuthConfig::new(
        "test-client-id",
        "test-client-secret",
        "http://localhost:8080/auth/google/callback",
    )
    .with_hosted_domain("ultrahuman.com")
}

fn test_app() -> TestApp {
    test_app_with(test_oauth_config())
}

fn test_app_with(oauth_config: OAuthConfig) -> TestApp {
    let mut dashboard = NamedTempFile::new().expect("temp dashboard file");
    dashboard
        .write_all(DASHBOARD_HTML.as_bytes())
        .expect("write dashboard");

    let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let signer = CookieSigner::new("integration-test-secret");

    let state = AppState {
        gate: Arc::new(AuthGate::new(store.clone(), "ultrahuman.com")),
        oauth: Arc::new(GoogleOAuthClient::new(oauth_config)),
        signer: signer.clone(),
        dashboard_file: Arc::from(dashboard.path().to_str().unwrap()),
        callback_is_https: false,
    };

    let server = TestServer::new(api::build_router(state)).expect("test server");
    TestApp {
        server,
        store,
        signer,
        _dashboard: dashboard,
    }
}

fn test_user(email: &str) -> User {
    User {
        id: "sub-123".to_string(),
        email: email.to_string(),
        name: "Test User".to_string(),
        picture: None,
    }
}

async fn seed_session(app: &TestApp, session: Session) -> String {
    let cookie = format!("session={}", app.signer.sign(&session.id));
    app.store.insert(session).await.expect("seed session");
    cookie
}

fn location(response: &axum_test::TestResponse) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn root_without_cookie_redirects_to_login() {
    let app = test_app();
    let response = app.server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn user_endpoint_without_cookie_redirects_to_login() {
    let app = test_app();
    let response = app.server.get("/auth/user").await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn login_page_renders() {
    let app = test_app();
    let response = app.server.get("/auth/login").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert!(body.contains("Sign in with Google"));
    assert!(!body.contains("class=\"error\""));
}

#[tokio::test]
async fn login_page_domain_error_names_the_domain() {
    let app = test_app();
    let response = app.server.get("/auth/login?error=domain").await;
    let body = response.text();
    assert!(body.contains("@ultrahuman.com"));
}

#[tokio::test]
async fn login_page_generic_error_is_vague() {
    let app = test_app();
    let response = app.server.get("/auth/login?error=generic").await;
    let body = response.text();
    assert!(body.contains("Sign-in failed"));
    assert!(!body.contains("@ultrahuman.com"));
}

#[tokio::test]
async fn login_page_unknown_error_code_falls_back_to_generic() {
    let app = test_app();
    let response = app.server.get("/auth/login?error=whatever").await;
    assert!(response.text().contains("Sign-in failed"));
}

#[tokio::test]
async fn google_start_redirects_to_consent_screen() {
    let app = test_app();
    let response = app.server.get("/auth/google").await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let target = location(&response);
    assert!(target.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert!(target.contains("client_id=test-client-id"));
    assert!(target.contains("scope=openid%20email%20profile"));
    assert!(target.contains("hd=ultrahuman.com"));

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("state cookie")
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("oauth_state="));
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn valid_session_serves_dashboard() {
    let app = test_app();
    let cookie = seed_session(&app, Session::new(test_user("a@ultrahuman.com"), 7)).await;

    let response = app
        .server
        .get("/")
        .add_header(header::COOKIE, cookie.parse::<axum::http::HeaderValue>().unwrap())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), DASHBOARD_HTML);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );
}

#[tokio::test]
async fn auth_user_returns_profile_json() {
    let app = test_app();
    let cookie = seed_session(&app, Session::new(test_user("a@ultrahuman.com"), 7)).await;

    let response = app
        .server
        .get("/auth/user")
        .add_header(header::COOKIE, cookie.parse::<axum::http::HeaderValue>().unwrap())
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], "sub-123");
    assert_eq!(body["email"], "a@ultrahuman.com");
    assert_eq!(body["name"], "Test User");
    assert!(body["picture"].is_null());
}

#[tokio::test]
async fn expired_session_redirects_to_login() {
    let app = test_app();
    let now = Utc::now();
    let stale = Session {
        id: "stale-session".to_string(),
        user: test_user("a@ultrahuman.com"),
        created_at: now - Duration::days(8),
        expires_at: now - Duration::days(1),
    };
    let cookie = seed_session(&app, stale).await;

    let response = app
        .server
        .get("/")
        .add_header(header::COOKIE, cookie.parse::<axum::http::HeaderValue>().unwrap())
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn unsigned_cookie_is_treated_as_anonymous() {
    let app = test_app();
    let session = Session::new(test_user("a@ultrahuman.com"), 7);
    let raw_id = session.id.clone();
    app.store.insert(session).await.unwrap();

    // the raw id without a signature must not pass the gate
    let response = app
        .server
        .get("/")
        .add_header(
            header::COOKIE,
            format!("session={}", raw_id).parse::<axum::http::HeaderValue>().unwrap(),
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn logout_invalidates_session_and_is_idempotent() {
    let app = test_app();
    let cookie = seed_session(&app, Session::new(test_user("a@ultrahuman.com"), 7)).await;
    let cookie_value = cookie.parse::<axum::http::HeaderValue>().unwrap();

    let response = app
        .server
        .get("/auth/logout")
        .add_header(header::COOKIE, cookie_value.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("session=;"));
    assert!(set_cookie.contains("Max-Age=0"));

    // same credential is now anonymous
    let response = app
        .server
        .get("/")
        .add_header(header::COOKIE, cookie_value.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    // double logout: the middleware sends the dead credential to login,
    // same outcome, no error
    let response = app
        .server
        .get("/auth/logout")
        .add_header(header::COOKIE, cookie_value)
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn callback_without_code_redirects_generic() {
    let app = test_app();
    let response = app.server.get("/auth/google/callback").await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?error=generic");
}

#[tokio::test]
async fn callback_with_provider_error_redirects_generic() {
    let app = test_app();
    let response = app
        .server
        .get("/auth/google/callback?error=access_denied")
        .await;
    assert_eq!(location(&response), "/auth/login?error=generic");
}

#[tokio::test]
async fn callback_with_state_mismatch_redirects_generic() {
    let app = test_app();
    let response = app
        .server
        .get("/auth/google/callback?code=abc&state=forged")
        .add_header(
            header::COOKIE,
            "oauth_state=expected".parse::<axum::http::HeaderValue>().unwrap(),
        )
        .await;
    assert_eq!(location(&response), "/auth/login?error=generic");
}

#[tokio::test]
async fn callback_with_failing_token_endpoint_redirects_generic() {
    // an unroutable token endpoint stands in for Google being down
    let app = test_app_with(test_oauth_config().with_token_url("http://127.0.0.1:1/token"));

    let response = app
        .server
        .get("/auth/google/callback?code=abc&state=xyz")
        .add_header(
            header::COOKIE,
            "oauth_state=xyz".parse::<axum::http::HeaderValue>().unwrap(),
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?error=generic");
}

#[tokio::test]
async fn callback_without_state_cookie_redirects_generic() {
    let app = test_app();
    let response = app
        .server
        .get("/auth/google/callback?code=abc&state=anything")
        .await;
    assert_eq!(location(&response), "/auth/login?error=generic");
}

#[tokio::test]
async fn missing_dashboard_file_returns_unavailable() {
    let app = test_app();
    let cookie = seed_session(&app, Session::new(test_user("a@ultrahuman.com"), 7)).await;

    // drop the file out from under the server
    let path = app._dashboard.path().to_path_buf();
    std::fs::remove_file(&path).unwrap();

    let response = app
        .server
        .get("/")
        .add_header(header::COOKIE, cookie.parse::<axum::http::HeaderValue>().unwrap())
        .await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn secure_cookie_follows_forwarded_proto() {
    let app = test_app();
    let response = app
        .server
        .get("/auth/google")
        .add_header(
            HeaderName::from_static("x-forwarded-proto"),
            "https".parse::<axum::http::HeaderValue>().unwrap(),
        )
        .await;

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("Secure"));
}
