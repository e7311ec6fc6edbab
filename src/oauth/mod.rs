//! Identity provider adapter (Google OAuth 2.0)
//!
//! Delegates credential verification to Google: builds the consent-screen
//! redirect, exchanges the returned authorization code for tokens, and
//! fetches the verified profile. It decides identity only — authorization
//! (the domain allow-list) lives in the session gate.

use serde::Deserialize;

/// Google authorization endpoint
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Google token exchange endpoint
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Google OpenID Connect userinfo endpoint
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Errors from the provider exchange.
///
/// Neither variant carries anything the browser should see; callers map
/// both to the generic sign-in failure.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Network-level failure talking to Google
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Google answered with a non-success status
    #[error("{operation} failed (status {status:?}): {detail}")]
    Provider {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },
}

/// OAuth client configuration.
///
/// Endpoint URLs default to Google's but can be overridden, which is how the
/// tests point the client at a local stand-in.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) redirect_uri: String,
    pub(crate) auth_url: String,
    pub(crate) token_url: String,
    pub(crate) userinfo_url: String,
    pub(crate) scopes: Vec<String>,
    pub(crate) hosted_domain: Option<String>,
}

impl OAuthConfig {
    /// Create a new configuration with Google's endpoints and the
    /// `openid email profile` scopes.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            auth_url: AUTH_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
            scopes: vec!["openid".into(), "email".into(), "profile".into()],
            hosted_domain: None,
        }
    }

    /// Pass a hosted-domain (`hd`) hint on the consent screen.
    ///
    /// This only pre-filters the Google account picker. It is advisory UX
    /// and never a security control; the gate re-checks the domain
    /// server-side on every callback.
    pub fn with_hosted_domain(mut self, domain: impl Into<String>) -> Self {
        self.hosted_domain = Some(domain.into());
        self
    }

    /// Override the authorization endpoint.
    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    /// Override the token endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Override the userinfo endpoint.
    pub fn with_userinfo_url(mut self, url: impl Into<String>) -> Self {
        self.userinfo_url = url.into();
        self
    }
}

/// Token response from the Google token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Profile from the userinfo endpoint.
///
/// `email` is optional here on purpose: the gate, not the adapter, decides
/// what a missing email means.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    /// Google-assigned subject id
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    /// Hosted domain claim, present for Workspace accounts
    #[serde(default)]
    pub hd: Option<String>,
}

/// Google OAuth 2.0 client.
pub struct GoogleOAuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl GoogleOAuthClient {
    /// Create a new client.
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (connection pool reuse or testing).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Build the consent-screen redirect target.
    ///
    /// `state` is the CSRF token the caller stores client-side for the
    /// callback to verify.
    pub fn authorization_url(&self, state: &str) -> String {
        let scope = self.config.scopes.join(" ");
        let mut url = format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
            self.config.auth_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(state),
        );
        if let Some(hd) = &self.config.hosted_domain {
            url.push_str("&hd=");
            url.push_str(&urlencoding::encode(hd));
        }
        url
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// [`OAuthError::Http`] on network failure, [`OAuthError::Provider`] when
    /// the token endpoint rejects the grant.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        let response = Self::ensure_success(response, "token exchange").await?;
        response.json::<TokenResponse>().await.map_err(Into::into)
    }

    /// Fetch the user profile with an access token.
    ///
    /// # Errors
    ///
    /// [`OAuthError::Http`] on network failure, [`OAuthError::Provider`] when
    /// the userinfo endpoint rejects the token.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, OAuthError> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = Self::ensure_success(response, "userinfo request").await?;
        response.json::<GoogleProfile>().await.map_err(Into::into)
    }

    /// Checks the response status; returns the response on success or an
    /// error carrying the body for the server log.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, OAuthError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let detail = response.text().await.unwrap_or_default();
        Err(OAuthError::Provider {
            operation,
            status: Some(status),
            detail,
        })
    }
}
