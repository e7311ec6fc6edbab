//! Session gate
//!
//! Implements the authorization decision and session lifecycle:
//! - Domain allow-list enforcement at the moment the profile arrives,
//!   before any session exists
//! - Session creation with a fixed TTL
//! - Validation (read-only, never refreshes a session)
//! - Idempotent logout
//!
//! The Google-side `hd` hint never reaches this module; whatever the
//! consent screen pre-filtered, the check here is the one that counts.

use anyhow::Context;
use std::sync::Arc;

use crate::models::{Session, User};
use crate::oauth::GoogleProfile;
use crate::store::SessionStore;

/// Default session expiration time in days
const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// Error types for gate operations.
///
/// Every variant resolves to a deterministic redirect; `reason_code` is the
/// only part a browser ever sees.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// Provider returned a profile without a usable email
    #[error("profile has no email address")]
    NoEmail,

    /// Verified identity is outside the allowed domain
    #[error("email domain {0:?} is not allowed")]
    DomainRejected(String),

    /// Session store failure
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl GateError {
    /// Machine-readable reason for the sign-in page, deliberately coarse:
    /// `domain` for the allow-list rejection, `generic` for everything else.
    pub fn reason_code(&self) -> &'static str {
        match self {
            GateError::DomainRejected(_) => "domain",
            _ => "generic",
        }
    }
}

/// Session gate service
pub struct AuthGate {
    store: Arc<dyn SessionStore>,
    allowed_domain: String,
    ttl_days: i64,
}

impl AuthGate {
    /// Create a new gate with the default 7-day session TTL
    pub fn new(store: Arc<dyn SessionStore>, allowed_domain: impl Into<String>) -> Self {
        Self {
            store,
            allowed_domain: allowed_domain.into(),
            ttl_days: DEFAULT_SESSION_TTL_DAYS,
        }
    }

    /// Create a new gate with a custom session TTL
    pub fn with_ttl_days(
        store: Arc<dyn SessionStore>,
        allowed_domain: impl Into<String>,
        ttl_days: i64,
    ) -> Self {
        Self {
            store,
            allowed_domain: allowed_domain.into(),
            ttl_days,
        }
    }

    /// The configured allow-list domain
    pub fn allowed_domain(&self) -> &str {
        &self.allowed_domain
    }

    /// Apply the domain policy to a verified profile and, on success,
    /// establish a session.
    ///
    /// The TTL is fixed from creation; nothing ever extends it.
    ///
    /// # Errors
    ///
    /// - [`GateError::NoEmail`] when the profile carries no email
    /// - [`GateError::DomainRejected`] when the email domain differs from
    ///   the allowed one — no session is created in that case
    /// - [`GateError::Internal`] for store failures
    pub async fn complete_login(&self, profile: GoogleProfile) -> Result<Session, GateError> {
        let email = profile
            .email
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or(GateError::NoEmail)?;

        let user = User {
            id: profile.sub.clone(),
            email: email.to_string(),
            name: profile.name.clone().unwrap_or_else(|| email.to_string()),
            picture: profile.picture.clone(),
        };

        match user.email_domain() {
            Some(domain) if domain.eq_ignore_ascii_case(&self.allowed_domain) => {}
            other => {
                let domain = other.unwrap_or("").to_string();
                tracing::info!(%domain, "sign-in rejected by domain policy");
                return Err(GateError::DomainRejected(domain));
            }
        }

        let session = Session::new(user, self.ttl_days);
        self.store
            .insert(session.clone())
            .await
            .context("failed to store session")?;

        tracing::info!(email, session_id = %session.id, "session established");
        Ok(session)
    }

    /// Validate a session credential and return the bound user.
    ///
    /// Returns `None` for unknown or expired credentials. Expired sessions
    /// are deleted opportunistically. Read-only otherwise: this never
    /// creates or refreshes a session.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, GateError> {
        let session = match self
            .store
            .get(token)
            .await
            .context("failed to load session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            let _ = self.store.delete(token).await;
            return Ok(None);
        }

        Ok(Some(session.user))
    }

    /// Invalidate a session immediately.
    ///
    /// Idempotent — logging out a credential that is already gone succeeds.
    pub async fn logout(&self, token: &str) -> Result<(), GateError> {
        self.store
            .delete(token)
            .await
            .context("failed to delete session")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySessionStore;
    use chrono::{Duration, Utc};

    fn profile(email: Option<&str>) -> GoogleProfile {
        GoogleProfile {
            sub: "sub-123".to_string(),
            email: email.map(String::from),
            name: Some("Test User".to_string()),
            picture: Some("https://example.com/p.png".to_string()),
            hd: None,
        }
    }

    fn gate() -> AuthGate {
        AuthGate::new(MemorySessionStore::boxed(), "ultrahuman.com")
    }

    #[tokio::test]
    async fn test_allowed_domain_creates_session() {
        let gate = gate();
        let session = gate
            .complete_login(profile(Some("a@ultrahuman.com")))
            .await
            .expect("login should succeed");

        assert_eq!(session.user.id, "sub-123");
        assert_eq!(session.user.email, "a@ultrahuman.com");
        assert_eq!(session.user.name, "Test User");
        assert_eq!(session.user.picture.as_deref(), Some("https://example.com/p.png"));

        let user = gate.validate_session(&session.id).await.unwrap();
        assert_eq!(user.unwrap().email, "a@ultrahuman.com");
    }

    #[tokio::test]
    async fn test_wrong_domain_rejected_without_session() {
        let store = MemorySessionStore::boxed();
        let gate = AuthGate::new(store.clone(), "ultrahuman.com");

        let err = gate
            .complete_login(profile(Some("a@gmail.com")))
            .await
            .expect_err("gmail must be rejected");
        assert!(matches!(err, GateError::DomainRejected(ref d) if d == "gmail.com"));
        assert_eq!(err.reason_code(), "domain");
    }

    #[tokio::test]
    async fn test_domain_check_case_insensitive() {
        let gate = gate();
        assert!(gate
            .complete_login(profile(Some("a@UltraHuman.COM")))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_missing_email_is_generic_failure() {
        let gate = gate();
        let err = gate.complete_login(profile(None)).await.unwrap_err();
        assert!(matches!(err, GateError::NoEmail));
        assert_eq!(err.reason_code(), "generic");
    }

    #[tokio::test]
    async fn test_email_without_at_rejected() {
        let gate = gate();
        let err = gate
            .complete_login(profile(Some("not-an-email")))
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::DomainRejected(_)));
    }

    #[tokio::test]
    async fn test_validate_unknown_token() {
        let gate = gate();
        assert!(gate.validate_session("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_rejected_and_removed() {
        let store = MemorySessionStore::boxed();
        let gate = AuthGate::new(store.clone(), "ultrahuman.com");

        let now = Utc::now();
        let session = Session {
            id: "stale".to_string(),
            user: crate::models::User {
                id: "sub-1".to_string(),
                email: "a@ultrahuman.com".to_string(),
                name: "Test".to_string(),
                picture: None,
            },
            created_at: now - Duration::days(8),
            expires_at: now - Duration::days(1),
        };
        store.insert(session).await.unwrap();

        assert!(gate.validate_session("stale").await.unwrap().is_none());
        // cleaned up, not just hidden
        assert!(store.get("stale").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_invalidates_immediately() {
        let gate = gate();
        let session = gate
            .complete_login(profile(Some("a@ultrahuman.com")))
            .await
            .unwrap();

        gate.logout(&session.id).await.unwrap();
        assert!(gate.validate_session(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_idempotent() {
        let gate = gate();
        let session = gate
            .complete_login(profile(Some("a@ultrahuman.com")))
            .await
            .unwrap();

        gate.logout(&session.id).await.unwrap();
        gate.logout(&session.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_custom_ttl() {
        let gate = AuthGate::with_ttl_days(MemorySessionStore::boxed(), "ultrahuman.com", 1);
        let session = gate
            .complete_login(profile(Some("a@ultrahuman.com")))
            .await
            .unwrap();
        assert_eq!(session.expires_at, session.created_at + Duration::days(1));
    }
}
