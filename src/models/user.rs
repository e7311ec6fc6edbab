//! User model

use serde::{Deserialize, Serialize};

/// Authenticated user, built once from the verified Google profile.
///
/// Not stored anywhere beyond the session that carries it; the next login
/// re-derives it fresh from the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Provider-assigned id (opaque string, Google `sub` claim)
    pub id: String,
    /// Verified email address
    pub email: String,
    /// Display name
    pub name: String,
    /// Avatar URL, if the profile has one
    pub picture: Option<String>,
}

impl User {
    /// The part of the email after the last `@`.
    pub fn email_domain(&self) -> Option<&str> {
        self.email.rsplit_once('@').map(|(_, domain)| domain)
    }
}
