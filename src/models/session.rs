//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::User;

/// Server-side session record.
///
/// The user is embedded rather than referenced: identity comes from the
/// provider at login and is never persisted elsewhere. TTL is fixed at
/// creation — `expires_at` is never extended on activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (the opaque credential behind the cookie)
    pub id: String,
    /// Authenticated user bound to this session
    pub user: User,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session for `user` expiring `ttl_days` from now.
    pub fn new(user: User, ttl_days: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user,
            created_at: now,
            expires_at: now + Duration::days(ttl_days),
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
