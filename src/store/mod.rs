//! Session store
//!
//! This module provides:
//! - `SessionStore` trait defining the interface for session storage
//! - `MemorySessionStore` implementing it with a process-wide map
//!
//! The store is injected into the gate so it can be swapped for a
//! distributed backend without touching gate logic, and so tests can seed
//! sessions with explicit timestamps.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::Session;

/// Session store trait
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a session, keyed by its id
    async fn insert(&self, session: Session) -> Result<()>;

    /// Get a session by id
    async fn get(&self, id: &str) -> Result<Option<Session>>;

    /// Delete a session. Deleting an unknown id is not an error.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory session store.
///
/// Sessions live only as long as the process; a restart signs everyone out,
/// matching the per-process cookie secret.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a boxed store for use with dependency injection
    pub fn boxed() -> Arc<dyn SessionStore> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: Session) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}
