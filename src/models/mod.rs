//! Data model
//!
//! This module contains:
//! - User (identity derived from the Google profile, never persisted)
//! - Session (server-side record behind the session cookie)

mod session;
mod user;

pub use session::Session;
pub use user::User;
