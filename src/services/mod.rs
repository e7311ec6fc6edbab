//! Service layer
//!
//! This module contains:
//! - Session gate (domain policy and session lifecycle)
//! - Signed session cookie encoding

pub mod gate;
pub mod token;

pub use gate::{AuthGate, GateError};
pub use token::CookieSigner;
