//! Dashgate - Google OAuth domain gate for the powerplugs dashboard
//!
//! The dashboard HTML itself is produced by an external refresh script;
//! this crate only decides who gets to see it.

pub mod api;
pub mod config;
pub mod models;
pub mod oauth;
pub mod services;
pub mod store;
