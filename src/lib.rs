//! Turnstile - Subscription entitlement server for game clients
//!
//! This library provides the core functionality for the Turnstile entitlement
//! system, including database operations, key redemption, device binding,
//! trial abuse filtering, and API handlers.

pub mod config;
pub mod crypto;
pub mod db;
pub mod entitlement;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod util;
