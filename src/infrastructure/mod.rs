//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Persistence: SQLite adapters for the catalog and player records
//! - HTTP: REST API routes
//! - Rewards: the catalog-backed reward issuer
//! - Config: Application configuration
//! - State: Shared application state

pub mod config;
pub mod http;
pub mod persistence;
pub mod rewards;
pub mod state;
