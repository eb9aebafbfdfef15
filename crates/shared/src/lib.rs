//! Shared types, errors, and configuration for Claimdesk.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Application-wide error taxonomy with HTTP status mapping
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    AppConfig, CorsConfig, DatabaseConfig, LogConfig, ServerConfig, StorageSettings,
};
pub use error::AppError;
pub use types::ClaimId;
