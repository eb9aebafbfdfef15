//! Storage service for claim attachments using Apache OpenDAL.
//!
//! Files go to a local directory, or to process memory when `storage.root`
//! is `memory://`.
//!
//! # Layout
//!
//! ```text
//! uploads/<unix-millis>-<random>.<ext>      client uploads (photos, tickets, ...)
//! signatures/<sha256-of-image>.<ext>        materialized signatures
//! ```

mod config;
mod error;
mod service;

pub use config::{MEMORY_ROOT, StorageConfig, StorageProvider, normalize_mime_type};
pub use error::StorageError;
pub use service::{StorageService, StoredObject};
