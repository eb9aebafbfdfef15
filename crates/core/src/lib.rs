//! Core business logic for Claimdesk.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and the attachment pipeline live here.
//!
//! # Modules
//!
//! - `claim` - Claim records, submission validation and the record store contract
//! - `attachment` - Photo/document uploads and signature materialization
//! - `storage` - Vendor-agnostic object storage for attachment bytes

pub mod attachment;
pub mod claim;
pub mod storage;
