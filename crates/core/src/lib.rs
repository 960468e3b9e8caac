//! Core types and shared functionality for cachegate.
//!
//! This crate provides:
//! - The record store with SQLite backend
//! - The cache orchestrator (check, relocate, record, re-read)
//! - Destination naming and origin canonicalization
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod key;
pub mod origin;
pub mod relocate;
pub mod resolve;
pub mod store;

pub use error::Error;
pub use relocate::{Relocator, Visibility};
pub use resolve::Resolver;
pub use store::{CacheDb, CacheRecord, RecordStore};
