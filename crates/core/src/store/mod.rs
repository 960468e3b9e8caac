//! SQLite-backed record store for origin-to-cached-location mappings.
//!
//! This module provides the persistent mapping from an origin URL to the
//! location of its relocated copy, using SQLite with async access via
//! tokio-rusqlite. It supports:
//!
//! - Point lookup and insert-or-replace keyed by origin
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod migrations;
pub mod records;

pub use crate::Error;

pub use connection::CacheDb;
pub use records::{CacheRecord, RecordStore};
