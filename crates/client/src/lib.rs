//! Content relocator for cachegate.
//!
//! This crate provides the HTTP fetch pipeline and the durable object
//! store that together move content from its origin into the destination
//! namespace.

pub mod deposit;
pub mod fetch;
pub mod relocator;

pub use deposit::ObjectStore;
pub use fetch::{FetchClient, FetchConfig, FetchResponse};
pub use relocator::HttpRelocator;
