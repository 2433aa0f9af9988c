//! # roster-store
//!
//! File-backed user record storage for the Roster server.
//!
//! This crate provides:
//! - [`UserRecord`] - the stored record type
//! - [`UserStore`] - a mutex-disciplined in-memory cache over a single
//!   JSON file, where every mutation rewrites the full file
//! - [`StoreError`] - error types for store operations
//!
//! Records are addressed by their position in the backing sequence.
//! Deleting a record shifts the position of every record after it; there
//! is no stable identifier beyond the index.

pub mod error;
pub mod record;
pub mod store;

pub use error::StoreError;
pub use record::UserRecord;
pub use store::UserStore;
