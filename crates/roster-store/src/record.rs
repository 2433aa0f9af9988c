//! The stored record type.

use serde::{Deserialize, Serialize};

/// A single user record.
///
/// Records carry no identifier field. A record's identity is its index
/// in the backing sequence, which is only stable as long as no earlier
/// record is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,
    pub age: u32,
    pub city: String,
}
