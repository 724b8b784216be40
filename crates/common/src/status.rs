//! Status strings returned in `Response.status`.
//!
//! These are part of the wire contract: clients compare `KEY_DELETED` by
//! equality, so the values must not change.

pub const KEY_STORED: &str = "private key stored";
pub const KEY_RETRIEVED: &str = "private key retrieved";
pub const KEY_DELETED: &str = "private key deleted";
pub const KEYS_FETCHED: &str = "keys fetched";
