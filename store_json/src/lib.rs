//! JSON-file storage backend for careledger.
//!
//! Each node's chain is stored as one pretty-printed JSON array of blocks,
//! fully rewritten on every save.

pub mod error;
pub mod file;

pub use error::JsonStoreError;
pub use file::{ledger_file_name, JsonFileStore};
