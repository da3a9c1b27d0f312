//! Hashing primitives for careledger.
//!
//! - Canonical, key-order-independent JSON encoding
//! - SHA-256 block hashing over exactly the fields in the hash contract

pub mod canonical;
pub mod hash;

pub use canonical::canonical_json;
pub use hash::{compute_hash, hash_block, sha256, verify_block_hash};
