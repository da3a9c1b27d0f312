//! Fundamental types for the careledger node network.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: block hashes, blocks, timestamps and node identifiers.

pub mod block;
pub mod error;
pub mod hash;
pub mod node_id;
pub mod time;

pub use block::{payload_action, Block, Payload};
pub use error::TypesError;
pub use hash::BlockHash;
pub use node_id::NodeId;
pub use time::Timestamp;
