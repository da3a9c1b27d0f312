//! Abstract storage for a node's chain.
//!
//! Every backend (JSON file, in-memory for testing) implements
//! [`ChainStore`]. The ledger depends only on the trait.

pub mod chain;
pub mod error;

pub use chain::ChainStore;
pub use error::StoreError;
