//! Hash-chained ledger.
//!
//! Each node owns exactly one [`Ledger`]: an append-only sequence of blocks
//! starting at a genesis block, persisted in full after every append.
//! There is no cross-node agreement; every node's chain is independent.

pub mod error;
pub mod genesis;
pub mod ledger;
pub mod validation;

pub use error::LedgerError;
pub use genesis::{create_genesis_block, genesis_payload};
pub use ledger::{Ledger, LedgerSummary};
pub use validation::validate_chain;
