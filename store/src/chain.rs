//! Chain storage trait.

use crate::StoreError;
use careledger_types::Block;

/// Durable storage for one node's full block sequence.
///
/// Writes are whole-chain rewrites: `save` replaces everything previously
/// stored. Implementations must make `save` atomic with respect to a crash,
/// so a later `load` sees either the previous chain or the new one.
pub trait ChainStore: Send + Sync {
    /// Load the stored chain, or `None` if nothing has been stored yet.
    fn load(&self) -> Result<Option<Vec<Block>>, StoreError>;

    /// Durably replace the stored chain with `blocks`.
    fn save(&self, blocks: &[Block]) -> Result<(), StoreError>;

    /// Human-readable location of the store, for logs.
    fn describe(&self) -> String;
}
