//! Whole-chain integrity checks.

use careledger_crypto::hash_block;
use careledger_types::Block;

use crate::LedgerError;

/// Check every hash-chain invariant of `blocks`.
///
/// - the chain is non-empty and starts with a genesis block
///   (`index 0`, `previous_hash "0"`)
/// - `blocks[i].index == i`
/// - `blocks[i].previous_hash == blocks[i - 1].hash`
/// - every stored hash equals the hash recomputed from the block's fields
pub fn validate_chain(blocks: &[Block]) -> Result<(), LedgerError> {
    let genesis = blocks.first().ok_or(LedgerError::EmptyChain)?;
    if !genesis.is_genesis() {
        return Err(LedgerError::IntegrityViolation {
            index: genesis.index,
            reason: "first block is not a genesis block".into(),
        });
    }

    for (position, block) in blocks.iter().enumerate() {
        let expected_index = position as u64;
        if block.index != expected_index {
            return Err(LedgerError::IntegrityViolation {
                index: block.index,
                reason: format!("expected index {expected_index}"),
            });
        }

        if position > 0 {
            let previous = &blocks[position - 1];
            if block.previous_hash != previous.hash {
                return Err(LedgerError::IntegrityViolation {
                    index: block.index,
                    reason: format!(
                        "previous_hash {} does not match hash {} of block {}",
                        block.previous_hash, previous.hash, previous.index
                    ),
                });
            }
        }

        let recomputed = hash_block(block);
        if recomputed != block.hash {
            return Err(LedgerError::IntegrityViolation {
                index: block.index,
                reason: format!("stored hash {} but fields hash to {}", block.hash, recomputed),
            });
        }
    }

    Ok(())
}
