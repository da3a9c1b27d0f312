//! SHA-256 hashing for blocks.

use careledger_types::{Block, BlockHash, NodeId, Payload, Timestamp};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::canonical::canonical_json;

/// Compute a 256-bit SHA-256 digest of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the hash of a block from exactly the fields it commits to.
///
/// The fields are assembled into one JSON object and canonically encoded,
/// so the digest depends neither on payload key order nor on how `Block`
/// happens to be laid out in memory.
pub fn compute_hash(
    index: u64,
    timestamp: Timestamp,
    payload: &Payload,
    previous_hash: &BlockHash,
    originator: &NodeId,
) -> BlockHash {
    let mut fields = Map::new();
    fields.insert("index".into(), Value::from(index));
    fields.insert("timestamp".into(), Value::from(timestamp.as_millis()));
    fields.insert("payload".into(), Value::Object(payload.clone()));
    fields.insert("previous_hash".into(), Value::String(previous_hash.to_string()));
    fields.insert("originator".into(), Value::String(originator.to_string()));

    let encoded = canonical_json(&Value::Object(fields));
    BlockHash::new(sha256(encoded.as_bytes()))
}

/// Recompute the hash of an existing block from its stored fields.
pub fn hash_block(block: &Block) -> BlockHash {
    compute_hash(
        block.index,
        block.timestamp,
        &block.payload,
        &block.previous_hash,
        &block.originator,
    )
}

/// Whether a block's stored hash matches its recomputed hash.
pub fn verify_block_hash(block: &Block) -> bool {
    hash_block(block) == block.hash
}
