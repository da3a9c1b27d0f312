//! Genesis block creation: the first block of every node's chain.
//!
//! The genesis block has `index: 0`, `previous_hash: BlockHash::ZERO`
//! (rendered `"0"`), a fixed descriptive payload, and the owning node as
//! originator.

use careledger_crypto::compute_hash;
use careledger_types::{Block, BlockHash, NodeId, Payload, Timestamp};
use serde_json::Value;

/// Record type carried by every genesis payload.
pub const GENESIS_ACTION: &str = "genesis";

/// The fixed payload of a node's genesis block.
pub fn genesis_payload(node_id: &NodeId) -> Payload {
    let mut payload = Payload::new();
    payload.insert("action".into(), Value::from(GENESIS_ACTION));
    payload.insert(
        "message".into(),
        Value::from(format!("Genesis block for {node_id}")),
    );
    payload
}

/// Create the genesis block for `node_id` at `timestamp`.
pub fn create_genesis_block(node_id: &NodeId, timestamp: Timestamp) -> Block {
    let payload = genesis_payload(node_id);
    let hash = compute_hash(0, timestamp, &payload, &BlockHash::ZERO, node_id);
    Block {
        index: 0,
        timestamp,
        payload,
        previous_hash: BlockHash::ZERO,
        originator: node_id.clone(),
        hash,
    }
}
