//! The block record stored in every node's chain.

use serde::{Deserialize, Serialize};

use crate::{BlockHash, NodeId, Timestamp};

/// Free-form structured record carried by a block.
///
/// Every appended payload carries at least a string `action` field naming
/// the record type (`blood_test`, `report`, `prescription`, ...).
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// One immutable, hash-linked ledger entry.
///
/// `hash` covers `(index, timestamp, payload, previous_hash, originator)`;
/// see `careledger_crypto::compute_hash` for the exact encoding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: Timestamp,
    pub payload: Payload,
    pub previous_hash: BlockHash,
    pub originator: NodeId,
    pub hash: BlockHash,
}

impl Block {
    /// The record type named by the payload, if present.
    pub fn action(&self) -> Option<&str> {
        payload_action(&self.payload)
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash.is_zero()
    }
}

/// Read the string `action` field of a payload.
pub fn payload_action(payload: &Payload) -> Option<&str> {
    payload.get("action").and_then(|v| v.as_str())
}
