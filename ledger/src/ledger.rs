//! The per-node ledger.

use careledger_crypto::compute_hash;
use careledger_store::ChainStore;
use careledger_types::{Block, BlockHash, NodeId, Payload, Timestamp};
use tracing::{error, info};

use crate::genesis::create_genesis_block;
use crate::validation::validate_chain;
use crate::LedgerError;

/// An append-only, hash-chained sequence of blocks backed by a [`ChainStore`].
///
/// `append` takes `&mut self`, so callers sharing a ledger across tasks must
/// hold an exclusive lock around it; appends are therefore ordered by lock
/// acquisition and can never produce duplicate indices.
pub struct Ledger {
    node_id: NodeId,
    blocks: Vec<Block>,
    store: Box<dyn ChainStore>,
}

/// Summary of a ledger's current state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSummary {
    pub node_id: NodeId,
    pub length: u64,
    pub head: BlockHash,
}

impl Ledger {
    /// Load the chain from `store`, or create and persist a genesis block
    /// if nothing is stored yet.
    ///
    /// A stored chain is validated before it is accepted; a chain that
    /// violates any hash-chain invariant is refused.
    pub fn load_or_init(node_id: NodeId, store: Box<dyn ChainStore>) -> Result<Self, LedgerError> {
        match store.load()? {
            Some(blocks) => {
                if let Err(e) = validate_chain(&blocks) {
                    error!(node = %node_id, store = %store.describe(), "refusing corrupted chain: {e}");
                    return Err(e);
                }
                info!(
                    node = %node_id,
                    store = %store.describe(),
                    blocks = blocks.len(),
                    "ledger loaded"
                );
                Ok(Self {
                    node_id,
                    blocks,
                    store,
                })
            }
            None => {
                let genesis = create_genesis_block(&node_id, Timestamp::now());
                let blocks = vec![genesis];
                store.save(&blocks)?;
                info!(
                    node = %node_id,
                    store = %store.describe(),
                    hash = %blocks[0].hash,
                    "genesis block created"
                );
                Ok(Self {
                    node_id,
                    blocks,
                    store,
                })
            }
        }
    }

    /// Append a block carrying `payload`, stamped with the current time.
    pub fn append(&mut self, payload: Payload) -> Result<Block, LedgerError> {
        self.append_at(payload, Timestamp::now())
    }

    /// Append a block carrying `payload` with an explicit timestamp.
    ///
    /// The new chain is persisted before the block becomes visible in
    /// memory. If the durable write fails, the in-memory chain is left
    /// exactly as it was and the error is returned.
    pub fn append_at(&mut self, payload: Payload, timestamp: Timestamp) -> Result<Block, LedgerError> {
        let last = self.last();
        let index = last.index + 1;
        let previous_hash = last.hash;
        let hash = compute_hash(index, timestamp, &payload, &previous_hash, &self.node_id);
        let block = Block {
            index,
            timestamp,
            payload,
            previous_hash,
            originator: self.node_id.clone(),
            hash,
        };

        self.blocks.push(block);
        if let Err(e) = self.store.save(&self.blocks) {
            self.blocks.pop();
            error!(node = %self.node_id, index, "append aborted, ledger write failed: {e}");
            return Err(e.into());
        }

        let block = self.last().clone();
        info!(node = %self.node_id, index, hash = %block.hash, "block appended");
        Ok(block)
    }

    /// A copy of the full chain, in order.
    pub fn snapshot(&self) -> Vec<Block> {
        self.blocks.clone()
    }

    /// Borrow the full chain, in order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The most recent block. A ledger always holds at least its genesis.
    pub fn last(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always `false`: a ledger always holds at least its genesis block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            node_id: self.node_id.clone(),
            length: self.blocks.len() as u64,
            head: self.last().hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careledger_crypto::verify_block_hash;
    use careledger_nullables::NullChainStore;
    use serde_json::json;
    use std::sync::{Arc, RwLock};

    fn node() -> NodeId {
        NodeId::new("doctor_node").unwrap()
    }

    fn payload(value: serde_json::Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    fn ledger_with_store() -> (Ledger, NullChainStore) {
        let store = NullChainStore::new();
        let ledger = Ledger::load_or_init(node(), Box::new(store.clone())).unwrap();
        (ledger, store)
    }

    #[test]
    fn init_creates_and_persists_genesis() {
        let (ledger, store) = ledger_with_store();
        assert_eq!(ledger.len(), 1);
        let genesis = ledger.last();
        assert_eq!(genesis.index, 0);
        assert!(genesis.previous_hash.is_zero());
        assert_eq!(genesis.originator, node());
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.persisted().unwrap(), ledger.snapshot());
    }

    #[test]
    fn append_links_to_previous_block() {
        let (mut ledger, store) = ledger_with_store();
        let genesis_hash = ledger.last().hash;

        let block = ledger
            .append(payload(json!({"action": "blood_test", "doctor": "doctor"})))
            .unwrap();

        assert_eq!(block.index, 1);
        assert_eq!(block.previous_hash, genesis_hash);
        assert_eq!(block.originator, node());
        assert!(verify_block_hash(&block));
        assert_eq!(store.persisted().unwrap().len(), 2);
        assert!(validate_chain(ledger.blocks()).is_ok());
    }

    #[test]
    fn failed_write_leaves_memory_untouched() {
        let (mut ledger, store) = ledger_with_store();
        ledger.append(payload(json!({"action": "report"}))).unwrap();
        let before = ledger.snapshot();

        store.fail_writes(true);
        let result = ledger.append(payload(json!({"action": "prescription"})));
        assert!(matches!(result, Err(LedgerError::Storage(_))));
        assert_eq!(ledger.snapshot(), before);
        assert_eq!(store.persisted().unwrap(), before);

        store.fail_writes(false);
        let block = ledger.append(payload(json!({"action": "prescription"}))).unwrap();
        assert_eq!(block.index, 2);
    }

    #[test]
    fn genesis_write_failure_is_an_error() {
        let store = NullChainStore::new();
        store.fail_writes(true);
        let result = Ledger::load_or_init(node(), Box::new(store));
        assert!(matches!(result, Err(LedgerError::Storage(_))));
    }

    #[test]
    fn reload_accepts_valid_chain() {
        let (mut ledger, store) = ledger_with_store();
        for i in 0..3 {
            ledger.append(payload(json!({"action": "report", "i": i}))).unwrap();
        }
        let persisted = store.persisted().unwrap();

        let reloaded =
            Ledger::load_or_init(node(), Box::new(NullChainStore::with_blocks(persisted.clone())))
                .unwrap();
        assert_eq!(reloaded.snapshot(), persisted);
        assert_eq!(reloaded.summary().length, 4);
        assert_eq!(reloaded.summary().head, persisted[3].hash);
    }

    #[test]
    fn reload_refuses_corrupted_chain() {
        let (mut ledger, store) = ledger_with_store();
        ledger.append(payload(json!({"action": "report"}))).unwrap();
        let mut persisted = store.persisted().unwrap();
        persisted[1].payload.insert("diagnostic".into(), json!("mallory"));

        let result = Ledger::load_or_init(node(), Box::new(NullChainStore::with_blocks(persisted)));
        assert!(matches!(
            result,
            Err(LedgerError::IntegrityViolation { index: 1, .. })
        ));
    }

    #[test]
    fn reload_refuses_empty_array() {
        let result = Ledger::load_or_init(node(), Box::new(NullChainStore::with_blocks(vec![])));
        assert!(matches!(result, Err(LedgerError::EmptyChain)));
    }

    #[test]
    fn concurrent_appends_get_contiguous_indices() {
        let (ledger, _store) = ledger_with_store();
        let ledger = Arc::new(RwLock::new(ledger));
        let workers = 8;
        let per_worker = 25;

        let handles: Vec<_> = (0..workers)
            .map(|w| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    for i in 0..per_worker {
                        let p = payload(json!({"action": "report", "worker": w, "i": i}));
                        ledger.write().unwrap().append(p).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let ledger = ledger.read().unwrap();
        assert_eq!(ledger.len(), 1 + workers * per_worker);
        for (i, block) in ledger.blocks().iter().enumerate() {
            assert_eq!(block.index, i as u64);
        }
        assert!(validate_chain(ledger.blocks()).is_ok());
    }
}
