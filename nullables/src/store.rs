//! Nullable chain store: thread-safe in-memory storage for testing.

use careledger_store::{ChainStore, StoreError};
use careledger_types::Block;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An in-memory [`ChainStore`] whose writes can be made to fail.
///
/// Clones share state, so a test can keep a handle after boxing one clone
/// into a ledger.
#[derive(Clone, Default)]
pub struct NullChainStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    blocks: Mutex<Option<Vec<Block>>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl NullChainStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already-persisted chain, as if loaded from disk.
    pub fn with_blocks(blocks: Vec<Block>) -> Self {
        let store = Self::new();
        *store.inner.blocks.lock().unwrap() = Some(blocks);
        store
    }

    /// Make every subsequent `save` fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.inner.saves.load(Ordering::SeqCst)
    }

    /// The chain as last persisted.
    pub fn persisted(&self) -> Option<Vec<Block>> {
        self.inner.blocks.lock().unwrap().clone()
    }
}

impl ChainStore for NullChainStore {
    fn load(&self) -> Result<Option<Vec<Block>>, StoreError> {
        Ok(self.persisted())
    }

    fn save(&self, blocks: &[Block]) -> Result<(), StoreError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "null store: writes disabled",
            )));
        }
        *self.inner.blocks.lock().unwrap() = Some(blocks.to_vec());
        self.inner.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let store = NullChainStore::new();
        let handle = store.clone();
        store.save(&[]).unwrap();
        assert_eq!(handle.save_count(), 1);
        assert_eq!(handle.persisted(), Some(vec![]));

        handle.fail_writes(true);
        assert!(store.save(&[]).is_err());
        assert_eq!(handle.save_count(), 1);
    }

    #[test]
    fn empty_store_loads_none() {
        assert!(NullChainStore::new().load().unwrap().is_none());
    }
}
