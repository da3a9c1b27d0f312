//! File-backed [`ChainStore`].
//!
//! Saves go to a sibling `*.tmp` file which is flushed to disk and then
//! renamed over the ledger file, so a crash mid-save leaves either the old
//! chain or the new one on disk.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use careledger_store::{ChainStore, StoreError};
use careledger_types::{Block, NodeId};
use tracing::debug;

use crate::JsonStoreError;

/// File name used for a node's ledger inside the data directory.
pub fn ledger_file_name(node_id: &NodeId) -> String {
    format!("{}_ledger.json", node_id)
}

/// Stores one node's chain as a JSON array at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Open the store for `node_id` inside `data_dir`, creating the
    /// directory if needed.
    pub fn open(data_dir: &Path, node_id: &NodeId) -> Result<Self, JsonStoreError> {
        fs::create_dir_all(data_dir).map_err(|source| JsonStoreError::Io {
            path: data_dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            path: data_dir.join(ledger_file_name(node_id)),
        })
    }

    /// Use an explicit file path (e.g. for offline verification).
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_err(&self, source: std::io::Error) -> JsonStoreError {
        JsonStoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn read_blocks(&self) -> Result<Option<Vec<Block>>, JsonStoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.path).map_err(|e| self.io_err(e))?;
        let blocks =
            serde_json::from_slice::<Vec<Block>>(&data).map_err(|e| JsonStoreError::Malformed {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Some(blocks))
    }

    fn write_blocks(&self, blocks: &[Block]) -> Result<(), JsonStoreError> {
        let data = serde_json::to_vec_pretty(blocks).map_err(|e| JsonStoreError::Malformed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        let tmp_path = self.tmp_path();
        let mut file = File::create(&tmp_path).map_err(|e| self.io_err(e))?;
        file.write_all(&data).map_err(|e| self.io_err(e))?;
        file.sync_all().map_err(|e| self.io_err(e))?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_err(e))?;
        debug!(path = %self.path.display(), blocks = blocks.len(), "ledger file rewritten");
        Ok(())
    }
}

impl ChainStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<Block>>, StoreError> {
        Ok(self.read_blocks()?)
    }

    fn save(&self, blocks: &[Block]) -> Result<(), StoreError> {
        Ok(self.write_blocks(blocks)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use careledger_crypto::compute_hash;
    use careledger_types::{BlockHash, Payload, Timestamp};
    use serde_json::json;

    fn node() -> NodeId {
        NodeId::new("hospital_node").unwrap()
    }

    fn chain(len: u64) -> Vec<Block> {
        let mut blocks: Vec<Block> = Vec::new();
        for index in 0..len {
            let payload: Payload = json!({"action": "patient_visit", "n": index, "nested": {"b": 1, "a": [1, 2]}})
                .as_object()
                .cloned()
                .unwrap();
            let previous_hash = blocks.last().map(|b| b.hash).unwrap_or(BlockHash::ZERO);
            let timestamp = Timestamp::new(1_700_000_000_000 + index);
            let hash = compute_hash(index, timestamp, &payload, &previous_hash, &node());
            blocks.push(Block {
                index,
                timestamp,
                payload,
                previous_hash,
                originator: node(),
                hash,
            });
        }
        blocks
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path(), &node()).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn open_creates_data_dir_and_names_file_after_node() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("nested").join("data");
        let store = JsonFileStore::open(&data_dir, &node()).unwrap();
        assert!(data_dir.is_dir());
        assert_eq!(store.path(), data_dir.join("hospital_node_ledger.json"));
    }

    #[test]
    fn save_then_load_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path(), &node()).unwrap();
        let blocks = chain(4);
        store.save(&blocks).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, blocks);

        // Re-saving the loaded chain reproduces the file byte for byte.
        let first = fs::read(store.path()).unwrap();
        store.save(&loaded).unwrap();
        let second = fs::read(store.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn save_overwrites_and_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path(), &node()).unwrap();
        store.save(&chain(3)).unwrap();
        store.save(&chain(1)).unwrap();

        assert_eq!(store.load().unwrap().unwrap().len(), 1);
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn file_is_a_json_array_of_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path(), &node()).unwrap();
        store.save(&chain(2)).unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(store.path()).unwrap()).unwrap();
        let arr = raw.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0]["previous_hash"], json!("0"));
        assert_eq!(arr[1]["previous_hash"], arr[0]["hash"]);
    }

    #[test]
    fn malformed_file_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path(), &node()).unwrap();
        fs::write(store.path(), b"{not json").unwrap();

        match store.load() {
            Err(StoreError::Corruption(msg)) => assert!(msg.contains("malformed")),
            other => panic!("expected corruption, got {other:?}"),
        }
    }

    #[test]
    fn unwritable_location_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::at_path(dir.path().join("missing_dir").join("ledger.json"));
        assert!(matches!(store.save(&chain(1)), Err(StoreError::Io(_))));
    }
}
