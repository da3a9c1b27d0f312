//! Registry and node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use careledger_accounts::{AccountTable, IncentiveRules};
use careledger_types::NodeId;

use crate::NodeError;

/// One node to start: its role id and listening port.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub node_id: NodeId,
    pub port: u16,
}

impl NodeEntry {
    pub fn new(node_id: &str, port: u16) -> Result<Self, NodeError> {
        let node_id = NodeId::new(node_id).map_err(|e| NodeError::Config(e.to_string()))?;
        Ok(Self { node_id, port })
    }
}

/// Configuration for a whole registry of nodes.
///
/// Can be loaded from a TOML file via [`RegistryConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so an
/// empty file yields the four role nodes with the static account table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Directory holding one `<node_id>_ledger.json` per node.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Interface every node binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Per-node bound on concurrently handled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Requests larger than this are answered with an error.
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,

    /// How long a connection may take to deliver its request.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_nodes")]
    pub nodes: Vec<NodeEntry>,

    #[serde(default = "AccountTable::with_default_roles")]
    pub accounts: AccountTable,

    #[serde(default)]
    pub incentives: IncentiveRules,
}

/// Settings for a single node server, derived from a [`RegistryConfig`].
#[derive(Clone, Debug)]
pub struct NodeConfig {
    pub node_id: NodeId,
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub max_connections: usize,
    pub max_request_bytes: usize,
    pub read_timeout: Duration,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./careledger_data")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> usize {
    64
}

fn default_max_request_bytes() -> usize {
    careledger_rpc::DEFAULT_MAX_MESSAGE_SIZE
}

fn default_read_timeout_ms() -> u64 {
    30_000
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_nodes() -> Vec<NodeEntry> {
    [
        ("doctor_node", 5001),
        ("diagnostic_node", 5002),
        ("pharmacy_node", 5003),
        ("hospital_node", 5004),
    ]
    .into_iter()
    .filter_map(|(id, port)| NodeEntry::new(id, port).ok())
    .collect()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl RegistryConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject configurations that could not run: no nodes, duplicate node
    /// ids, duplicate fixed ports, or a zero connection bound.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.nodes.is_empty() {
            return Err(NodeError::Config("no nodes configured".into()));
        }
        if self.max_connections == 0 {
            return Err(NodeError::Config("max_connections must be at least 1".into()));
        }
        let mut ids = HashSet::new();
        let mut ports = HashSet::new();
        for entry in &self.nodes {
            if !ids.insert(&entry.node_id) {
                return Err(NodeError::Config(format!(
                    "duplicate node id {}",
                    entry.node_id
                )));
            }
            // Port 0 asks the OS for an ephemeral port and may repeat.
            if entry.port != 0 && !ports.insert(entry.port) {
                return Err(NodeError::Config(format!("duplicate port {}", entry.port)));
            }
        }
        Ok(())
    }

    /// Per-node settings, one per configured node, in order.
    pub fn node_configs(&self) -> Vec<NodeConfig> {
        self.nodes
            .iter()
            .map(|entry| NodeConfig {
                node_id: entry.node_id.clone(),
                host: self.host.clone(),
                port: entry.port,
                data_dir: self.data_dir.clone(),
                max_connections: self.max_connections,
                max_request_bytes: self.max_request_bytes,
                read_timeout: Duration::from_millis(self.read_timeout_ms),
            })
            .collect()
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            host: default_host(),
            max_connections: default_max_connections(),
            max_request_bytes: default_max_request_bytes(),
            read_timeout_ms: default_read_timeout_ms(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            nodes: default_nodes(),
            accounts: AccountTable::with_default_roles(),
            incentives: IncentiveRules::default(),
        }
    }
}

impl NodeConfig {
    /// A single node on an ephemeral localhost port with default limits.
    pub fn local(node_id: NodeId, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            node_id,
            host: default_host(),
            port: 0,
            data_dir: data_dir.into(),
            max_connections: default_max_connections(),
            max_request_bytes: default_max_request_bytes(),
            read_timeout: Duration::from_millis(default_read_timeout_ms()),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
