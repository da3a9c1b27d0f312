//! careledger node: serves one ledger per role over TCP.
//!
//! A [`NodeServer`] owns one node's ledger (through its dispatcher) and
//! answers one JSON request per connection. A [`NodeRegistry`] starts every
//! configured node in one process, all sharing a single account table.

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod server;
pub mod shutdown;

pub use config::{NodeConfig, NodeEntry, RegistryConfig};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use registry::{NodeRegistry, RunningNode};
pub use server::NodeServer;
pub use shutdown::ShutdownController;
