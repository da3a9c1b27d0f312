//! Starts every configured node in one process.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use careledger_accounts::SharedAccounts;
use careledger_rpc::Dispatcher;
use careledger_types::NodeId;

use crate::{NodeError, NodeMetrics, NodeServer, RegistryConfig, ShutdownController};

/// A node whose accept loop is running on the runtime.
pub struct RunningNode {
    pub node_id: NodeId,
    pub local_addr: SocketAddr,
    pub dispatcher: Arc<Dispatcher>,
    pub metrics: Arc<NodeMetrics>,
    handle: JoinHandle<Result<(), NodeError>>,
}

/// All nodes of one process, sharing a single account table.
pub struct NodeRegistry {
    nodes: Vec<RunningNode>,
    accounts: Arc<SharedAccounts>,
    shutdown: ShutdownController,
}

impl NodeRegistry {
    /// Load every node's ledger, bind every listener, then start serving.
    ///
    /// Nothing is served unless every node binds: a failure on any node
    /// drops the listeners already bound and returns the error.
    pub async fn start(config: &RegistryConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let accounts = Arc::new(SharedAccounts::new(
            config.accounts.clone(),
            config.incentives.clone(),
        ));

        let mut servers = Vec::with_capacity(config.nodes.len());
        for node_config in config.node_configs() {
            servers.push(NodeServer::bind(node_config, Arc::clone(&accounts)).await?);
        }

        let shutdown = ShutdownController::new();
        let nodes = servers
            .into_iter()
            .map(|server| {
                let node = RunningNode {
                    node_id: server.node_id().clone(),
                    local_addr: server.local_addr(),
                    dispatcher: Arc::clone(server.dispatcher()),
                    metrics: Arc::clone(server.metrics()),
                    handle: tokio::spawn(server.run(shutdown.subscribe())),
                };
                info!(node = %node.node_id, addr = %node.local_addr, "node started");
                node
            })
            .collect();

        Ok(Self {
            nodes,
            accounts,
            shutdown,
        })
    }

    pub fn nodes(&self) -> &[RunningNode] {
        &self.nodes
    }

    pub fn node(&self, node_id: &str) -> Option<&RunningNode> {
        self.nodes.iter().find(|n| n.node_id.as_str() == node_id)
    }

    pub fn addr_of(&self, node_id: &str) -> Option<SocketAddr> {
        self.node(node_id).map(|n| n.local_addr)
    }

    pub fn accounts(&self) -> &Arc<SharedAccounts> {
        &self.accounts
    }

    /// A handle that can trigger shutdown, e.g. from a signal listener.
    pub fn shutdown_controller(&self) -> ShutdownController {
        self.shutdown.clone()
    }

    /// Serve until SIGINT/SIGTERM, then stop every node.
    pub async fn run_until_signal(self) -> Result<(), NodeError> {
        self.shutdown.wait_for_signal().await;
        self.stop().await
    }

    /// Stop every accept loop and wait for in-flight requests to finish.
    pub async fn stop(self) -> Result<(), NodeError> {
        self.shutdown.shutdown();
        let mut first_error = None;
        for node in self.nodes {
            let outcome = match node.handle.await {
                Ok(result) => result,
                Err(e) => Err(NodeError::Task(e.to_string())),
            };
            if let Err(e) = outcome {
                error!(node = %node.node_id, "node exited with error: {e}");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                info!("all nodes stopped");
                Ok(())
            }
        }
    }
}
