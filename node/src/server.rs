//! One node's TCP server.
//!
//! The accept loop takes a concurrency permit before each `accept()`, so at
//! most `max_connections` handlers run at once and further clients wait in
//! the listen backlog. Each handler reads one request, dispatches it on the
//! blocking pool (appends do a synchronous durable write under a lock),
//! writes one response and closes the connection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use careledger_accounts::SharedAccounts;
use careledger_ledger::Ledger;
use careledger_rpc::{read_message, write_message, Dispatcher, FrameError, Response};
use careledger_store::{ChainStore, StoreError};
use careledger_store_json::JsonFileStore;
use careledger_types::NodeId;

use crate::metrics::ConnectionGuard;
use crate::{NodeConfig, NodeError, NodeMetrics};

const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// State shared by every connection handler of one node.
struct ConnectionContext {
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<NodeMetrics>,
    max_request_bytes: usize,
    read_timeout: Duration,
}

/// A bound, not yet running, node server.
pub struct NodeServer {
    node_id: NodeId,
    listener: TcpListener,
    local_addr: SocketAddr,
    max_connections: usize,
    ctx: Arc<ConnectionContext>,
}

impl NodeServer {
    /// Load (or create) the node's ledger file under `config.data_dir` and
    /// bind its listener.
    pub async fn bind(config: NodeConfig, accounts: Arc<SharedAccounts>) -> Result<Self, NodeError> {
        let store = JsonFileStore::open(&config.data_dir, &config.node_id).map_err(StoreError::from)?;
        Self::bind_with_store(config, Box::new(store), accounts).await
    }

    /// Like [`bind`](Self::bind) with an explicit chain store.
    pub async fn bind_with_store(
        config: NodeConfig,
        store: Box<dyn ChainStore>,
        accounts: Arc<SharedAccounts>,
    ) -> Result<Self, NodeError> {
        let node_id = config.node_id.clone();
        let ledger = tokio::task::spawn_blocking(move || Ledger::load_or_init(node_id, store))
            .await
            .map_err(|e| NodeError::Task(e.to_string()))??;

        let metrics = Arc::new(
            NodeMetrics::new(config.node_id.as_str()).map_err(|e| NodeError::Metrics(e.to_string()))?,
        );
        metrics.chain_length.set(ledger.len() as i64);

        let addr = config.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| NodeError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        info!(
            node = %config.node_id,
            addr = %local_addr,
            blocks = ledger.len(),
            "node listener bound"
        );

        Ok(Self {
            node_id: config.node_id,
            listener,
            local_addr,
            max_connections: config.max_connections.max(1),
            ctx: Arc::new(ConnectionContext {
                dispatcher: Arc::new(Dispatcher::new(ledger, accounts)),
                metrics,
                max_request_bytes: config.max_request_bytes,
                read_timeout: config.read_timeout,
            }),
        })
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.ctx.dispatcher
    }

    pub fn metrics(&self) -> &Arc<NodeMetrics> {
        &self.ctx.metrics
    }

    /// Serve connections until `shutdown` fires, then wait for in-flight
    /// handlers to finish.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), NodeError> {
        let semaphore = Arc::new(Semaphore::new(self.max_connections));
        let mut handlers = JoinSet::new();

        info!(node = %self.node_id, addr = %self.local_addr, "node listener started");

        loop {
            let permit = tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let (stream, peer) = tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(node = %self.node_id, "accept failed: {e}");
                        continue;
                    }
                },
            };

            debug!(node = %self.node_id, peer = %peer, "connection accepted");
            let ctx = Arc::clone(&self.ctx);
            handlers.spawn(async move {
                handle_connection(stream, peer, ctx).await;
                drop(permit);
            });

            while let Some(result) = handlers.try_join_next() {
                if let Err(e) = result {
                    error!(node = %self.node_id, "connection handler panicked: {e}");
                }
            }
        }

        info!(node = %self.node_id, in_flight = handlers.len(), "node listener stopping");
        while let Some(result) = handlers.join_next().await {
            if let Err(e) = result {
                error!(node = %self.node_id, "connection handler panicked: {e}");
            }
        }
        info!(node = %self.node_id, "node stopped");
        Ok(())
    }
}

async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, ctx: Arc<ConnectionContext>) {
    let _active = ConnectionGuard::new(&ctx.metrics.active_connections);
    let node = ctx.dispatcher.node_id().clone();

    let read = tokio::time::timeout(
        ctx.read_timeout,
        read_message(&mut stream, ctx.max_request_bytes),
    )
    .await;

    let mut rejected = false;
    let response = match read {
        Ok(Ok(raw)) => dispatch(&ctx, raw).await,
        Ok(Err(FrameError::Io(e))) => {
            debug!(node = %node, peer = %peer, "connection read failed: {e}");
            return;
        }
        Ok(Err(e)) => {
            warn!(node = %node, peer = %peer, "rejected request: {e}");
            ctx.metrics.observe_rejected();
            rejected = true;
            Response::error(frame_error_message(&e))
        }
        Err(_) => {
            warn!(node = %node, peer = %peer, "request read timed out");
            ctx.metrics.observe_rejected();
            Response::error("Request timed out")
        }
    };

    if let Err(e) = write_message(&mut stream, &response).await {
        debug!(node = %node, peer = %peer, "failed to write response: {e}");
        return;
    }
    if rejected {
        drain(&mut stream).await;
    }
}

/// Discard unread input so closing the socket does not reset the
/// connection before the peer has read the response.
async fn drain(stream: &mut TcpStream) {
    let mut sink = [0u8; 4096];
    let _ = tokio::time::timeout(DRAIN_TIMEOUT, async {
        while let Ok(n) = stream.read(&mut sink).await {
            if n == 0 {
                break;
            }
        }
    })
    .await;
}

async fn dispatch(ctx: &Arc<ConnectionContext>, raw: Vec<u8>) -> Response {
    let dispatcher = Arc::clone(&ctx.dispatcher);
    let outcome = tokio::task::spawn_blocking(move || {
        let dispatched = dispatcher.dispatch(&raw);
        let length = dispatcher.summary().ok().map(|s| s.length);
        (dispatched, length)
    })
    .await;

    match outcome {
        Ok((dispatched, length)) => {
            ctx.metrics.observe(&dispatched);
            if let Some(length) = length {
                ctx.metrics.chain_length.set(length as i64);
            }
            dispatched.response
        }
        Err(e) => {
            error!(node = %ctx.dispatcher.node_id(), "request handler failed: {e}");
            Response::error("Internal error while handling request")
        }
    }
}

fn frame_error_message(e: &FrameError) -> String {
    match e {
        FrameError::TooLarge { limit } => format!("Request exceeds {limit} bytes"),
        FrameError::Empty => "Empty request".to_string(),
        FrameError::Io(e) => format!("Connection error: {e}"),
    }
}
