//! Prometheus metrics for one careledger node.
//!
//! Each [`NodeMetrics`] owns a dedicated [`Registry`] with a constant
//! `node` label, so several nodes in one process never collide. The text
//! exposition is available through [`NodeMetrics::encode`].

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

use careledger_rpc::Dispatched;

/// Label used for requests that could not be decoded.
pub const INVALID_ACTION: &str = "invalid";

pub struct NodeMetrics {
    pub registry: Registry,

    /// Requests answered, by action (`invalid` for undecodable ones).
    pub requests: IntCounterVec,
    pub blocks_appended: IntCounter,

    pub chain_length: IntGauge,
    pub active_connections: IntGauge,
}

impl NodeMetrics {
    pub fn new(node_id: &str) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = register_int_counter_vec_with_registry!(
            Opts::new("careledger_requests_total", "Requests answered by this node")
                .const_label("node", node_id),
            &["action"],
            registry
        )?;

        let blocks_appended = register_int_counter_with_registry!(
            Opts::new(
                "careledger_blocks_appended_total",
                "Blocks appended to this node's chain"
            )
            .const_label("node", node_id),
            registry
        )?;

        let chain_length = register_int_gauge_with_registry!(
            Opts::new("careledger_chain_length", "Blocks in this node's chain")
                .const_label("node", node_id),
            registry
        )?;

        let active_connections = register_int_gauge_with_registry!(
            Opts::new(
                "careledger_active_connections",
                "Connections currently being handled"
            )
            .const_label("node", node_id),
            registry
        )?;

        Ok(Self {
            registry,
            requests,
            blocks_appended,
            chain_length,
            active_connections,
        })
    }

    /// Count one answered request.
    pub fn observe(&self, dispatched: &Dispatched) {
        let action = dispatched.action.unwrap_or(INVALID_ACTION);
        self.requests.with_label_values(&[action]).inc();
        if action == "add_block" && dispatched.response.is_success() {
            self.blocks_appended.inc();
        }
    }

    /// Count a request rejected before dispatch (framing or timeout).
    pub fn observe_rejected(&self) {
        self.requests.with_label_values(&[INVALID_ACTION]).inc();
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Keeps `active_connections` incremented for as long as it lives.
pub struct ConnectionGuard<'a> {
    gauge: &'a IntGauge,
}

impl<'a> ConnectionGuard<'a> {
    pub fn new(gauge: &'a IntGauge) -> Self {
        gauge.inc();
        Self { gauge }
    }
}

impl Drop for ConnectionGuard<'_> {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}
