//! Full Node Readiness Monitoring
//!
//! Takes a fresh snapshot of node state (chain, network, mempool) and turns
//! it into a readiness verdict for broadcasting. Health is never cached:
//! node state changes continuously, so every check re-queries.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::config::RpcConfig;
use crate::rpc::{NodeErrorKind, RpcClient, RpcError};

/// Extended timeout for health checks; a syncing node answers slowly.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(60);

/// Minimum verification progress for a syncing node to accept broadcasts
pub const SYNC_PROGRESS_FLOOR: f64 = 0.30;

/// Minimum downloaded blocks for a syncing node to accept broadcasts
pub const SYNC_BLOCKS_FLOOR: u64 = 1000;

/// Snapshot of node state
///
/// Recomputed fresh on every readiness check.
#[derive(Debug, Clone, Default)]
pub struct NodeHealth {
    /// The node answered (possibly with a warmup error)
    pub connected: bool,
    /// The node is still loading its block index
    pub loading: bool,
    /// Chain name reported by the node
    pub chain: String,
    /// Validated block height
    pub blocks: u64,
    /// Best known header height
    pub headers: u64,
    /// Verification progress in [0, 1]
    pub verification_progress: f64,
    /// Node is still in initial block download
    pub initial_block_download: bool,
    /// Peer connection count
    pub connections: u64,
    /// Node runs with pruning enabled
    pub pruned: bool,
    /// Lowest block height the node retains, when pruned
    pub prune_height: Option<u64>,
    /// Mempool transaction count
    pub mempool_size: u64,
    /// Mempool size in bytes
    pub mempool_bytes: u64,
    /// Human-readable detail when the node could not be queried cleanly
    pub diagnostic: Option<String>,
}

/// Readiness verdict with its reason
#[derive(Debug, Clone)]
pub struct Readiness {
    pub ready: bool,
    pub reason: String,
}

/// Polls node state and computes readiness
#[derive(Debug)]
pub struct NodeMonitor {
    rpc: RpcClient,
}

impl NodeMonitor {
    pub fn new(config: Arc<RpcConfig>) -> Self {
        Self {
            rpc: RpcClient::new(config),
        }
    }

    /// Take a fresh node health snapshot.
    ///
    /// A -28 (warmup) response on the chain-info call reports
    /// `connected=true, loading=true`: the connection worked, the node is in
    /// a transient state. Timeouts and connection failures are distinguished
    /// in the diagnostic.
    pub async fn health(&self) -> NodeHealth {
        let mut health = NodeHealth::default();

        match self.rpc.call("getblockchaininfo", vec![], HEALTH_TIMEOUT).await {
            Ok(info) => {
                health.connected = true;
                health.chain = str_field(&info, "chain");
                health.blocks = u64_field(&info, "blocks");
                health.headers = u64_field(&info, "headers");
                health.verification_progress = info
                    .get("verificationprogress")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0);
                health.initial_block_download = info
                    .get("initialblockdownload")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                health.pruned = info.get("pruned").and_then(Value::as_bool).unwrap_or(false);
                health.prune_height = info.get("pruneheight").and_then(Value::as_u64);
            }
            Err(ref e) if e.node_kind() == Some(NodeErrorKind::Warmup) => {
                health.connected = true;
                health.loading = true;
                health.diagnostic = Some(e.to_string());
            }
            Err(RpcError::Timeout { seconds, .. }) => {
                health.diagnostic = Some(format!(
                    "node did not respond within {}s (overloaded or mid-reindex?)",
                    seconds
                ));
            }
            Err(e) => {
                health.diagnostic = Some(e.to_string());
            }
        }

        if health.connected && !health.loading {
            if let Ok(net) = self.rpc.call("getnetworkinfo", vec![], HEALTH_TIMEOUT).await {
                health.connections = u64_field(&net, "connections");
            }
            if let Ok(mempool) = self.rpc.call("getmempoolinfo", vec![], HEALTH_TIMEOUT).await {
                health.mempool_size = u64_field(&mempool, "size");
                health.mempool_bytes = u64_field(&mempool, "bytes");
            }
        }

        debug!(
            connected = health.connected,
            loading = health.loading,
            blocks = health.blocks,
            headers = health.headers,
            progress = health.verification_progress,
            ibd = health.initial_block_download,
            peers = health.connections,
            "node health snapshot"
        );

        health
    }

    /// Take a snapshot and evaluate it.
    pub async fn ready(&self, test_mode: bool) -> Readiness {
        let health = self.health().await;
        evaluate(&health, test_mode)
    }
}

/// Pure readiness rule over a health snapshot.
///
/// A node that finished initial block download is ready regardless of peer
/// count - a synced node needs no peers to serve local RPC. A node still in
/// IBD can accept broadcasts once it has peers and enough chain downloaded
/// that dependency UTXOs are plausibly present; requiring full sync here
/// would block legitimate broadcasts for hours on a freshly started node.
pub fn evaluate(health: &NodeHealth, test_mode: bool) -> Readiness {
    if test_mode {
        return Readiness {
            ready: true,
            reason: "test mode override".to_string(),
        };
    }

    if !health.connected {
        return Readiness {
            ready: false,
            reason: health
                .diagnostic
                .clone()
                .unwrap_or_else(|| "node unreachable".to_string()),
        };
    }

    if health.loading {
        return Readiness {
            ready: false,
            reason: "node is loading its block index".to_string(),
        };
    }

    if !health.initial_block_download {
        return Readiness {
            ready: true,
            reason: "node fully synced".to_string(),
        };
    }

    if health.connections > 0
        && health.verification_progress > SYNC_PROGRESS_FLOOR
        && health.blocks > SYNC_BLOCKS_FLOOR
    {
        return Readiness {
            ready: true,
            reason: format!(
                "node syncing but usable ({:.1}% verified, {} blocks, {} peers)",
                health.verification_progress * 100.0,
                health.blocks,
                health.connections
            ),
        };
    }

    Readiness {
        ready: false,
        reason: format!(
            "node still syncing ({:.1}% verified, {} of {} blocks, {} peers)",
            health.verification_progress * 100.0,
            health.blocks,
            health.headers,
            health.connections
        ),
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn u64_field(value: &Value, key: &str) -> u64 {
    value.get(key).and_then(Value::as_u64).unwrap_or(0)
}
