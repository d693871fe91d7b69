//! Broadcast Orchestrator
//!
//! Drives a commit/spell transaction package from raw hex to network
//! acceptance. Strategies are tried in priority order against whatever
//! infrastructure is configured:
//!
//! 1. package submission to the full node (`submitpackage`)
//! 2. sequential single-transaction submission to the full node
//! 3. external HTTP broadcast services
//!
//! Each broadcast invocation is independent and stateless; the only shared
//! state is the read-only RPC configuration. Every stage's output gates the
//! next - readiness before submission, commit before spell, submission
//! before mempool confirmation - so the pipeline is strictly sequential
//! within one call. All retries are bounded.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::codec::{self, ParsedTx};
use crate::config::{RpcConfig, SpellcardsConfig};
use crate::explorer::{ExplorerClient, MempoolPoller};
use crate::external::{ExternalBroadcaster, ExternalError};
use crate::node::NodeMonitor;
use crate::package;
use crate::rpc::{NodeErrorKind, RpcClient, RpcError};
use crate::validate::{self, ValidationError};

/// Timing and retry tuning for one broadcast invocation
#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    /// Timeout for single-transaction submission
    pub submit_timeout: Duration,
    /// Timeout for package submission (the node validates both at once)
    pub package_timeout: Duration,
    /// Timeout for the diagnostic chain-info re-query
    pub diagnose_timeout: Duration,
    /// How long to wait for the commit to reach the public mempool before
    /// sending the spell
    pub mempool_wait: Duration,
    /// Poll interval while waiting on the mempool
    pub mempool_interval: Duration,
    /// Total post-hoc confirmation wait per transaction
    pub confirm_wait: Duration,
    /// Poll interval for post-hoc confirmation
    pub confirm_interval: Duration,
    /// Spell-alone resubmission attempts after the commit succeeded
    pub spell_retry_attempts: u32,
    /// Fixed delay between spell resubmission attempts
    pub spell_retry_delay: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            submit_timeout: Duration::from_secs(30),
            package_timeout: Duration::from_secs(60),
            diagnose_timeout: Duration::from_secs(15),
            mempool_wait: Duration::from_secs(15),
            mempool_interval: Duration::from_secs(2),
            confirm_wait: Duration::from_secs(10),
            confirm_interval: Duration::from_secs(2),
            spell_retry_attempts: 3,
            spell_retry_delay: Duration::from_secs(2),
        }
    }
}

/// Which submission path ultimately carried the package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Package,
    Sequential,
    External,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Package => write!(f, "package"),
            Strategy::Sequential => write!(f, "sequential"),
            Strategy::External => write!(f, "external"),
        }
    }
}

/// Terminal result of a broadcast invocation
#[derive(Debug, Clone)]
pub enum BroadcastOutcome {
    /// Both transactions were accepted by some submission path
    Success {
        commit_txid: String,
        spell_txid: String,
        strategy: Strategy,
        /// Informational mempool-visibility flags; never a failure reason
        commit_in_mempool: bool,
        spell_in_mempool: bool,
    },
    /// The commit was broadcast but the spell could not be - the commit id
    /// is surfaced so the caller is never left owning an untracked spend
    Partial {
        commit_txid: String,
        spell_error: String,
        commit_in_mempool: bool,
    },
}

impl BroadcastOutcome {
    pub fn commit_txid(&self) -> &str {
        match self {
            BroadcastOutcome::Success { commit_txid, .. } => commit_txid,
            BroadcastOutcome::Partial { commit_txid, .. } => commit_txid,
        }
    }
}

/// Broadcast failure taxonomy
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("{role} transaction failed validation: {source}")]
    Validation {
        role: &'static str,
        #[source]
        source: ValidationError,
    },

    #[error("node not ready: {reason}")]
    NodeNotReady { reason: String },

    #[error("spent output predates the node's prune height {prune_height}; a different funding UTXO is required")]
    UtxoPruned {
        prune_height: u64,
        input_height: Option<u64>,
    },

    #[error("spent output not yet known to the node; retry once sync catches up")]
    SyncRequired { blocks_remaining: Option<u64> },

    #[error("node rejected the package topology: {detail}")]
    PackageTopology { detail: String },

    #[error("node RPC failed: {0}")]
    Rpc(#[from] RpcError),

    #[error("external broadcast failed: {0}")]
    External(#[from] ExternalError),
}

impl BroadcastError {
    /// Machine-readable error code for API responses and logs
    pub fn error_code(&self) -> &'static str {
        match self {
            BroadcastError::Validation { .. } => "VALIDATION_ERROR",
            BroadcastError::NodeNotReady { .. } => "NODE_NOT_READY",
            BroadcastError::UtxoPruned { .. } => "UTXO_PRUNED",
            BroadcastError::SyncRequired { .. } => "SYNC_REQUIRED",
            BroadcastError::PackageTopology { .. } => "PACKAGE_TOPOLOGY_ERROR",
            BroadcastError::Rpc(RpcError::Timeout { .. }) => "RPC_TIMEOUT",
            BroadcastError::Rpc(RpcError::Connection { .. }) => "RPC_CONNECTION_ERROR",
            BroadcastError::Rpc(_) => "RPC_ERROR",
            BroadcastError::External(_) => "EXTERNAL_SERVICE_ERROR",
        }
    }

    /// Whether the same call can reasonably succeed later without the
    /// caller changing anything
    pub fn is_retryable(&self) -> bool {
        match self {
            BroadcastError::Validation { .. } => false,
            BroadcastError::UtxoPruned { .. } => false,
            BroadcastError::PackageTopology { .. } => false,
            BroadcastError::NodeNotReady { .. } => true,
            BroadcastError::SyncRequired { .. } => true,
            BroadcastError::Rpc(e) => e.is_transport(),
            BroadcastError::External(_) => true,
        }
    }
}

/// What the package-submit stage decided
enum PackageSubmit {
    Accepted { commit_txid: String, spell_txid: String },
    /// Topology rejection, missing method, or node transport failure -
    /// worth trying the sequential path
    Fallback { reason: String },
    Fatal(RpcError),
}

/// What the sequential stage decided
enum Sequential {
    Done(Result<BroadcastOutcome, BroadcastError>),
    /// The node became unreachable mid-sequence; carries the commit txid
    /// when the commit had already been accepted
    NodeUnavailable {
        commit_txid: Option<String>,
        reason: String,
    },
}

/// Top-level broadcast state machine
pub struct BroadcastOrchestrator {
    rpc: Option<RpcClient>,
    monitor: Option<NodeMonitor>,
    explorer: ExplorerClient,
    poller: MempoolPoller,
    external: ExternalBroadcaster,
    test_mode: bool,
    config: BroadcastConfig,
}

impl BroadcastOrchestrator {
    /// Build from application configuration
    pub fn from_config(cfg: &SpellcardsConfig) -> Self {
        let rpc_config = if cfg.rpc.enabled { Some(cfg.rpc.clone()) } else { None };
        let explorer = ExplorerClient::new(cfg.network.explorer_url());
        let external = ExternalBroadcaster::new(cfg.network, cfg.broadcast_api_key.clone());
        Self::with_components(rpc_config, explorer, external, cfg.test_mode, BroadcastConfig::default())
    }

    /// Build from explicit components (tests, custom wiring)
    pub fn with_components(
        rpc_config: Option<Arc<RpcConfig>>,
        explorer: ExplorerClient,
        external: ExternalBroadcaster,
        test_mode: bool,
        config: BroadcastConfig,
    ) -> Self {
        let rpc = rpc_config.as_ref().map(|c| RpcClient::new(c.clone()));
        let monitor = rpc_config.map(NodeMonitor::new);
        let poller = MempoolPoller::new(explorer.clone());

        Self {
            rpc,
            monitor,
            explorer,
            poller,
            external,
            test_mode,
            config,
        }
    }

    /// Broadcast a commit/spell package.
    pub async fn broadcast_package(
        &self,
        commit_hex: &str,
        spell_hex: &str,
    ) -> Result<BroadcastOutcome, BroadcastError> {
        // ValidatingInputs: structural checks before any network call
        let commit_summary = validate::validate(commit_hex)
            .map_err(|source| BroadcastError::Validation { role: "commit", source })?;
        let spell_summary = validate::validate(spell_hex)
            .map_err(|source| BroadcastError::Validation { role: "spell", source })?;

        info!(
            commit_txid = %commit_summary.txid,
            commit_size = commit_summary.size,
            spell_txid = %spell_summary.txid,
            spell_size = spell_summary.size,
            "broadcasting spell package"
        );

        let commit = codec::parse_tx(commit_hex).map_err(|e| BroadcastError::Validation {
            role: "commit",
            source: ValidationError::Undecodable(e.to_string()),
        })?;
        let spell = codec::parse_tx(spell_hex).map_err(|e| BroadcastError::Validation {
            role: "spell",
            source: ValidationError::Undecodable(e.to_string()),
        })?;

        if let (Some(rpc), Some(monitor)) = (&self.rpc, &self.monitor) {
            // CheckingReadiness
            let readiness = monitor.ready(self.test_mode).await;
            if !readiness.ready {
                return Err(BroadcastError::NodeNotReady {
                    reason: readiness.reason,
                });
            }
            debug!(reason = %readiness.reason, "node ready");

            // Local topology pre-flight. The node is the authority; a bad
            // verdict only sharpens the diagnostics if submission fails.
            let verdict = package::verify_parsed(&commit, &spell);
            if !verdict.valid {
                warn!(
                    commit_txid = %verdict.commit_txid,
                    spell_inputs = ?verdict.spell_inputs,
                    "spell does not spend any commit output; node will likely reject the package"
                );
            }

            // AttemptingPackageSubmit
            match self.submit_package(rpc, commit_hex, spell_hex, &commit, &spell).await {
                PackageSubmit::Accepted { commit_txid, spell_txid } => {
                    info!(%commit_txid, %spell_txid, "package accepted by node");
                    return Ok(self.confirm_success(commit_txid, spell_txid, Strategy::Package).await);
                }
                PackageSubmit::Fallback { reason } => {
                    warn!(%reason, "package submission failed, falling back to sequential");
                }
                PackageSubmit::Fatal(e) => return Err(BroadcastError::Rpc(e)),
            }

            // AttemptingSequentialFallback
            match self.sequential_submit(rpc, commit_hex, spell_hex, &commit).await {
                Sequential::Done(result) => return result,
                Sequential::NodeUnavailable { commit_txid, reason } => {
                    warn!(%reason, "node unavailable mid-sequence, falling back to external services");
                    return self.external_submit(commit_hex, spell_hex, commit_txid).await;
                }
            }
        }

        // AttemptingExternalFallback: no full node configured
        self.external_submit(commit_hex, spell_hex, None).await
    }

    /// Submit both transactions in one `submitpackage` call.
    async fn submit_package(
        &self,
        rpc: &RpcClient,
        commit_hex: &str,
        spell_hex: &str,
        commit: &ParsedTx,
        spell: &ParsedTx,
    ) -> PackageSubmit {
        let params = vec![json!([commit_hex, spell_hex])];
        let result = match rpc.call("submitpackage", params, self.config.package_timeout).await {
            Ok(result) => result,
            Err(e) => {
                return match e.node_kind() {
                    Some(NodeErrorKind::VerifyRejected) | Some(NodeErrorKind::MethodNotFound) => {
                        PackageSubmit::Fallback { reason: e.to_string() }
                    }
                    _ if e.is_transport() => PackageSubmit::Fallback { reason: e.to_string() },
                    _ => PackageSubmit::Fatal(e),
                };
            }
        };

        // submitpackage reports per-package verdicts in-band
        if let Some(msg) = result.get("package_msg").and_then(Value::as_str) {
            if msg != "success" {
                return PackageSubmit::Fallback {
                    reason: format!("package_msg: {}", msg),
                };
            }
        }

        let (commit_txid, spell_txid) = extract_package_txids(&result, commit, spell);
        PackageSubmit::Accepted { commit_txid, spell_txid }
    }

    /// Submit the commit alone, wait for it to surface, then the spell.
    async fn sequential_submit(
        &self,
        rpc: &RpcClient,
        commit_hex: &str,
        spell_hex: &str,
        commit: &ParsedTx,
    ) -> Sequential {
        let commit_txid = match self.send_raw(rpc, commit_hex).await {
            Ok(txid) => txid,
            Err(e) if e.node_kind() == Some(NodeErrorKind::VerifyRejected) => {
                // The node does not know the funding UTXO. Same error text,
                // two different remedies - figure out which one applies.
                return Sequential::Done(Err(self.diagnose_missing_input(rpc, commit).await));
            }
            Err(e) if e.node_kind() == Some(NodeErrorKind::AlreadyInChain) => {
                commit.txid.clone()
            }
            Err(e) if e.is_transport() => {
                return Sequential::NodeUnavailable {
                    commit_txid: None,
                    reason: e.to_string(),
                };
            }
            Err(e) => return Sequential::Done(Err(BroadcastError::Rpc(e))),
        };

        info!(%commit_txid, "commit accepted by node, waiting for mempool visibility");
        let commit_visible = self
            .poller
            .await_acceptance(&commit_txid, self.config.mempool_wait, self.config.mempool_interval)
            .await;
        if !commit_visible {
            warn!(%commit_txid, "commit not yet visible in public mempool, sending spell anyway");
        }

        let mut last_error = format!("spell not submitted after commit {}", commit_txid);
        for attempt in 1..=self.config.spell_retry_attempts {
            match self.send_raw(rpc, spell_hex).await {
                Ok(spell_txid) => {
                    return Sequential::Done(Ok(self
                        .confirm_success(commit_txid, spell_txid, Strategy::Sequential)
                        .await));
                }
                Err(e) if e.is_transport() => {
                    return Sequential::NodeUnavailable {
                        commit_txid: Some(commit_txid),
                        reason: e.to_string(),
                    };
                }
                Err(e) => {
                    // Most likely the commit has not propagated yet
                    warn!(attempt, error = %e, "spell submission failed");
                    last_error = e.to_string();
                }
            }

            if attempt < self.config.spell_retry_attempts {
                tokio::time::sleep(self.config.spell_retry_delay).await;
            }
        }

        Sequential::Done(Ok(self.confirm_partial(commit_txid, last_error).await))
    }

    /// Broadcast through external services. `commit_txid` is set when an
    /// earlier stage already got the commit accepted.
    async fn external_submit(
        &self,
        commit_hex: &str,
        spell_hex: &str,
        commit_txid: Option<String>,
    ) -> Result<BroadcastOutcome, BroadcastError> {
        let commit_txid = match commit_txid {
            Some(txid) => txid,
            // The commit must fully succeed somewhere before the spell goes out
            None => self.external.broadcast_tx(commit_hex).await?,
        };

        info!(%commit_txid, "commit broadcast externally, submitting spell");

        let mut last_error: Option<ExternalError> = None;
        for attempt in 1..=self.config.spell_retry_attempts {
            match self.external.broadcast_tx(spell_hex).await {
                Ok(spell_txid) => {
                    return Ok(self
                        .confirm_success(commit_txid, spell_txid, Strategy::External)
                        .await);
                }
                Err(e) => {
                    if e.is_parent_missing() {
                        warn!(attempt, error = %e, "spell rejected: commit not yet visible to service");
                    } else {
                        warn!(attempt, error = %e, "spell broadcast failed");
                    }
                    last_error = Some(e);
                }
            }

            if attempt < self.config.spell_retry_attempts {
                tokio::time::sleep(self.config.spell_retry_delay).await;
            }
        }

        let spell_error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "spell broadcast failed".to_string());
        Ok(self.confirm_partial(commit_txid, spell_error).await)
    }

    /// Distinguish a pruned-away UTXO from one the node has not synced yet.
    async fn diagnose_missing_input(&self, rpc: &RpcClient, tx: &ParsedTx) -> BroadcastError {
        let info = match rpc
            .call("getblockchaininfo", vec![], self.config.diagnose_timeout)
            .await
        {
            Ok(info) => info,
            Err(e) => return BroadcastError::Rpc(e),
        };

        let pruned = info.get("pruned").and_then(Value::as_bool).unwrap_or(false);
        let prune_height = info.get("pruneheight").and_then(Value::as_u64);
        let blocks = info.get("blocks").and_then(Value::as_u64).unwrap_or(0);
        let headers = info.get("headers").and_then(Value::as_u64).unwrap_or(0);

        // Where does the spent output live? The explorer knows even when
        // the local node does not.
        let input_height = match tx.inputs.first() {
            Some(input) => self
                .explorer
                .tx_status(&input.txid)
                .await
                .ok()
                .and_then(|status| status.block_height),
            None => None,
        };

        if pruned {
            if let (Some(prune_height), Some(input_height)) = (prune_height, input_height) {
                if input_height < prune_height {
                    return BroadcastError::UtxoPruned {
                        prune_height,
                        input_height: Some(input_height),
                    };
                }
            }
        }

        // A synced node rejecting an input it has fully validated is a
        // structural rejection, not a sync artifact - waiting will not help.
        if let Some(input_height) = input_height {
            if input_height <= blocks && headers <= blocks {
                return BroadcastError::PackageTopology {
                    detail: format!(
                        "node rejected spend of an output at height {} despite being synced to {}",
                        input_height, blocks
                    ),
                };
            }
        }

        let blocks_remaining = match input_height {
            Some(h) if h > blocks => Some(h - blocks),
            _ => {
                // The node's own header count undershoots while headers are
                // still syncing; the public tip sharpens the estimate when
                // the explorer is reachable.
                let tip = match self.explorer.tip_height().await {
                    Ok(tip) => tip.max(headers),
                    Err(_) => headers,
                };
                tip.checked_sub(blocks).filter(|d| *d > 0)
            }
        };

        BroadcastError::SyncRequired { blocks_remaining }
    }

    async fn send_raw(&self, rpc: &RpcClient, tx_hex: &str) -> Result<String, RpcError> {
        let result = rpc
            .call("sendrawtransaction", vec![json!(tx_hex)], self.config.submit_timeout)
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RpcError::Protocol("sendrawtransaction returned a non-string".to_string()))
    }

    /// Best-effort mempool flags; a miss never fails the broadcast.
    async fn confirm_success(
        &self,
        commit_txid: String,
        spell_txid: String,
        strategy: Strategy,
    ) -> BroadcastOutcome {
        let commit_in_mempool = self
            .poller
            .await_acceptance(&commit_txid, self.config.confirm_wait, self.config.confirm_interval)
            .await;
        let spell_in_mempool = self
            .poller
            .await_acceptance(&spell_txid, self.config.confirm_wait, self.config.confirm_interval)
            .await;

        info!(
            %commit_txid,
            %spell_txid,
            %strategy,
            commit_in_mempool,
            spell_in_mempool,
            "broadcast complete"
        );

        BroadcastOutcome::Success {
            commit_txid,
            spell_txid,
            strategy,
            commit_in_mempool,
            spell_in_mempool,
        }
    }

    async fn confirm_partial(&self, commit_txid: String, spell_error: String) -> BroadcastOutcome {
        let commit_in_mempool = self
            .poller
            .await_acceptance(&commit_txid, self.config.confirm_wait, self.config.confirm_interval)
            .await;

        warn!(%commit_txid, %spell_error, "partial broadcast: commit out, spell failed");

        BroadcastOutcome::Partial {
            commit_txid,
            spell_error,
            commit_in_mempool,
        }
    }
}

/// Pull the resulting txids out of a `submitpackage` response.
///
/// The response keys results by wtxid in a map whose ordering the node does
/// not guarantee, so returned ids are matched against the locally computed
/// commit/spell txids; submission order is only a fallback for unrecognized
/// ids. A single returned id serves both roles (degenerate node behavior).
fn extract_package_txids(result: &Value, commit: &ParsedTx, spell: &ParsedTx) -> (String, String) {
    let mut ids: Vec<String> = Vec::new();

    if let Some(tx_results) = result.get("tx-results").and_then(Value::as_object) {
        for entry in tx_results.values() {
            if let Some(txid) = entry.get("txid").and_then(Value::as_str) {
                ids.push(txid.to_string());
            }
        }
    } else if let Some(list) = result.as_array() {
        for entry in list {
            if let Some(txid) = entry.as_str() {
                ids.push(txid.to_string());
            }
        }
    }

    if ids.is_empty() {
        return (commit.txid.clone(), spell.txid.clone());
    }

    if ids.len() == 1 {
        return (ids[0].clone(), ids[0].clone());
    }

    let commit_txid = if ids.contains(&commit.txid) {
        commit.txid.clone()
    } else {
        ids[0].clone()
    };
    let spell_txid = if ids.contains(&spell.txid) {
        spell.txid.clone()
    } else {
        ids[1].clone()
    };

    (commit_txid, spell_txid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::absolute::LockTime;
    use bitcoin::consensus::encode;
    use bitcoin::transaction::Version;
    use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};

    fn parsed(prev: OutPoint) -> ParsedTx {
        let tx = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: prev,
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            }],
            output: vec![TxOut {
                value: Amount::from_sat(5_000),
                script_pubkey: ScriptBuf::from_bytes(vec![0x51; 40]),
            }],
        };
        codec::parse_tx(&encode::serialize_hex(&tx)).unwrap()
    }

    #[test]
    fn test_extract_matches_local_txids_regardless_of_map_order() {
        let commit = parsed(OutPoint::null());
        let spell = parsed(OutPoint::new(commit.txid.parse().unwrap(), 0));

        // tx-results keyed by wtxid, spell listed before commit
        let result = json!({
            "package_msg": "success",
            "tx-results": {
                "w2": { "txid": spell.txid.clone() },
                "w1": { "txid": commit.txid.clone() },
            }
        });

        let (c, s) = extract_package_txids(&result, &commit, &spell);
        assert_eq!(c, commit.txid);
        assert_eq!(s, spell.txid);
    }

    #[test]
    fn test_extract_single_id_serves_both_roles() {
        let commit = parsed(OutPoint::null());
        let spell = parsed(OutPoint::new(commit.txid.parse().unwrap(), 0));

        let result = json!({
            "tx-results": { "w1": { "txid": "ab12" } }
        });

        let (c, s) = extract_package_txids(&result, &commit, &spell);
        assert_eq!(c, "ab12");
        assert_eq!(s, "ab12");
    }

    #[test]
    fn test_extract_falls_back_to_submission_order() {
        let commit = parsed(OutPoint::null());
        let spell = parsed(OutPoint::new(commit.txid.parse().unwrap(), 0));

        let result = json!({
            "tx-results": {
                "w1": { "txid": "id-one" },
                "w2": { "txid": "id-two" },
            }
        });

        let (c, s) = extract_package_txids(&result, &commit, &spell);
        assert_eq!(c, "id-one");
        assert_eq!(s, "id-two");
    }

    #[test]
    fn test_error_codes_and_retryability() {
        let err = BroadcastError::Validation {
            role: "commit",
            source: ValidationError::Empty,
        };
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(!err.is_retryable());

        let err = BroadcastError::NodeNotReady {
            reason: "syncing".to_string(),
        };
        assert_eq!(err.error_code(), "NODE_NOT_READY");
        assert!(err.is_retryable());

        let err = BroadcastError::UtxoPruned {
            prune_height: 500_000,
            input_height: Some(400_000),
        };
        assert_eq!(err.error_code(), "UTXO_PRUNED");
        assert!(!err.is_retryable());

        let err = BroadcastError::SyncRequired {
            blocks_remaining: Some(120),
        };
        assert_eq!(err.error_code(), "SYNC_REQUIRED");
        assert!(err.is_retryable());

        let err = BroadcastError::Rpc(RpcError::Timeout {
            method: "sendrawtransaction".to_string(),
            seconds: 30,
        });
        assert_eq!(err.error_code(), "RPC_TIMEOUT");
        assert!(err.is_retryable());
    }
}
