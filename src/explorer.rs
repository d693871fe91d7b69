//! Block-Explorer HTTP Client and Mempool Poller
//!
//! Esplora-style API access used for mempool-acceptance confirmation and
//! for failure diagnosis (where a spent output's containing block lives,
//! how far the public tip is ahead of the local node).

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Per-request timeout for explorer calls
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Explorer error types
#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transaction not found: {0}")]
    TxNotFound(String),

    #[error("parse error: {0}")]
    ParseError(String),
}

/// Transaction confirmation status
#[derive(Debug, Clone, Deserialize)]
pub struct TxStatus {
    pub confirmed: bool,
    pub block_height: Option<u64>,
    pub block_hash: Option<String>,
    pub block_time: Option<u64>,
}

/// Esplora-style explorer HTTP client
#[derive(Debug, Clone)]
pub struct ExplorerClient {
    client: Client,
    base_url: String,
}

impl ExplorerClient {
    /// Create a new client with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the public network knows this transaction (mempool or block)
    pub async fn tx_exists(&self, txid: &str) -> Result<bool, ExplorerError> {
        let url = format!("{}/tx/{}", self.base_url, txid);
        let resp = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    /// Get transaction confirmation status
    pub async fn tx_status(&self, txid: &str) -> Result<TxStatus, ExplorerError> {
        let url = format!("{}/tx/{}/status", self.base_url, txid);
        let resp = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ExplorerError::TxNotFound(txid.to_string()));
        }

        let status: TxStatus = resp.json().await?;
        Ok(status)
    }

    /// Get current block height
    pub async fn tip_height(&self) -> Result<u64, ExplorerError> {
        let url = format!("{}/blocks/tip/height", self.base_url);
        let resp = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let height: u64 = resp
            .text()
            .await?
            .trim()
            .parse()
            .map_err(|_| ExplorerError::ParseError("failed to parse block height".to_string()))?;

        Ok(height)
    }
}

/// Polls the explorer until a transaction appears in the public mempool.
///
/// Pure polling - no push mechanism is assumed. Used both to sequence
/// dependent submissions (commit must be visible before the spell is sent)
/// and as a post-hoc confirmation signal.
#[derive(Debug, Clone)]
pub struct MempoolPoller {
    client: ExplorerClient,
}

impl MempoolPoller {
    pub fn new(client: ExplorerClient) -> Self {
        Self { client }
    }

    /// Wait until `txid` is visible or `timeout` elapses.
    ///
    /// Returns false on timeout; explorer errors count as "not visible yet".
    pub async fn await_acceptance(&self, txid: &str, timeout: Duration, interval: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            match self.client.tx_exists(txid).await {
                Ok(true) => {
                    debug!(txid, "transaction visible in mempool");
                    return true;
                }
                Ok(false) => {}
                Err(e) => debug!(txid, error = %e, "mempool poll failed"),
            }

            if tokio::time::Instant::now() + interval > deadline {
                return false;
            }
            tokio::time::sleep(interval).await;
        }
    }
}
