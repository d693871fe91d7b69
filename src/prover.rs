//! Spell Prover Client
//!
//! Thin HTTP client for the external proof/spell-generation service. The
//! service is a black box: it takes a mint or transfer request and returns
//! two pieces of signed transaction hex (commit + spell) plus metadata.
//! Everything it returns is validated and broadcast by this crate without
//! further interpretation.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed fee rate attached to every spell request, in sat/vB.
/// Fee estimation is out of scope; the prover applies this as-is.
pub const DEFAULT_FEE_RATE: f64 = 2.0;

/// Proving takes a while; this bounds the wait
pub const PROVE_TIMEOUT: Duration = Duration::from_secs(120);

/// Prover errors
#[derive(Debug, Error)]
pub enum ProverError {
    #[error("prover request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("prover rejected the request: {0}")]
    Rejected(String),
}

/// A spell request, covering both mint and transfer operations
#[derive(Debug, Clone, Serialize)]
pub struct SpellRequest {
    /// Operation name understood by the prover
    pub op: &'static str,
    /// Recipient address for the minted or transferred card
    pub destination: String,
    /// Card face value in satoshis
    pub value_sats: u64,
    /// Funding UTXO reference, `txid:vout`
    pub funding_utxo: String,
    /// Change address for leftover funding
    pub change_address: String,
    /// Fee rate in sat/vB
    pub fee_rate: f64,
    /// Existing card reference for transfers, `txid:vout`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_utxo: Option<String>,
}

impl SpellRequest {
    /// Request minting a new gift card
    pub fn mint(
        destination: impl Into<String>,
        value_sats: u64,
        funding_utxo: impl Into<String>,
        change_address: impl Into<String>,
    ) -> Self {
        Self {
            op: "mint",
            destination: destination.into(),
            value_sats,
            funding_utxo: funding_utxo.into(),
            change_address: change_address.into(),
            fee_rate: DEFAULT_FEE_RATE,
            card_utxo: None,
        }
    }

    /// Request transferring an existing gift card
    pub fn transfer(
        card_utxo: impl Into<String>,
        destination: impl Into<String>,
        value_sats: u64,
        funding_utxo: impl Into<String>,
        change_address: impl Into<String>,
    ) -> Self {
        Self {
            op: "transfer",
            destination: destination.into(),
            value_sats,
            funding_utxo: funding_utxo.into(),
            change_address: change_address.into(),
            fee_rate: DEFAULT_FEE_RATE,
            card_utxo: Some(card_utxo.into()),
        }
    }
}

/// What the prover hands back: the two-transaction package, ready to
/// validate and broadcast
#[derive(Debug, Clone, Deserialize)]
pub struct SpellPackage {
    /// Signed commit transaction hex
    pub commit_tx: String,
    /// Signed spell transaction hex
    pub spell_tx: String,
    /// Opaque prover metadata (app id, proof reference)
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Prover service HTTP client
#[derive(Debug, Clone)]
pub struct ProverClient {
    client: Client,
    base_url: String,
}

impl ProverClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Ask the prover to build and prove a spell package.
    pub async fn prove(&self, request: &SpellRequest) -> Result<SpellPackage, ProverError> {
        let url = format!("{}/spells/prove", self.base_url);
        let resp = self
            .client
            .post(&url)
            .timeout(PROVE_TIMEOUT)
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ProverError::Rejected(detail));
        }

        Ok(resp.json().await?)
    }
}
