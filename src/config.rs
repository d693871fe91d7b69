//! Environment-based Configuration for the Spellcards Backend
//!
//! All configuration comes from environment variables, loaded once at process
//! start. Sensitive values (RPC credentials, API keys) MUST come from the
//! environment, never from hardcoded values.
//!
//! # Environment Variables
//!
//! ## Network Configuration
//! - `SPELLCARDS_NETWORK` - "mainnet", "testnet4", or "signet" (default: "testnet4")
//! - `SPELLCARDS_BITCOIN_RPC_URL` - Bitcoin full node JSON-RPC endpoint
//! - `SPELLCARDS_BITCOIN_RPC_USER` - RPC Basic-Auth user
//! - `SPELLCARDS_BITCOIN_RPC_PASSWORD` - RPC Basic-Auth password
//!
//! ## Broadcast Services
//! - `SPELLCARDS_BROADCAST_API_KEY` - API key for the JSON broadcast vendor
//!
//! ## Prover
//! - `SPELLCARDS_PROVER_URL` - Spell prover service base URL
//!
//! ## Optional Settings
//! - `SPELLCARDS_TEST_MODE` - Set to "1" to bypass node readiness gating
//! - `SPELLCARDS_LOG_LEVEL` - Logging level (debug, info, warn, error)

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("test mode not allowed on {0}")]
    TestModeNotAllowed(String),
}

/// Bitcoin network environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet4,
    Signet,
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet4" | "testnet" | "test" => Ok(Network::Testnet4),
            "signet" => Ok(Network::Signet),
            _ => Err(ConfigError::InvalidValue(
                "SPELLCARDS_NETWORK".to_string(),
                format!("unknown network: {}", s),
            )),
        }
    }
}

impl Network {
    /// Check if test mode is allowed on this network
    pub fn allows_test_mode(&self) -> bool {
        matches!(self, Network::Testnet4 | Network::Signet)
    }

    /// Bech32 address prefix for this network
    pub fn address_prefix(&self) -> &'static str {
        match self {
            Network::Mainnet => "bc1",
            Network::Testnet4 | Network::Signet => "tb1",
        }
    }

    /// Block-explorer base URLs, in priority order
    pub fn explorer_urls(&self) -> Vec<&'static str> {
        match self {
            Network::Mainnet => vec![
                "https://mempool.space/api",
                "https://blockstream.info/api",
            ],
            Network::Testnet4 => vec!["https://mempool.space/testnet4/api"],
            Network::Signet => vec![
                "https://mempool.space/signet/api",
                "https://blockstream.info/signet/api",
            ],
        }
    }

    /// Primary explorer base URL
    pub fn explorer_url(&self) -> &'static str {
        self.explorer_urls()[0]
    }
}

/// Full-node JSON-RPC configuration
///
/// Immutable once constructed; shared by reference between the RPC client
/// and the readiness monitor.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URL
    pub url: String,
    /// Basic-Auth user
    pub user: Option<String>,
    /// Basic-Auth password
    pub password: Option<String>,
    /// Whether a node is configured at all
    pub enabled: bool,
}

impl RpcConfig {
    /// Build from environment; `enabled=false` when no URL is set
    pub fn from_env() -> Self {
        let url = env::var("SPELLCARDS_BITCOIN_RPC_URL").unwrap_or_default();
        let enabled = !url.is_empty();

        Self {
            url,
            user: env::var("SPELLCARDS_BITCOIN_RPC_USER").ok(),
            password: env::var("SPELLCARDS_BITCOIN_RPC_PASSWORD").ok(),
            enabled,
        }
    }

    /// Construct a config pointing at an explicit endpoint (no auth)
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user: None,
            password: None,
            enabled: true,
        }
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct SpellcardsConfig {
    /// Network environment
    pub network: Network,

    /// Full-node RPC configuration (shared)
    pub rpc: Arc<RpcConfig>,

    /// API key for the JSON broadcast vendor (vendor disabled when absent)
    pub broadcast_api_key: Option<String>,

    /// Spell prover service base URL
    pub prover_url: String,

    /// Bypass node readiness gating (controlled environments only)
    pub test_mode: bool,

    /// Log level
    pub log_level: String,
}

impl SpellcardsConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let network: Network = env::var("SPELLCARDS_NETWORK")
            .unwrap_or_else(|_| "testnet4".to_string())
            .parse()?;

        let rpc = Arc::new(RpcConfig::from_env());

        let broadcast_api_key = env::var("SPELLCARDS_BROADCAST_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());

        let prover_url = env::var("SPELLCARDS_PROVER_URL")
            .unwrap_or_else(|_| "http://localhost:17784".to_string());

        // Test mode bypasses readiness gating; never on mainnet
        let test_mode = env::var("SPELLCARDS_TEST_MODE").map(|v| v == "1").unwrap_or(false);
        if test_mode && !network.allows_test_mode() {
            return Err(ConfigError::TestModeNotAllowed(format!("{:?}", network)));
        }

        let log_level = env::var("SPELLCARDS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            network,
            rpc,
            broadcast_api_key,
            prover_url,
            test_mode,
            log_level,
        })
    }

    /// Print configuration summary (hiding sensitive values)
    pub fn print_summary(&self) {
        println!("=== Spellcards Configuration ===");
        println!("Network: {:?}", self.network);
        println!(
            "Full node: {}",
            if self.rpc.enabled { self.rpc.url.as_str() } else { "(not configured)" }
        );
        println!(
            "RPC auth: {}",
            if self.rpc.user.is_some() { "basic" } else { "none" }
        );
        println!("Explorer: {}", self.network.explorer_url());
        println!(
            "Broadcast API key: {}",
            if self.broadcast_api_key.is_some() { "set" } else { "not set" }
        );
        println!("Prover: {}", self.prover_url);
        println!("Test Mode: {}", self.test_mode);
        println!("Log Level: {}", self.log_level);
        println!("================================");
    }
}
