//! Spellcards Backend - Bitcoin NFT Gift Card Broadcast Pipeline
//!
//! Mints and transfers gift cards as Bitcoin NFTs. Spell construction and
//! proving are delegated to an external prover service; this crate owns the
//! hard part of getting the resulting two-transaction package (a commit
//! transaction and its dependent spell transaction) accepted by the network:
//!
//! 1. **validate** - structural checks on each raw transaction hex
//! 2. **package** - local commit/spell parent-child pre-flight
//! 3. **node** - full-node readiness gating before any submission
//! 4. **broadcast** - package submit, sequential fallback, external
//!    services, with bounded retries and explicit partial-failure results
//! 5. **explorer** - mempool-acceptance polling and failure diagnosis

pub mod broadcast;
pub mod codec;
pub mod config;
pub mod explorer;
pub mod external;
pub mod logging;
pub mod node;
pub mod package;
pub mod prover;
pub mod rpc;
pub mod validate;

// Re-exports: broadcast pipeline
pub use broadcast::{
    BroadcastConfig, BroadcastError, BroadcastOrchestrator, BroadcastOutcome, Strategy,
};

// Re-exports: configuration
pub use config::{ConfigError, Network, RpcConfig, SpellcardsConfig};

// Re-exports: node monitoring
pub use node::{evaluate as evaluate_readiness, NodeHealth, NodeMonitor, Readiness};

// Re-exports: transaction handling
pub use codec::{InputRef, ParsedTx};
pub use package::TopologyVerdict;
pub use validate::{TxSummary, ValidationError};

// Re-exports: clients
pub use explorer::{ExplorerClient, MempoolPoller};
pub use external::ExternalBroadcaster;
pub use prover::{ProverClient, SpellPackage, SpellRequest};

/// Satoshi conversion helpers
pub mod units {
    pub const SATS_PER_BTC: u64 = 100_000_000;

    pub fn sats_to_btc(sats: u64) -> f64 {
        sats as f64 / SATS_PER_BTC as f64
    }

    pub fn format_sats(sats: u64) -> String {
        let btc = sats_to_btc(sats);
        format!("{} sats ({:.8} BTC)", sats, btc)
    }
}
