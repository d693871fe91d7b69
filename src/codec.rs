//! Raw Transaction Codec
//!
//! Extracts the structural facts the broadcast pipeline needs from a raw
//! transaction hex string: the txid, the (previous txid, previous vout)
//! reference of every input, and the output count and byte size. Wire
//! decoding goes through `bitcoin::consensus`; scripts and signatures are
//! never interpreted here.

use bitcoin::consensus::encode;
use bitcoin::Transaction;
use thiserror::Error;

/// Codec errors
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("failed to decode transaction: {0}")]
    Decode(String),
}

/// A single input's reference to the output it spends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRef {
    /// Txid of the transaction that produced the spent output
    pub txid: String,
    /// Index of the spent output
    pub vout: u32,
}

impl std::fmt::Display for InputRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// Structural view of a parsed transaction
///
/// Derived and read-only; produced fresh for each hex string.
#[derive(Debug, Clone)]
pub struct ParsedTx {
    /// Transaction id (big-endian display form)
    pub txid: String,
    /// Ordered input references
    pub inputs: Vec<InputRef>,
    /// Number of outputs
    pub output_count: usize,
    /// Serialized size in bytes
    pub size: usize,
}

/// Parse a raw transaction hex string.
pub fn parse_tx(tx_hex: &str) -> Result<ParsedTx, CodecError> {
    let bytes = hex::decode(tx_hex)?;
    let tx: Transaction =
        encode::deserialize(&bytes).map_err(|e| CodecError::Decode(e.to_string()))?;

    let inputs = tx
        .input
        .iter()
        .map(|input| InputRef {
            txid: input.previous_output.txid.to_string(),
            vout: input.previous_output.vout,
        })
        .collect();

    Ok(ParsedTx {
        txid: tx.compute_txid().to_string(),
        inputs,
        output_count: tx.output.len(),
        size: bytes.len(),
    })
}
