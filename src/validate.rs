//! Transaction Pre-flight Validation
//!
//! Structural checks on raw transaction hex before anything touches the
//! network. This is a defense against obviously malformed input, not a
//! consensus check - the full node and the network remain the authority on
//! scripts, signatures and spendability.

use thiserror::Error;

use crate::codec::{self, CodecError};

/// Minimum plausible transaction size in bytes
pub const MIN_TX_BYTES: usize = 100;

/// Maximum accepted transaction size in bytes
pub const MAX_TX_BYTES: usize = 400_000;

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("transaction hex is empty")]
    Empty,

    #[error("transaction hex contains non-hex characters")]
    NotHex,

    #[error("transaction too small: {size} bytes (minimum {MIN_TX_BYTES})")]
    TooSmall { size: usize },

    #[error("transaction too large: {size} bytes (maximum {MAX_TX_BYTES})")]
    TooLarge { size: usize },

    #[error("transaction does not decode: {0}")]
    Undecodable(String),

    #[error("transaction has no inputs")]
    NoInputs,

    #[error("transaction has no outputs")]
    NoOutputs,
}

/// Summary of a transaction that passed validation, for logging and
/// downstream diagnostics.
#[derive(Debug, Clone)]
pub struct TxSummary {
    pub txid: String,
    pub size: usize,
    pub input_count: usize,
    pub output_count: usize,
}

/// Validate a raw transaction hex string.
///
/// Pure and idempotent; performs no network I/O.
pub fn validate(tx_hex: &str) -> Result<TxSummary, ValidationError> {
    if tx_hex.is_empty() {
        return Err(ValidationError::Empty);
    }

    if tx_hex.len() % 2 != 0 || !tx_hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ValidationError::NotHex);
    }

    let size = tx_hex.len() / 2;
    if size < MIN_TX_BYTES {
        return Err(ValidationError::TooSmall { size });
    }
    if size > MAX_TX_BYTES {
        return Err(ValidationError::TooLarge { size });
    }

    let parsed = codec::parse_tx(tx_hex).map_err(|e| match e {
        CodecError::InvalidHex(_) => ValidationError::NotHex,
        CodecError::Decode(detail) => ValidationError::Undecodable(detail),
    })?;

    if parsed.inputs.is_empty() {
        return Err(ValidationError::NoInputs);
    }
    if parsed.output_count == 0 {
        return Err(ValidationError::NoOutputs);
    }

    Ok(TxSummary {
        txid: parsed.txid,
        size: parsed.size,
        input_count: parsed.inputs.len(),
        output_count: parsed.output_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::absolute::LockTime;
    use bitcoin::consensus::encode;
    use bitcoin::transaction::Version;
    use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};

    fn valid_tx_hex() -> String {
        let tx = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint::null(),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            }],
            output: vec![TxOut {
                value: Amount::from_sat(5_000),
                script_pubkey: ScriptBuf::from_bytes(vec![0x51; 64]),
            }],
        };
        encode::serialize_hex(&tx)
    }

    #[test]
    fn test_rejects_empty_and_non_hex() {
        assert!(matches!(validate(""), Err(ValidationError::Empty)));
        assert!(matches!(validate("not hex!"), Err(ValidationError::NotHex)));
        assert!(matches!(validate("abc"), Err(ValidationError::NotHex)));
    }

    #[test]
    fn test_rejects_size_bounds() {
        // 50 bytes of valid hex: too short to be a real transaction
        assert!(matches!(
            validate(&"ab".repeat(50)),
            Err(ValidationError::TooSmall { size: 50 })
        ));

        assert!(matches!(
            validate(&"ab".repeat(MAX_TX_BYTES + 1)),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_rejects_undecodable_bytes() {
        assert!(matches!(
            validate(&"00".repeat(150)),
            Err(ValidationError::Undecodable(_))
        ));
    }

    #[test]
    fn test_accepts_real_transaction() {
        let tx_hex = valid_tx_hex();
        let summary = validate(&tx_hex).unwrap();

        assert_eq!(summary.size, tx_hex.len() / 2);
        assert_eq!(summary.input_count, 1);
        assert_eq!(summary.output_count, 1);
        assert!(summary.size >= MIN_TX_BYTES);
    }

    #[test]
    fn test_validate_is_idempotent() {
        let tx_hex = valid_tx_hex();
        let first = validate(&tx_hex).unwrap();
        let second = validate(&tx_hex).unwrap();

        assert_eq!(first.txid, second.txid);
        assert_eq!(first.size, second.size);
        assert_eq!(first.input_count, second.input_count);
        assert_eq!(first.output_count, second.output_count);
    }
}
