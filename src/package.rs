//! Package Topology Verification
//!
//! Confirms that the spell transaction is a direct child of the commit
//! transaction - that at least one spell input spends an output the commit
//! transaction produces. This runs locally before submission as a fast
//! pre-flight; the full node performs the authoritative check, so a negative
//! verdict is diagnostic material, never a gate.

use crate::codec::{self, CodecError, InputRef, ParsedTx};

/// Result of checking the commit/spell parent-child relationship
#[derive(Debug, Clone)]
pub struct TopologyVerdict {
    /// True when at least one spell input spends a commit output
    pub valid: bool,
    /// Number of spell inputs that reference commit outputs
    pub matching_inputs: usize,
    /// Commit transaction id
    pub commit_txid: String,
    /// Spell transaction id
    pub spell_txid: String,
    /// Every output reference the commit transaction produces
    pub commit_outputs: Vec<InputRef>,
    /// Every input reference the spell transaction spends
    pub spell_inputs: Vec<InputRef>,
}

/// Verify that `spell_hex` spends an output of `commit_hex`.
pub fn verify(commit_hex: &str, spell_hex: &str) -> Result<TopologyVerdict, CodecError> {
    let commit = codec::parse_tx(commit_hex)?;
    let spell = codec::parse_tx(spell_hex)?;
    Ok(verify_parsed(&commit, &spell))
}

/// Verdict over already-parsed transactions.
pub fn verify_parsed(commit: &ParsedTx, spell: &ParsedTx) -> TopologyVerdict {
    let commit_outputs: Vec<InputRef> = (0..commit.output_count)
        .map(|vout| InputRef {
            txid: commit.txid.clone(),
            vout: vout as u32,
        })
        .collect();

    let matching_inputs = spell
        .inputs
        .iter()
        .filter(|input| commit_outputs.contains(input))
        .count();

    TopologyVerdict {
        valid: matching_inputs > 0,
        matching_inputs,
        commit_txid: commit.txid.clone(),
        spell_txid: spell.txid.clone(),
        commit_outputs,
        spell_inputs: spell.inputs.clone(),
    }
}
