//! Per-transaction validation: structure, finality, fees, and scripts.
//!
//! Every envelope transaction gets the structural and finality checks. Fee
//! conservation and script execution run only for unmined transactions; for
//! mined ones the BUMP plus the oracle attest validity at mining time, so
//! re-running their scripts would prove nothing.

use std::collections::HashMap;

use crate::beef::Beef;
use crate::errors::{Result, SpvError};
use crate::tx::Output;

const SEQUENCE_FINAL: u32 = 0xFFFF_FFFF;

/// Checks every transaction in envelope order.
///
/// Spendable outputs accumulate as the walk advances, so an unmined
/// transaction can only spend outputs of entries before it. Sums run in
/// u128; a hostile envelope cannot overflow them with u64 output values.
///
/// # Errors
/// - `SpvError::NoInputs` / `SpvError::NoOutputs`: degenerate structure.
/// - `SpvError::NonFinal`: nonzero lock time with any non-final sequence.
///   Time-locked transactions are out of scope here.
/// - `SpvError::MissingPreviousOutput`: an unmined transaction spends an
///   output the envelope does not carry.
/// - `SpvError::FeeNotPositive`: input total not strictly above output total.
/// - `SpvError::ScriptFailed`: an unlocking script did not satisfy the spent
///   output's locking script.
pub fn validate_transactions(beef: &Beef) -> Result<()> {
    let mut spendable: HashMap<([u8; 32], u32), &Output> = HashMap::new();
    for entry in &beef.txs {
        let tx = &entry.tx;
        let txid = tx.txid();
        if tx.inputs.is_empty() {
            return Err(SpvError::NoInputs {
                txid: hex::encode(txid),
            });
        }
        if tx.outputs.is_empty() {
            return Err(SpvError::NoOutputs {
                txid: hex::encode(txid),
            });
        }
        if tx.lock_time != 0
            && tx
                .inputs
                .iter()
                .any(|input| input.sequence != SEQUENCE_FINAL)
        {
            return Err(SpvError::NonFinal {
                txid: hex::encode(txid),
            });
        }

        if entry.bump_index.is_none() {
            let mut input_sum: u128 = 0;
            for input in &tx.inputs {
                let prev = spendable
                    .get(&(input.prev_txid, input.vout))
                    .ok_or_else(|| SpvError::MissingPreviousOutput {
                        txid: hex::encode(input.prev_txid),
                        vout: input.vout,
                    })?;
                input_sum += prev.value as u128;
            }
            let output_sum: u128 = tx.outputs.iter().map(|out| out.value as u128).sum();
            if input_sum <= output_sum {
                return Err(SpvError::FeeNotPositive {
                    txid: hex::encode(txid),
                    inputs: input_sum,
                    outputs: output_sum,
                });
            }
            tx.verify_scripts(&spendable)?;
        }

        for (vout, out) in tx.outputs.iter().enumerate() {
            spendable.insert((txid, vout as u32), out);
        }
    }
    Ok(())
}
