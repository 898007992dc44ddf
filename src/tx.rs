//! BSV transaction structures and parsing.
//! Compatible with the `sv` crate for script evaluation.

use crate::errors::{Result, SpvError};
use crate::utils::double_sha256;
use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use sv::messages::Tx as SvTx;
use sv::script::{op_codes::OP_CODESEPARATOR, Script as SvScript, TransactionChecker, NO_FLAGS};
use sv::transaction::sighash::SigHashCache;
use sv::util::Serializable;

/// Input for a transaction.
#[derive(Clone, Debug)]
pub struct Input {
    /// Parent TXID, display order.
    pub prev_txid: [u8; 32],
    /// Output index on the parent.
    pub vout: u32,
    /// ScriptSig (unlock script).
    pub script_sig: Vec<u8>,
    /// Sequence number.
    pub sequence: u32,
}

/// Output for a transaction.
#[derive(Clone, Debug)]
pub struct Output {
    /// Value in satoshis.
    pub value: u64,
    /// ScriptPubkey (lock script).
    pub script_pubkey: Vec<u8>,
}

/// BSV transaction wrapper: parses raw bytes, computes the txid, verifies
/// input scripts.
///
/// Hashes cross this type's boundary in display order: `prev_txid` is
/// reversed out of the wire on parse and [Transaction::txid] reverses the
/// double-SHA256 digest, so both compare directly against BUMP leaf hashes.
#[derive(Clone, Debug)]
pub struct Transaction {
    /// Version number.
    pub version: u32,
    /// Inputs.
    pub inputs: Vec<Input>,
    /// Outputs.
    pub outputs: Vec<Output>,
    /// Lock time.
    pub lock_time: u32,
    /// Raw serialized bytes, exactly as consumed from the wire.
    pub raw: Vec<u8>,
}

/// Reads `len` bytes, checking the claimed length against what is actually
/// left so a hostile length cannot drive a huge allocation.
fn read_script(cursor: &mut Cursor<&[u8]>, len: usize) -> Result<Vec<u8>> {
    let remaining = cursor.get_ref().len().saturating_sub(cursor.position() as usize);
    if len > remaining {
        return Err(SpvError::Truncated(std::io::ErrorKind::UnexpectedEof.into()));
    }
    let mut buf = vec![0u8; len];
    cursor.read_exact(&mut buf)?;
    Ok(buf)
}

impl Transaction {
    /// Parses a raw transaction from the front of `raw` (BSV format).
    /// Trailing bytes beyond the transaction are ignored; `self.raw` keeps
    /// only the consumed span.
    /// # Errors
    /// - IO or VarInt errors during deserialization.
    pub fn from_raw(raw: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(raw);
        let version = cursor.read_u32::<LittleEndian>()?;
        let num_inputs = crate::utils::read_varint(&mut cursor)? as usize;
        let mut inputs = Vec::new();
        for _ in 0..num_inputs {
            let mut prev_txid = [0u8; 32];
            cursor.read_exact(&mut prev_txid)?;
            prev_txid.reverse(); // to display order
            let vout = cursor.read_u32::<LittleEndian>()?;
            let script_len = crate::utils::read_varint(&mut cursor)? as usize;
            let script_sig = read_script(&mut cursor, script_len)?;
            let sequence = cursor.read_u32::<LittleEndian>()?;
            inputs.push(Input {
                prev_txid,
                vout,
                script_sig,
                sequence,
            });
        }
        let num_outputs = crate::utils::read_varint(&mut cursor)? as usize;
        let mut outputs = Vec::new();
        for _ in 0..num_outputs {
            let value = cursor.read_u64::<LittleEndian>()?;
            let script_len = crate::utils::read_varint(&mut cursor)? as usize;
            let script_pubkey = read_script(&mut cursor, script_len)?;
            outputs.push(Output {
                value,
                script_pubkey,
            });
        }
        let lock_time = cursor.read_u32::<LittleEndian>()?;
        let consumed = cursor.position() as usize;
        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
            raw: raw[0..consumed].to_vec(),
        })
    }

    /// Computes the TXID: double SHA256 of the raw bytes, display order.
    pub fn txid(&self) -> [u8; 32] {
        let mut hash = double_sha256(&self.raw);
        hash.reverse();
        hash
    }

    /// TXID as a display-order hex string.
    pub fn txid_hex(&self) -> String {
        hex::encode(self.txid())
    }

    /// Validates all input scripts against the provided previous outputs.
    /// Uses the `sv` interpreter with post-fork rules: signatures must
    /// carry SIGHASH_FORKID.
    /// # Errors
    /// - [SpvError::ScriptFailed] if any script fails.
    /// - [SpvError::MissingPreviousOutput] if a spent output is absent.
    pub fn verify_scripts(
        &self,
        prev_outputs: &HashMap<([u8; 32], u32), &Output>,
    ) -> Result<()> {
        let sv_tx = SvTx::read(&mut Cursor::new(&self.raw)).map_err(|e| SpvError::ScriptFailed {
            txid: self.txid_hex(),
            input: 0,
            reason: e.to_string(),
        })?;
        for (idx, input) in self.inputs.iter().enumerate() {
            let key = (input.prev_txid, input.vout);
            let prev_out = prev_outputs
                .get(&key)
                .ok_or_else(|| SpvError::MissingPreviousOutput {
                    txid: hex::encode(input.prev_txid),
                    vout: input.vout,
                })?;
            let mut combined_script = SvScript::new();
            combined_script.append_slice(&input.script_sig);
            combined_script.append(OP_CODESEPARATOR);
            combined_script.append_slice(&prev_out.script_pubkey);
            let mut sig_hash_cache = SigHashCache::new();
            let mut checker = TransactionChecker {
                tx: &sv_tx,
                sig_hash_cache: &mut sig_hash_cache,
                input: idx,
                satoshis: prev_out.value as i64,
                require_sighash_forkid: true,
            };
            combined_script
                .eval(&mut checker, NO_FLAGS)
                .map_err(|e| SpvError::ScriptFailed {
                    txid: self.txid_hex(),
                    input: idx,
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }
}
