//! BEEF envelope decoding and encoding (BRC-62).
//!
//! An envelope bundles a subject transaction with every unmined ancestor it
//! depends on and the BUMPs anchoring the mined boundary. Wire layout:
//!
//! - **Version**: u16 little-endian (currently 1).
//! - **Marker**: the bytes `0xBE 0xEF`.
//! - **nBumps**: VarInt, then that many serialized [`Bump`]s. At least one.
//! - **nTransactions**: VarInt, then that many raw transactions in
//!   parent-before-child order, each followed by a one-byte flag: `0x01` plus
//!   a VarInt BUMP index when the transaction is mined, `0x00` when not.
//!   At least two; the last is the subject.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::bump::Bump;
use crate::errors::{Result, SpvError};
use crate::tx::Transaction;
use crate::utils::{read_varint, write_varint};

/// Envelope version written by [`Beef::serialize`] for newly built bundles.
pub const BEEF_VERSION: u16 = 1;

const BEEF_MARKER: [u8; 2] = [0xBE, 0xEF];

/// One transaction slot in an envelope.
#[derive(Debug, Clone)]
pub struct TxEntry {
    pub tx: Transaction,
    /// Index into [`Beef::bumps`] when the transaction is mined.
    pub bump_index: Option<usize>,
}

/// BEEF bundle: transactions with ancestry and BUMP proofs.
#[derive(Debug, Clone)]
pub struct Beef {
    /// Wire version, retained for re-encoding.
    pub version: u16,
    /// BUMP proofs anchoring the mined transactions.
    pub bumps: Vec<Bump>,
    /// Parent-before-child order; the last entry is the subject.
    pub txs: Vec<TxEntry>,
}

impl Beef {
    /// Deserializes from a hex string.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let bytes = hex::decode(hex)?;
        Self::deserialize(&bytes)
    }

    /// Deserializes from bytes. Trailing bytes after the final transaction
    /// entry are ignored.
    ///
    /// # Errors
    /// - `SpvError::ShortEnvelope`: fewer than four header bytes.
    /// - `SpvError::BadMarker`: the marker bytes are not `0xBE 0xEF`.
    /// - `SpvError::NoBumps` / `SpvError::TooFewTransactions`: counts below
    ///   the minimum of one BUMP and two transactions.
    /// - `SpvError::BadHasBumpFlag`: per-transaction flag byte not 0/1.
    /// - `SpvError::BadBumpIndex`: a transaction names a BUMP that is not
    ///   in the envelope.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 4 {
            return Err(SpvError::ShortEnvelope(bytes.len()));
        }
        let mut cursor = Cursor::new(bytes);
        let version = cursor.read_u16::<LittleEndian>()?;
        let mut marker = [0u8; 2];
        cursor.read_exact(&mut marker)?;
        if marker != BEEF_MARKER {
            return Err(SpvError::BadMarker(marker));
        }

        let n_bumps = read_varint(&mut cursor)? as usize;
        if n_bumps == 0 {
            return Err(SpvError::NoBumps);
        }
        let mut bumps = Vec::new();
        for _ in 0..n_bumps {
            bumps.push(Bump::deserialize(&mut cursor)?);
        }

        let n_txs = read_varint(&mut cursor)? as usize;
        if n_txs < 2 {
            return Err(SpvError::TooFewTransactions(n_txs));
        }
        let mut txs = Vec::new();
        for _ in 0..n_txs {
            let start_pos = cursor.position() as usize;
            let tx = Transaction::from_raw(&bytes[start_pos..])?;
            cursor.set_position((start_pos + tx.raw.len()) as u64);
            let has_bump = cursor.read_u8()?;
            let bump_index = match has_bump {
                0x00 => None,
                0x01 => {
                    let index = read_varint(&mut cursor)? as usize;
                    if index >= bumps.len() {
                        return Err(SpvError::BadBumpIndex {
                            index,
                            bumps: bumps.len(),
                        });
                    }
                    Some(index)
                }
                other => return Err(SpvError::BadHasBumpFlag(other)),
            };
            txs.push(TxEntry { tx, bump_index });
        }

        Ok(Self {
            version,
            bumps,
            txs,
        })
    }

    /// Serializes to bytes, mirroring [`Beef::deserialize`].
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        buf.write_u16::<LittleEndian>(self.version)?;
        buf.extend_from_slice(&BEEF_MARKER);
        write_varint(&mut buf, self.bumps.len() as u64)?;
        for bump in &self.bumps {
            bump.serialize(&mut buf)?;
        }
        write_varint(&mut buf, self.txs.len() as u64)?;
        for entry in &self.txs {
            buf.extend_from_slice(&entry.tx.raw);
            match entry.bump_index {
                Some(index) => {
                    buf.write_u8(0x01)?;
                    write_varint(&mut buf, index as u64)?;
                }
                None => buf.write_u8(0x00)?,
            }
        }
        Ok(buf)
    }

    /// Serializes to a lowercase hex string.
    pub fn to_hex(&self) -> Result<String> {
        Ok(hex::encode(self.serialize()?))
    }

    /// The subject transaction: the envelope's last entry, the one the whole
    /// bundle exists to prove.
    pub fn subject(&self) -> Option<&TxEntry> {
        self.txs.last()
    }
}
