//! Utility functions: hashing, Merkle parent combination, VarInt read/write.

use crate::errors::{Result, SpvError};
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use sha2::{Digest, Sha256};

/// Computes double SHA256, used for TXIDs and Merkle nodes.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let hash1 = hasher.finalize();
    let mut hasher = Sha256::new();
    hasher.update(&hash1);
    hasher.finalize().into()
}

/// Combines two Merkle nodes held in display order into their parent,
/// also in display order.
///
/// Display-order hashes are byte-reversed relative to the wire, so both
/// children are reversed before hashing and the digest is reversed again
/// on the way out. The left/right order is significant; callers order the
/// pair by offset before combining.
pub fn merkle_parent(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut concat = [0u8; 64];
    for (dst, src) in concat[..32].iter_mut().zip(left.iter().rev()) {
        *dst = *src;
    }
    for (dst, src) in concat[32..].iter_mut().zip(right.iter().rev()) {
        *dst = *src;
    }
    let mut parent = double_sha256(&concat);
    parent.reverse();
    parent
}

/// Reads a compact VarInt (1-9 bytes) from a reader.
/// Enforces minimal encoding (e.g. `fd 01 00` is rejected).
/// # Errors
/// - [SpvError::InvalidVarInt] if the encoding is non-canonical.
/// - [SpvError::Truncated] on short reads.
pub fn read_varint<R: Read>(reader: &mut R) -> Result<u64> {
    let mut b = [0u8; 1];
    reader.read_exact(&mut b)?;
    match b[0] {
        n @ 0..=0xfc => Ok(n as u64),
        0xfd => {
            let val = reader.read_u16::<LittleEndian>()? as u64;
            if val < 0xfd {
                return Err(SpvError::InvalidVarInt);
            }
            Ok(val)
        }
        0xfe => {
            let val = reader.read_u32::<LittleEndian>()? as u64;
            if val < 0x10000 {
                return Err(SpvError::InvalidVarInt);
            }
            Ok(val)
        }
        0xff => {
            let val = reader.read_u64::<LittleEndian>()?;
            if val < 0x100000000 {
                return Err(SpvError::InvalidVarInt);
            }
            Ok(val)
        }
    }
}

/// Writes a compact VarInt to a writer.
pub fn write_varint<W: Write>(writer: &mut W, n: u64) -> Result<()> {
    if n < 0xfd {
        writer.write_u8(n as u8)?;
    } else if n <= 0xffff {
        writer.write_u8(0xfd)?;
        writer.write_u16::<LittleEndian>(n as u16)?;
    } else if n <= 0xffffffff {
        writer.write_u8(0xfe)?;
        writer.write_u32::<LittleEndian>(n as u32)?;
    } else {
        writer.write_u8(0xff)?;
        writer.write_u64::<LittleEndian>(n)?;
    }
    Ok(())
}
