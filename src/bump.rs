//! BSV Universal Merkle Paths (BUMPs) for SPV proofs (BRC-74).
//!
//! A BUMP carries compact, possibly multi-path Merkle proofs for transaction
//! inclusion in a single block. Levels are encoded bottom-up (level 0 = leaves)
//! and each level holds only the nodes the climb needs: unique siblings carry a
//! full hash, duplicate markers mirror the working hash, and leaves of interest
//! carry the transaction hash itself.
//!
//! ## Structure (Binary Format)
//!
//! - **Block Height**: VarInt (u64, 1-9 bytes): Height of the block.
//! - **Tree Height**: u8 (1 byte): Log2 of leaves (max 64).
//! - **Levels** (bottom-up, tree_height levels):
//!   - **nLeaves**: VarInt (u64, 1-9 bytes): Encoded leaves at this level.
//!   - **Leaves** (for each):
//!     - **Offset**: VarInt (u64, 1-9 bytes): Position in level.
//!     - **Flags**: u8 (1 byte):
//!       - `0`: Unique sibling/branch hash follows (32 bytes).
//!       - `1`: Duplicate, mirror the working hash (no bytes).
//!       - `2`: Leaf TX hash, 32 bytes.
//!     - **Hash**: [u8; 32] (0 or 32 bytes): If flags 0 or 2.
//!
//! Hashes travel the wire little-endian and are reversed into display order on
//! decode; every hash held or returned by this module is display order.

use std::io::{Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::errors::{Result, SpvError};
use crate::utils::{merkle_parent, read_varint, write_varint};

/// Leaf payload, mirroring the wire flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    /// Sibling or interior hash supplied for the climb (flag 0).
    Data([u8; 32]),
    /// The sibling duplicates the working hash; no hash on the wire (flag 1).
    Duplicate,
    /// Hash of a transaction whose inclusion this path proves (flag 2).
    Txid([u8; 32]),
}

impl LeafKind {
    /// The stored hash, when this kind carries one.
    pub fn hash(&self) -> Option<[u8; 32]> {
        match self {
            LeafKind::Data(hash) | LeafKind::Txid(hash) => Some(*hash),
            LeafKind::Duplicate => None,
        }
    }

    /// Wire flag byte for this kind.
    pub fn flag(&self) -> u8 {
        match self {
            LeafKind::Data(_) => 0,
            LeafKind::Duplicate => 1,
            LeafKind::Txid(_) => 2,
        }
    }
}

/// One node in a BUMP level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaf {
    /// Position within the level, counted from the left.
    pub offset: u64,
    pub kind: LeafKind,
}

/// Merkle path bundle for one block (BRC-74).
///
/// # Example
///
/// ```
/// use brisket::bump::{Bump, Leaf, LeafKind};
/// use brisket::utils::merkle_parent;
///
/// let txid = [1u8; 32];
/// let sibling = [2u8; 32];
/// let bump = Bump {
///     block_height: 818_000,
///     tree_height: 1,
///     levels: vec![vec![
///         Leaf { offset: 0, kind: LeafKind::Txid(txid) },
///         Leaf { offset: 1, kind: LeafKind::Data(sibling) },
///     ]],
/// };
/// assert_eq!(bump.merkle_root().unwrap(), merkle_parent(&txid, &sibling));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bump {
    /// Block height containing the TXs.
    pub block_height: u64,
    /// Merkle tree height (log2 of leaves; max 64).
    pub tree_height: u8,
    /// Levels of leaves (bottom-up; len() == tree_height).
    pub levels: Vec<Vec<Leaf>>,
}

/// Outcome of resolving a node during synthesis.
enum NodeValue {
    Hash([u8; 32]),
    Duplicate,
}

impl Bump {
    /// Deserializes one BUMP, leaving the reader positioned after its final
    /// leaf. Hashes are reversed into display order.
    ///
    /// # Errors
    /// - `SpvError::TreeTooTall`: tree height above 64.
    /// - `SpvError::BadLeafFlag`: flag byte not 0/1/2.
    /// - IO failures (e.g. short reads for hashes) and invalid VarInts.
    pub fn deserialize(reader: &mut impl Read) -> Result<Self> {
        let block_height = read_varint(reader)?;
        let tree_height = reader.read_u8()?;
        if tree_height > 64 {
            return Err(SpvError::TreeTooTall(tree_height));
        }
        let mut levels = Vec::new();
        for _ in 0..tree_height {
            let n_leaves = read_varint(reader)?;
            let mut leaves = Vec::new();
            for _ in 0..n_leaves {
                let offset = read_varint(reader)?;
                let flag = reader.read_u8()?;
                let kind = match flag {
                    1 => LeafKind::Duplicate,
                    0 | 2 => {
                        let mut hash = [0u8; 32];
                        reader.read_exact(&mut hash)?;
                        hash.reverse();
                        if flag == 0 {
                            LeafKind::Data(hash)
                        } else {
                            LeafKind::Txid(hash)
                        }
                    }
                    other => return Err(SpvError::BadLeafFlag(other)),
                };
                leaves.push(Leaf { offset, kind });
            }
            levels.push(leaves);
        }
        Ok(Self {
            block_height,
            tree_height,
            levels,
        })
    }

    /// Serializes to bytes, reversing hashes back to wire order.
    ///
    /// Mirrors deserialize: height, tree height, levels with
    /// offsets/flags/hashes (hash omitted for duplicates).
    pub fn serialize(&self, writer: &mut impl Write) -> Result<()> {
        write_varint(writer, self.block_height)?;
        writer.write_u8(self.tree_height)?;
        for level in &self.levels {
            write_varint(writer, level.len() as u64)?;
            for leaf in level {
                write_varint(writer, leaf.offset)?;
                writer.write_u8(leaf.kind.flag())?;
                if let Some(hash) = leaf.kind.hash() {
                    let mut wire = hash;
                    wire.reverse();
                    writer.write_all(&wire)?;
                }
            }
        }
        Ok(())
    }

    /// True when `hash` appears at the leaf level under any hash-bearing flag.
    /// Anchors ancestor transactions to the block this path belongs to.
    pub fn contains_txid(&self, hash: &[u8; 32]) -> bool {
        self.levels
            .first()
            .map(|level| level.iter().any(|leaf| leaf.kind.hash() == Some(*hash)))
            .unwrap_or(false)
    }

    /// Climbs every client txid leaf to the root and cross-checks the results.
    ///
    /// All paths inside one BUMP must land on the same root; a disagreement
    /// means the proof was assembled from inconsistent data and the whole
    /// path is rejected.
    ///
    /// # Errors
    /// - `SpvError::NoTxidLeaf`: no flag-2 leaf at level 0.
    /// - `SpvError::DuplicateAtZero`: offset 0 of the leaf level marked
    ///   duplicate, which no valid block can produce.
    /// - `SpvError::MissingSibling`: the climb needed a node the path does
    ///   not record and cannot synthesize.
    /// - `SpvError::BumpInternalMismatch`: two txid climbs disagree.
    pub fn merkle_root(&self) -> Result<[u8; 32]> {
        let base = self.levels.first().ok_or(SpvError::NoTxidLeaf)?;
        if base
            .iter()
            .any(|leaf| leaf.offset == 0 && leaf.kind == LeafKind::Duplicate)
        {
            return Err(SpvError::DuplicateAtZero);
        }
        let mut root: Option<[u8; 32]> = None;
        for leaf in base {
            let hash = match leaf.kind {
                LeafKind::Txid(hash) => hash,
                _ => continue,
            };
            let candidate = self.climb(leaf.offset, hash)?;
            match root {
                None => root = Some(candidate),
                Some(prev) if prev != candidate => {
                    return Err(SpvError::BumpInternalMismatch {
                        left: hex::encode(prev),
                        right: hex::encode(candidate),
                    });
                }
                Some(_) => {}
            }
        }
        root.ok_or(SpvError::NoTxidLeaf)
    }

    /// Root computed for `hash` sitting at leaf `offset`, ignoring the txid
    /// flags. Lets a caller check an arbitrary leaf against a header.
    pub fn merkle_root_for(&self, offset: u64, hash: [u8; 32]) -> Result<[u8; 32]> {
        self.climb(offset, hash)
    }

    /// Walks one leaf up to the root, pairing with the recorded sibling at
    /// each level or synthesizing it from children when absent.
    fn climb(&self, mut offset: u64, mut working: [u8; 32]) -> Result<[u8; 32]> {
        for level in 0..self.tree_height as usize {
            let sibling_offset = offset ^ 1;
            let sibling = match self.find_leaf(level, sibling_offset) {
                Some(leaf) => match leaf.kind {
                    LeafKind::Duplicate => working, // Mirror working hash
                    LeafKind::Data(hash) | LeafKind::Txid(hash) => hash,
                },
                None if level == 0 => {
                    return Err(SpvError::MissingSibling {
                        level,
                        offset: sibling_offset,
                    });
                }
                None => self.synthesize(level, sibling_offset)?,
            };
            // The lesser offset is always the left child.
            let (left, right) = if offset & 1 == 0 {
                (working, sibling)
            } else {
                (sibling, working)
            };
            working = merkle_parent(&left, &right);
            offset /= 2;
        }
        Ok(working)
    }

    /// Derives the node at (`level`, `offset`) from its two children. Only
    /// called with `level >= 1`.
    fn synthesize(&self, level: usize, offset: u64) -> Result<[u8; 32]> {
        let left = self.value_at(level - 1, offset * 2)?;
        let right = self.value_at(level - 1, offset * 2 + 1)?;
        match (left, right) {
            (NodeValue::Hash(l), NodeValue::Hash(r)) => Ok(merkle_parent(&l, &r)),
            // A duplicate child pairs its sibling with itself, matching how
            // odd rows are padded when the block's tree is built.
            (NodeValue::Hash(l), NodeValue::Duplicate) => Ok(merkle_parent(&l, &l)),
            (NodeValue::Duplicate, NodeValue::Hash(r)) => Ok(merkle_parent(&r, &r)),
            (NodeValue::Duplicate, NodeValue::Duplicate) => Err(SpvError::MissingSibling {
                level: level - 1,
                offset: offset * 2,
            }),
        }
    }

    /// Resolves a node to a hash or duplicate marker, recursing downward when
    /// the level does not record it.
    fn value_at(&self, level: usize, offset: u64) -> Result<NodeValue> {
        if let Some(leaf) = self.find_leaf(level, offset) {
            return Ok(match leaf.kind {
                LeafKind::Duplicate => NodeValue::Duplicate,
                LeafKind::Data(hash) | LeafKind::Txid(hash) => NodeValue::Hash(hash),
            });
        }
        if level == 0 {
            return Err(SpvError::MissingSibling { level, offset });
        }
        Ok(NodeValue::Hash(self.synthesize(level, offset)?))
    }

    fn find_leaf(&self, level: usize, offset: u64) -> Option<&Leaf> {
        self.levels
            .get(level)?
            .iter()
            .find(|leaf| leaf.offset == offset)
    }

    /// Merges `other` into this BUMP, keeping the union of recorded leaves.
    ///
    /// Both paths must describe the same tree: equal block and tree heights
    /// and equal roots. Where both record a hash for one position the hashes
    /// must agree; a txid marking wins over a plain data marking, so the
    /// merged path keeps proving every transaction either side proved.
    ///
    /// # Errors
    /// - Height or root mismatch.
    /// - Overlapping offsets with conflicting payloads.
    pub fn merge(&mut self, other: &Bump) -> Result<()> {
        if self.block_height != other.block_height || self.tree_height != other.tree_height {
            return Err(SpvError::MergeMismatch("heights differ"));
        }
        if self.merkle_root()? != other.merkle_root()? {
            return Err(SpvError::MergeMismatch("roots differ"));
        }
        for (own_level, other_level) in self.levels.iter_mut().zip(other.levels.iter()) {
            for other_leaf in other_level {
                match own_level
                    .iter_mut()
                    .find(|leaf| leaf.offset == other_leaf.offset)
                {
                    Some(existing) => match (existing.kind.hash(), other_leaf.kind.hash()) {
                        (Some(a), Some(b)) if a == b => {
                            if matches!(other_leaf.kind, LeafKind::Txid(_)) {
                                existing.kind = other_leaf.kind;
                            }
                        }
                        (None, None) => {}
                        _ => return Err(SpvError::MergeMismatch("conflicting leaf")),
                    },
                    None => own_level.push(*other_leaf),
                }
            }
            own_level.sort_by_key(|leaf| leaf.offset); // Maintain order
        }
        Ok(())
    }
}
