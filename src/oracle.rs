//! Pluggable Merkle root oracle for SPV verification.

use crate::errors::OracleError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One root/height pair submitted to the oracle.
///
/// Serializes with the field names of the confirmation wire contract, so a
/// batch can be posted as a JSON array to a header service as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleRootConfirmation {
    /// Computed Merkle root, display-order hex.
    pub merkle_root: String,
    /// Height of the block the root belongs to.
    pub block_height: u64,
}

/// Trait for confirming Merkle roots against the canonical chain.
/// Implement for HTTP header services, local nodes, or test tables.
///
/// The whole batch must match: implementations fail on any item that does
/// not belong to the canonical chain, on any unknown height, and when the
/// backing source cannot be reached. Any failure is fatal to the
/// verification that submitted the batch.
pub trait MerkleRootOracle {
    /// Checks every `(merkleRoot, blockHeight)` item against the chain.
    fn verify_merkle_roots(&self, items: &[MerkleRootConfirmation]) -> Result<(), OracleError>;
}

/// Oracle that accepts any input. Test/bench stub.
#[derive(Debug, Clone, Default)]
pub struct AcceptAllOracle;

impl MerkleRootOracle for AcceptAllOracle {
    fn verify_merkle_roots(&self, _items: &[MerkleRootConfirmation]) -> Result<(), OracleError> {
        Ok(())
    }
}

/// In-memory oracle backed by a known-answer table keyed by block height.
#[derive(Debug, Clone, Default)]
pub struct TableOracle {
    roots: HashMap<u64, String>,
}

impl TableOracle {
    /// Builds a table from `(height, display-order root hex)` pairs.
    pub fn new(entries: impl IntoIterator<Item = (u64, String)>) -> Self {
        Self {
            roots: entries.into_iter().collect(),
        }
    }

    /// Registers one height/root pair.
    pub fn insert(&mut self, height: u64, root: impl Into<String>) {
        self.roots.insert(height, root.into());
    }
}

impl MerkleRootOracle for TableOracle {
    fn verify_merkle_roots(&self, items: &[MerkleRootConfirmation]) -> Result<(), OracleError> {
        for item in items {
            match self.roots.get(&item.block_height) {
                None => return Err(OracleError::UnknownHeight(item.block_height)),
                Some(root) if !root.eq_ignore_ascii_case(&item.merkle_root) => {
                    return Err(OracleError::RootMismatch {
                        block_height: item.block_height,
                        merkle_root: item.merkle_root.clone(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}
