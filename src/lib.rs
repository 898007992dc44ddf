//! BEEF transaction verification for BSV (BRC-62 / BRC-74).
//!
//! A Background Evaluation Extended Format envelope bundles a subject
//! transaction with its unmined ancestors and the BUMP Merkle paths that
//! anchor the mined boundary. [`execute_spv`] decodes one, validates every
//! transaction, resolves the ancestor graph, climbs each BUMP to its root,
//! and asks a caller-supplied [`MerkleRootOracle`] whether those roots belong
//! to the canonical chain. The core is stateless; the oracle is the only
//! injected capability and the only call that may block.

pub mod ancestry;
pub mod beef;
pub mod bump;
pub mod errors;
pub mod oracle;
pub mod spv;
pub mod tx;
pub mod utils;
pub mod validate;

#[cfg(test)]
mod test_utils;

pub use ancestry::verify_ancestry;
pub use beef::{Beef, TxEntry, BEEF_VERSION};
pub use bump::{Bump, Leaf, LeafKind};
pub use errors::{OracleError, Result, SpvError};
pub use oracle::{AcceptAllOracle, MerkleRootConfirmation, MerkleRootOracle, TableOracle};
pub use spv::{calculate_merkle_roots, execute_spv, execute_spv_with_cancel, verify_envelope};
pub use tx::{Input, Output, Transaction};
pub use validate::validate_transactions;

pub use tokio_util::sync::CancellationToken;
