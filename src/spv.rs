//! SPV orchestration: decode, validate, resolve ancestry, climb the BUMPs,
//! consult the oracle.
//!
//! Steps run in a fixed order and stop at the first error, so a structurally
//! broken envelope never reaches the oracle. Everything before the oracle
//! call is CPU-bound and synchronous; the cancellation token is observed
//! between steps, which is enough to keep a dead verification from holding
//! up its caller on the one call that can actually block.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::ancestry::verify_ancestry;
use crate::beef::Beef;
use crate::errors::{OracleError, Result, SpvError};
use crate::oracle::{MerkleRootConfirmation, MerkleRootOracle};
use crate::validate::validate_transactions;

/// Computes the root of every BUMP, one confirmation per BUMP in envelope
/// order. Duplicates are not collapsed; the oracle sees what the envelope
/// carries.
pub fn calculate_merkle_roots(beef: &Beef) -> Result<Vec<MerkleRootConfirmation>> {
    beef.bumps
        .iter()
        .map(|bump| {
            Ok(MerkleRootConfirmation {
                merkle_root: hex::encode(bump.merkle_root()?),
                block_height: bump.block_height,
            })
        })
        .collect()
}

/// Verifies a hex-encoded envelope end to end.
pub fn execute_spv(envelope_hex: &str, oracle: &impl MerkleRootOracle) -> Result<()> {
    execute_spv_with_cancel(envelope_hex, oracle, &CancellationToken::new())
}

/// [`execute_spv`] with a caller-owned cancellation token. Once the token is
/// cancelled the pipeline returns [`OracleError::Cancelled`] at the next step
/// boundary and the oracle is never invoked.
pub fn execute_spv_with_cancel(
    envelope_hex: &str,
    oracle: &impl MerkleRootOracle,
    cancel: &CancellationToken,
) -> Result<()> {
    let beef = Beef::from_hex(envelope_hex)?;
    verify_envelope(&beef, oracle, cancel)
}

/// Full verification of an already decoded envelope.
pub fn verify_envelope(
    beef: &Beef,
    oracle: &impl MerkleRootOracle,
    cancel: &CancellationToken,
) -> Result<()> {
    debug!(
        txs = beef.txs.len(),
        bumps = beef.bumps.len(),
        "verifying envelope"
    );
    check_cancelled(cancel)?;
    validate_transactions(beef)?;
    check_cancelled(cancel)?;
    verify_ancestry(beef)?;
    check_cancelled(cancel)?;
    let confirmations = calculate_merkle_roots(beef)?;
    check_cancelled(cancel)?;
    debug!(
        confirmations = confirmations.len(),
        "consulting merkle root oracle"
    );
    oracle.verify_merkle_roots(&confirmations)?;
    Ok(())
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(SpvError::Oracle(OracleError::Cancelled));
    }
    Ok(())
}

impl Beef {
    /// [`verify_envelope`] on an already decoded envelope, without a
    /// cancellation token.
    pub fn verify(&self, oracle: &impl MerkleRootOracle) -> Result<()> {
        verify_envelope(self, oracle, &CancellationToken::new())
    }
}
