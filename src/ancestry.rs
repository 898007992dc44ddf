//! Ancestor resolution: ties the subject's lineage to the mined boundary.
//!
//! Every input of the subject must trace back, through unmined envelope
//! transactions, to ancestors whose inclusion a BUMP attests. The walk stops
//! at the first mined transaction on each branch; what lies behind the mined
//! boundary is the chain's problem, not the envelope's.

use std::collections::{HashMap, HashSet};

use crate::beef::{Beef, TxEntry};
use crate::errors::{Result, SpvError};

/// Confirms the subject's ancestor graph is complete and anchored.
///
/// Walks from the subject's inputs: an unmined parent is recursed into, a
/// mined parent ends its branch and must then appear at the leaf level of the
/// BUMP its entry names. A parent listed without a BUMP index whose txid a
/// BUMP nevertheless proves counts as mined; the proof outranks the entry's
/// own claim.
///
/// # Errors
/// - `SpvError::MissingParent`: an input references a txid with no envelope
///   entry.
/// - `SpvError::AncestorNotInBump`: a mined ancestor's declared BUMP has no
///   leaf carrying its txid.
pub fn verify_ancestry(beef: &Beef) -> Result<()> {
    let subject = beef
        .subject()
        .ok_or(SpvError::TooFewTransactions(beef.txs.len()))?;

    let tx_map: HashMap<[u8; 32], &TxEntry> = beef
        .txs
        .iter()
        .map(|entry| (entry.tx.txid(), entry))
        .collect();

    let proven: HashSet<[u8; 32]> = beef
        .bumps
        .iter()
        .flat_map(|bump| bump.levels.first().into_iter().flatten())
        .filter_map(|leaf| leaf.kind.hash())
        .collect();

    let mut mined = Vec::new();
    let mut seen = HashSet::new();
    let mut to_check: Vec<[u8; 32]> = subject
        .tx
        .inputs
        .iter()
        .map(|input| input.prev_txid)
        .collect();

    while let Some(txid) = to_check.pop() {
        if !seen.insert(txid) {
            continue; // Already walked via another branch
        }
        let entry = tx_map.get(&txid).ok_or_else(|| SpvError::MissingParent {
            txid: hex::encode(txid),
        })?;
        match entry.bump_index {
            Some(index) => mined.push((txid, index)),
            // Anchored by a BUMP despite the entry; the branch ends here.
            None if proven.contains(&txid) => {}
            None => {
                for input in &entry.tx.inputs {
                    to_check.push(input.prev_txid);
                }
            }
        }
    }

    for (txid, index) in mined {
        let bump = beef.bumps.get(index).ok_or(SpvError::BadBumpIndex {
            index,
            bumps: beef.bumps.len(),
        })?;
        if !bump.contains_txid(&txid) {
            return Err(SpvError::AncestorNotInBump {
                txid: hex::encode(txid),
                bump: index,
            });
        }
    }
    Ok(())
}
