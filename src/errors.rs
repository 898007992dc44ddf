//! Custom errors for BEEF parsing, structural validation, and SPV.

use std::io;
use thiserror::Error;

/// Core error type for envelope verification.
///
/// Every failure mode is a distinct variant; nothing is retried internally
/// and no variant is recoverable inside the core. Variants carry the txid,
/// input index, or BUMP index needed to diagnose the defect.
#[derive(Error, Debug)]
pub enum SpvError {
    /// Envelope hex could not be decoded.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    /// The byte stream ended mid-field.
    #[error("truncated envelope: {0}")]
    Truncated(#[from] io::Error),
    /// Envelope shorter than the 4-byte version/marker prefix.
    #[error("envelope too short: {0} bytes")]
    ShortEnvelope(usize),
    /// Marker bytes were not `0xBEEF`.
    #[error("bad envelope marker: {0:02x?}")]
    BadMarker([u8; 2]),
    /// Envelope declares zero BUMPs.
    #[error("envelope carries no BUMPs")]
    NoBumps,
    /// BUMP tree height above the 64-level limit.
    #[error("tree height {0} exceeds 64")]
    TreeTooTall(u8),
    /// Leaf flag byte outside 0/1/2.
    #[error("invalid leaf flag: {0}")]
    BadLeafFlag(u8),
    /// Per-transaction BUMP flag byte outside 0x00/0x01.
    #[error("invalid transaction BUMP flag: {0:#04x}")]
    BadHasBumpFlag(u8),
    /// Fewer than the two transactions (ancestor + subject) an envelope needs.
    #[error("envelope carries {0} transactions, need at least 2")]
    TooFewTransactions(usize),
    /// A transaction entry names a BUMP that does not exist.
    #[error("BUMP index {index} out of range ({bumps} BUMPs present)")]
    BadBumpIndex { index: usize, bumps: usize },
    /// Non-canonical compact VarInt encoding.
    #[error("invalid VarInt")]
    InvalidVarInt,

    /// Two txid leaves of one BUMP climb to different roots.
    #[error("txid leaves disagree on the Merkle root: {left} vs {right}")]
    BumpInternalMismatch { left: String, right: String },
    /// Duplicate leaf at offset 0 of the base level.
    #[error("duplicate leaf at offset 0 of the base level")]
    DuplicateAtZero,
    /// BUMP has no txid leaf (or no base level) to anchor a climb.
    #[error("BUMP has no txid leaf to anchor a climb")]
    NoTxidLeaf,
    /// A required sibling is absent and cannot be synthesized from children.
    #[error("missing sibling at level {level}, offset {offset}")]
    MissingSibling { level: usize, offset: u64 },
    /// Two BUMPs could not be merged.
    #[error("BUMP merge mismatch: {0}")]
    MergeMismatch(&'static str),

    /// An input's parent transaction is not in the envelope.
    #[error("no envelope entry for parent transaction {txid}")]
    MissingParent { txid: String },
    /// A mined ancestor is not referenced by any leaf of its declared BUMP.
    #[error("mined ancestor {txid} not present in BUMP {bump}")]
    AncestorNotInBump { txid: String, bump: usize },

    /// Transaction has no inputs.
    #[error("transaction {txid} has no inputs")]
    NoInputs { txid: String },
    /// Transaction has no outputs.
    #[error("transaction {txid} has no outputs")]
    NoOutputs { txid: String },
    /// Nonzero lock time with at least one non-final input sequence.
    #[error("transaction {txid} has a non-final lock time")]
    NonFinal { txid: String },
    /// Input satoshis do not strictly exceed output satoshis.
    #[error("transaction {txid} spends {inputs} satoshis into {outputs}; fee must be positive")]
    FeeNotPositive {
        txid: String,
        inputs: u128,
        outputs: u128,
    },
    /// The referenced output index does not exist on the parent.
    #[error("spent output {txid}:{vout} does not exist")]
    MissingPreviousOutput { txid: String, vout: u32 },
    /// Script execution failed for one input.
    #[error("script failed on input {input} of {txid}: {reason}")]
    ScriptFailed {
        txid: String,
        input: usize,
        reason: String,
    },

    /// The injected oracle rejected the roots or could not answer.
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Failures surfaced by the injected Merkle root oracle.
#[derive(Error, Debug)]
pub enum OracleError {
    /// A root does not match the canonical chain at its height.
    #[error("merkle root mismatch at height {block_height}: {merkle_root}")]
    RootMismatch {
        block_height: u64,
        merkle_root: String,
    },
    /// The oracle knows no block at this height.
    #[error("unknown block height {0}")]
    UnknownHeight(u64),
    /// The oracle could not be contacted.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    /// Verification was cancelled before the oracle answered.
    #[error("verification cancelled")]
    Cancelled,
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, SpvError>;
