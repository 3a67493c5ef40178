//! Errors that can occur when checking consensus rules.
//!
//! Each error variant corresponds to a consensus rule, so enumerating all
//! possible verification failures enumerates the consensus rules we
//! implement, and ensures that we don't reject blocks or transactions for a
//! non-enumerated reason.
//!
//! Every variant is a *permanent* rejection: the same block fails the same
//! way on every conforming node, and is never retried. Only
//! [`SupplyError::Inconsistent`] is fatal to the node itself rather than to
//! a block.

use thiserror::Error;

use oasis_chain::{
    block::{self, Height},
    serialization::SerializationError,
    zerocoin::{Denomination, SpendKind},
};

/// A block violates a consensus rule.
#[derive(Error, Debug)]
pub enum BlockError {
    /// A zerocoin operation in the block is invalid.
    #[error("block contains an invalid zerocoin operation")]
    Zerocoin(#[from] ZerocoinError),

    /// The block conflicts with a hard-coded checkpoint.
    #[error("block conflicts with a hard-coded checkpoint")]
    Checkpoint(#[from] CheckpointError),

    /// Supply bookkeeping failed while applying the block.
    #[error("zerocoin supply accounting failed")]
    Supply(#[from] SupplyError),
}

/// A conflict with a hard-coded checkpoint.
///
/// Checkpoint conflicts additionally forbid the conflicting chain from ever
/// becoming the active chain.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum CheckpointError {
    /// The block hash at a checkpoint height does not match the checkpoint.
    #[error("block at checkpoint height {height:?} has hash {found:?}, expected {expected:?}")]
    Violation {
        /// The checkpoint height.
        height: Height,
        /// The hard-coded checkpoint hash.
        expected: block::Hash,
        /// The candidate block's hash.
        found: block::Hash,
    },

    /// A reorganization would remove a block at or below a checkpoint.
    #[error(
        "reorganization at fork height {fork:?} would remove blocks at or below \
         checkpoint height {checkpoint:?}"
    )]
    ReorgBelowCheckpoint {
        /// The height of the last common block of the competing chains.
        fork: Height,
        /// The highest hard-coded checkpoint height.
        checkpoint: Height,
    },
}

/// An invalid or malformed zerocoin operation.
#[derive(Error, Debug)]
pub enum ZerocoinError {
    /// A mint commitment failed to parse under the strict policy.
    #[error("malformed zerocoin mint commitment")]
    MalformedMint(#[source] SerializationError),

    /// A spend proof failed structural validation.
    #[error("malformed zerocoin spend proof")]
    MalformedSpend(#[source] SerializationError),

    /// A public coin encoding failed to parse.
    #[error("invalid public coin encoding")]
    InvalidPublicCoinEncoding(#[source] SerializationError),

    /// A mint's commitment value is outside the accumulator group.
    #[error("zerocoin mint commitment value is out of the accumulator group")]
    MintValueOutOfRange,

    /// A spend's serial number is outside the valid range.
    #[error("zerocoin serial number out of range")]
    SerialOutOfRange,

    /// A spend's serial number uses the wrong format version for its height.
    #[error("zerocoin serial version {found} is not valid at height {height:?}")]
    SerialVersionMismatch {
        /// The serial format version carried by the spend.
        found: u8,
        /// The height being validated.
        height: Height,
    },

    /// The zerocoin sub-protocol is not enabled at this height.
    #[error("zerocoin is not active at height {0:?}")]
    NotActive(Height),

    /// Public spends are not enabled at this height.
    ///
    /// Asking for a public coin before the activation height is a caller
    /// contract violation, not a silent no-op.
    #[error("zerocoin public spends are not active at height {0:?}")]
    PublicSpendsNotActive(Height),

    /// A transaction carries more spends of one kind than the limit.
    #[error("transaction carries more than {limit} {kind:?} zerocoin spends")]
    TooManySpends {
        /// The kind of spend over its limit.
        kind: SpendKind,
        /// The per-transaction limit.
        limit: u32,
    },
}

/// A failure while producing a stake-block signature.
///
/// These are signing-side errors surfaced to the wallet/staking loop; they
/// are not consensus-fatal. Verification never returns errors, only
/// `false`.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum SignatureError {
    /// No key in the key store matches the stake output script.
    #[error("no key in the key store matches the stake output script")]
    KeyNotFound,

    /// The provided signing key does not match the stake output script.
    #[error("signing key does not match the stake output script")]
    KeyMismatch,

    /// The block has no coinstake transaction with a stake output.
    #[error("block has no stake output to sign for")]
    MissingStakeOutput,

    /// The stake output script is not a recognized key-bearing form.
    #[error("stake output script is not a recognized key-bearing form")]
    UnsupportedScript,
}

/// A zerocoin supply bookkeeping failure.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum SupplyError {
    /// A spend would take a denomination's outstanding count below zero.
    #[error("zerocoin supply for denomination {denomination} would become negative")]
    NegativeSupply {
        /// The denomination being over-spent.
        denomination: Denomination,
    },

    /// The incrementally-maintained supply diverges from a replay.
    ///
    /// This is fatal to node startup: continuing would validate against
    /// corrupt state. Operator intervention (a reindex) is required.
    #[error(
        "zerocoin supply diverges for denomination {denomination}: \
         incremental {incremental}, recomputed {recomputed}"
    )]
    Inconsistent {
        /// The diverging denomination.
        denomination: Denomination,
        /// The incrementally-maintained coin count.
        incremental: u64,
        /// The replayed coin count.
        recomputed: u64,
    },

    /// A block or its index entry is missing from the chain reader.
    #[error("block or index entry missing at height {0:?}")]
    MissingBlock(Height),
}
