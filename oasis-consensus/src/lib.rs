//! Consensus rule checks for oasis.
//!
//! The external block-validation pipeline calls into this crate with
//! already-fetched block data and the parameter set selected at startup:
//! checkpoint vetoes, zerocoin extraction and supply bookkeeping, and
//! stake-block signature authentication. Everything here is deterministic
//! and side-effect free apart from the supply ledger, which serializes its
//! own mutations.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod block_signature;
pub mod checkpoint;
pub mod error;
pub mod zerocoin;

pub use block_signature::{check_block_signature, sign_block, sign_block_with_key, SignatureEra};
pub use checkpoint::CheckpointVerifier;
pub use error::{BlockError, CheckpointError, SignatureError, SupplyError, ZerocoinError};
pub use zerocoin::{MalformedMintPolicy, SupplyLedger, ZerocoinSupply};
