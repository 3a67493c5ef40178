//! Blocks and block-related structures (heights, headers, etc.)

mod hash;
mod header;
mod height;
mod serialize;

pub mod merkle;

#[cfg(test)]
mod tests;

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

pub use hash::Hash;
pub use header::Header;
pub use height::Height;
pub use serialize::MAX_BLOCK_BYTES;

use crate::{transaction::Transaction, transparent};

/// An oasis block, containing a header, a list of transactions, and the
/// producer signature appended to proof-of-stake blocks.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// The block header, containing block metadata.
    pub header: Header,
    /// The block transactions.
    pub transactions: Vec<Arc<Transaction>>,
    /// The staker's signature over the block hash.
    ///
    /// Empty for proof-of-work blocks.
    pub signature: Signature,
}

impl Block {
    /// Compute the hash of this block.
    ///
    /// The hash covers the header only, so attaching or detaching the stake
    /// signature does not change it.
    pub fn hash(&self) -> Hash {
        Hash::from(self)
    }

    /// Returns true if this is a proof-of-stake block: its second transaction
    /// is a coinstake.
    pub fn is_proof_of_stake(&self) -> bool {
        self.transactions.len() > 1 && self.transactions[1].is_coinstake()
    }

    /// Returns true if this is a proof-of-work block.
    pub fn is_proof_of_work(&self) -> bool {
        !self.is_proof_of_stake()
    }

    /// Returns the coinstake transaction of a proof-of-stake block.
    pub fn coinstake(&self) -> Option<&Transaction> {
        if self.is_proof_of_stake() {
            self.transactions.get(1).map(AsRef::as_ref)
        } else {
            None
        }
    }

    /// Returns the designated stake output of a proof-of-stake block: the
    /// second output of the coinstake transaction. Its script carries the
    /// staking key material checked by block signature verification.
    pub fn stake_output(&self) -> Option<&transparent::Output> {
        self.coinstake()?.outputs.get(1)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("hash", &self.hash())
            .finish()
    }
}

impl<'a> From<&'a Block> for Hash {
    fn from(block: &'a Block) -> Hash {
        (&block.header).into()
    }
}

/// A stake-block signature.
///
/// Proof-of-stake blocks are signed by the key holding the staked output;
/// the raw bytes are either a recoverable compact signature (legacy era) or
/// a plain compact signature (after the new-message-signatures activation).
/// Immutable once attached.
#[derive(Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    /// Returns the signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns true if no signature is attached.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Signature")
            .field(&hex::encode(&self.0))
            .finish()
    }
}
