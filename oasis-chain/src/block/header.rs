use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{merkle, Hash};

/// A block header, containing metadata about a block.
///
/// How are blocks chained together? They are chained together via the
/// backwards reference (previous header hash) present in the block header.
/// Each block points backwards to its parent, all the way back to the
/// genesis block (the first block in the blockchain).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// The block's version field.
    ///
    /// Block versions gate header interpretation (v4 introduced zerocoin,
    /// v7 the second time protocol), but the version checks themselves are
    /// height-based, not header-based.
    pub version: i32,

    /// The hash of the previous block, used to create a chain of blocks back
    /// to the genesis block.
    ///
    /// This ensures no previous block can be changed without also changing
    /// this block's header.
    pub previous_block_hash: Hash,

    /// The root of the Bitcoin-inherited transaction Merkle tree, binding the
    /// block header to the transactions in the block.
    pub merkle_root: merkle::Root,

    /// The block timestamp is a Unix epoch time (UTC) when the producer
    /// started hashing the header (according to the producer).
    pub time: u32,

    /// An encoded version of the target threshold this block's header hash
    /// must be less than or equal to, in the same nBits format used by
    /// Bitcoin.
    pub difficulty_bits: u32,

    /// An arbitrary field that miners can change to modify the header hash in
    /// order to produce a hash less than or equal to the target threshold.
    ///
    /// Unused (zero) in proof-of-stake blocks.
    pub nonce: u32,
}

impl Header {
    /// Returns the block time as a UTC timestamp.
    pub fn time_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.time.into(), 0)
            .expect("u32 timestamps are in the valid chrono range")
    }
}
