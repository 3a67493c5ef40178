//! Checkpoint-based reorganization vetoes.
//!
//! Each checkpoint consists of a block height and block hash. A candidate
//! block at a checkpoint height is accepted only if its hash matches the
//! stored hash; a mismatch is a permanent rejection. Reorganizations that
//! would remove a block at or below a checkpoint height are vetoed
//! regardless of the contending chain's own validity.
//!
//! Below the lowest checkpoint, and between checkpoints, this module
//! imposes no constraint. Test networks carry a trivial checkpoint table so
//! local testing and fuzzing are unconstrained.

mod list;

#[cfg(test)]
mod tests;

pub use list::CheckpointList;

use chrono::{DateTime, Utc};

use oasis_chain::{
    block::{self, Height},
    parameters::Network,
};

use crate::error::CheckpointError;

/// Sync-progress metadata recorded alongside each network's checkpoint
/// list.
///
/// Used only for progress estimation, never for validation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CheckpointData {
    /// UNIX timestamp of the last checkpoint block.
    pub last_checkpoint_time: i64,
    /// Total number of transactions between genesis and the last
    /// checkpoint.
    pub total_transactions: u64,
    /// Estimated number of transactions per day after the last checkpoint.
    pub transactions_per_day: u64,
}

impl CheckpointData {
    /// Returns the hard-coded progress metadata for `network`.
    fn new(network: Network) -> CheckpointData {
        match network {
            Network::Mainnet => CheckpointData {
                last_checkpoint_time: 1_546_306_998,
                total_transactions: 632_503,
                transactions_per_day: 2_000,
            },
            Network::Testnet => CheckpointData {
                last_checkpoint_time: 1_740_710,
                total_transactions: 0,
                transactions_per_day: 250,
            },
            Network::Regtest | Network::UnitTest => CheckpointData {
                last_checkpoint_time: 1_454_124_731,
                total_transactions: 0,
                transactions_per_day: 100,
            },
        }
    }
}

/// The hard-coded checkpoint authority for one network.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CheckpointVerifier {
    list: CheckpointList,
    data: CheckpointData,
}

impl CheckpointVerifier {
    /// Build the checkpoint verifier for `network` from its compiled-in
    /// checkpoint table.
    pub fn new(network: Network) -> CheckpointVerifier {
        CheckpointVerifier {
            list: CheckpointList::new(network),
            data: CheckpointData::new(network),
        }
    }

    /// Check a candidate block hash against the checkpoint at its height.
    ///
    /// Returns `Ok(())` if there is no checkpoint at `height`, or if the
    /// hash matches the stored checkpoint. A mismatch is a
    /// [`CheckpointError::Violation`]: a permanent rejection that is never
    /// retried, identical on every conforming node.
    pub fn check(&self, height: Height, hash: block::Hash) -> Result<(), CheckpointError> {
        match self.list.hash(height) {
            Some(expected) if expected == hash => Ok(()),
            Some(expected) => Err(CheckpointError::Violation {
                height,
                expected,
                found: hash,
            }),
            None => Ok(()),
        }
    }

    /// Check whether a reorganization whose fork point is at `fork_height`
    /// is allowed.
    ///
    /// A reorganization removes every block above its fork point, so any
    /// fork point below the highest checkpoint would remove a checkpointed
    /// block and is vetoed.
    pub fn check_reorganization(&self, fork_height: Height) -> Result<(), CheckpointError> {
        let checkpoint = self.list.max_height();
        if fork_height < checkpoint {
            Err(CheckpointError::ReorgBelowCheckpoint {
                fork: fork_height,
                checkpoint,
            })
        } else {
            Ok(())
        }
    }

    /// Returns true if there is a checkpoint at `height`.
    pub fn is_checkpoint_height(&self, height: Height) -> bool {
        self.list.contains(height)
    }

    /// The height of the highest hard-coded checkpoint.
    pub fn max_checkpoint_height(&self) -> Height {
        self.list.max_height()
    }

    /// The sync-progress metadata for this network.
    pub fn data(&self) -> &CheckpointData {
        &self.data
    }

    /// Estimate the total number of transactions in the chain at `now`.
    ///
    /// Extrapolates from the transaction count at the last checkpoint using
    /// the recorded transactions-per-day rate. Progress estimation only;
    /// never used for validation.
    pub fn estimated_transactions(&self, now: DateTime<Utc>) -> u64 {
        let elapsed = now.timestamp() - self.data.last_checkpoint_time;
        if elapsed <= 0 {
            return self.data.total_transactions;
        }

        let days = elapsed as u64 / 86_400;
        self.data
            .total_transactions
            .saturating_add(days.saturating_mul(self.data.transactions_per_day))
    }
}
