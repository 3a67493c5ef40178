//! The Bitcoin-inherited transaction Merkle tree.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{serialization::sha256d, transaction::Transaction};

/// The root of the transaction Merkle tree.
///
/// Note that because of a flaw in Bitcoin's design, the Merkle root does not
/// always precisely bind the contents of the block (CVE-2012-2459): trees
/// with an odd number of nodes duplicate their last entry.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Root(pub [u8; 32]);

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("merkle::Root")
            .field(&hex::encode(self.0))
            .finish()
    }
}

/// Compute the Merkle root of a list of transactions.
///
/// An empty list yields the all-zero root; a single transaction's root is
/// its own hash.
pub fn root(transactions: &[Arc<Transaction>]) -> Root {
    let mut layer: Vec<[u8; 32]> = transactions.iter().map(|tx| tx.hash().0).collect();

    if layer.is_empty() {
        return Root([0; 32]);
    }

    while layer.len() > 1 {
        if layer.len() % 2 == 1 {
            let last = *layer.last().expect("non-empty layer has a last entry");
            layer.push(last);
        }
        layer = layer
            .chunks(2)
            .map(|pair| {
                let mut preimage = [0u8; 64];
                preimage[..32].copy_from_slice(&pair[0]);
                preimage[32..].copy_from_slice(&pair[1]);
                sha256d(&preimage)
            })
            .collect();
    }

    Root(layer[0])
}
