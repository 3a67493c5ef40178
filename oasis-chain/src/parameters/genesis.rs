//! Genesis blocks for each oasis network.

use std::sync::Arc;

use crate::{
    block::{self, merkle, Block, Header, Signature},
    transaction::Transaction,
    transparent::{append_data_push, Input, OutPoint, Output, Script},
};

use super::NetworkParameters;

/// The previous block hash for the genesis block.
///
/// All known networks use the Bitcoin `null` value for the parent of the
/// genesis block. (In Bitcoin, `null` is `[0; 32]`.)
pub const GENESIS_PREVIOUS_BLOCK_HASH: block::Hash = block::Hash([0; 32]);

/// The newspaper headline embedded in every network's genesis coinbase.
const GENESIS_COINBASE_TEXT: &str = "UK NEWS 26-05-2018 - UK Economy could start to pick up, \
     says Bank of England governor ---Remapper,Pesh---Made in England";

/// The key paid by the genesis coinbase output, shared by every network.
const GENESIS_OUTPUT_KEY_HEX: &str = "142292b1f401860eea99e1a8a103effbd7e1c013a59a1a3a0c91c9d1\
     997a0bc6f338567278c11344802838c107055bf7c1641eaed61e879245c255a4f5be5746fc";

/// Build the genesis block for a network's parameter set.
///
/// Note that the output of the genesis coinbase cannot be spent: it did not
/// originally exist in the database.
pub fn genesis_block(parameters: &NetworkParameters) -> Block {
    // The coinbase input encodes the original difficulty target, a script
    // number 4, and the headline text, exactly like Bitcoin's genesis.
    let mut coinbase_script = vec![0x04, 0xff, 0xff, 0x00, 0x1d, 0x01, 0x04];
    append_data_push(&mut coinbase_script, GENESIS_COINBASE_TEXT.as_bytes());

    let output_key = hex::decode(GENESIS_OUTPUT_KEY_HEX).expect("hard-coded key hex parses");

    let coinbase = Transaction {
        version: 1,
        inputs: vec![Input {
            previous_output: OutPoint::null(),
            unlock_script: Script::new(&coinbase_script),
            sequence: u32::MAX,
        }],
        outputs: vec![Output {
            value: parameters.genesis.reward,
            lock_script: Script::new_pay_to_public_key(&output_key),
        }],
        lock_time: 0,
    };

    let transactions = vec![Arc::new(coinbase)];
    let merkle_root = merkle::root(&transactions);

    Block {
        header: Header {
            version: parameters.genesis.version,
            previous_block_hash: GENESIS_PREVIOUS_BLOCK_HASH,
            merkle_root,
            time: parameters.genesis.time,
            difficulty_bits: parameters.genesis.difficulty_bits,
            nonce: parameters.genesis.nonce,
        },
        transactions,
        signature: Signature::default(),
    }
}
