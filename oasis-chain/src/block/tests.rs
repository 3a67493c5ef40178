//! Block structure and serialization tests.

use std::sync::Arc;

use crate::{
    amount::Amount,
    serialization::{OasisDeserialize, OasisSerialize},
    transaction::Transaction,
    transparent::{Input, OutPoint, Output, Script},
};

use super::*;

fn coinbase_transaction() -> Transaction {
    Transaction {
        version: 1,
        inputs: vec![Input {
            previous_output: OutPoint::null(),
            unlock_script: Script::new(&[0x01, 0x02]),
            sequence: u32::MAX,
        }],
        outputs: vec![Output {
            value: Amount::new_from_coins(50),
            lock_script: Script::new_pay_to_public_key(&[0x02; 33]),
        }],
        lock_time: 0,
    }
}

fn coinstake_transaction() -> Transaction {
    Transaction {
        version: 1,
        inputs: vec![Input {
            previous_output: OutPoint {
                hash: crate::transaction::Hash([0x11; 32]),
                index: 0,
            },
            unlock_script: Script::new(&[]),
            sequence: u32::MAX,
        }],
        outputs: vec![
            // The first coinstake output is empty by construction.
            Output {
                value: Amount::zero(),
                lock_script: Script::new(&[]),
            },
            Output {
                value: Amount::new_from_coins(100),
                lock_script: Script::new_pay_to_public_key(&[0x03; 33]),
            },
        ],
        lock_time: 0,
    }
}

fn stake_block() -> Block {
    let transactions = vec![
        Arc::new(coinbase_transaction()),
        Arc::new(coinstake_transaction()),
    ];
    Block {
        header: Header {
            version: 5,
            previous_block_hash: Hash([0x22; 32]),
            merkle_root: merkle::root(&transactions),
            time: 1_546_300_800,
            difficulty_bits: 0x1e0ffff0,
            nonce: 0,
        },
        transactions,
        signature: Signature(vec![0xab; 65]),
    }
}

#[test]
fn stake_block_predicates() {
    let _init_guard = oasis_test::init();

    let block = stake_block();
    assert!(block.is_proof_of_stake());
    assert!(!block.is_proof_of_work());
    assert!(block.coinstake().is_some());

    let stake_output = block.stake_output().expect("stake blocks have one");
    assert_eq!(stake_output.value, Amount::new_from_coins(100));

    let mut work_block = block.clone();
    work_block.transactions.truncate(1);
    work_block.signature = Signature::default();
    assert!(work_block.is_proof_of_work());
    assert!(work_block.stake_output().is_none());
}

#[test]
fn block_hash_ignores_signature() {
    let _init_guard = oasis_test::init();

    let block = stake_block();
    let mut resigned = block.clone();
    resigned.signature = Signature(vec![0xcd; 65]);

    assert_eq!(block.hash(), resigned.hash());
}

#[test]
fn block_serialization_roundtrip() {
    let _init_guard = oasis_test::init();

    let block = stake_block();
    let bytes = block
        .oasis_serialize_to_vec()
        .expect("serializing a block to a Vec never fails");
    let parsed = Block::oasis_deserialize(&bytes[..]).expect("serialized block parses");
    assert_eq!(block, parsed);

    // Header size is fixed: the Bitcoin-inherited 80 bytes.
    let header_bytes = block
        .header
        .oasis_serialize_to_vec()
        .expect("serializing a header to a Vec never fails");
    assert_eq!(header_bytes.len(), 80);
}

#[test]
fn merkle_root_of_single_transaction_is_its_hash() {
    let _init_guard = oasis_test::init();

    let transaction = Arc::new(coinbase_transaction());
    let root = merkle::root(&[transaction.clone()]);
    assert_eq!(root.0, transaction.hash().0);
}
