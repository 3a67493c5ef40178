//! Zerocoin ledger tests.
//!
//! These run on the UnitTest network, where zerocoin activates at height
//! 10, the serial checks at 20, and public spends at 30.

use std::sync::{
    atomic::Ordering,
    Arc, Mutex, MutexGuard,
};

use num_bigint::BigUint;

use oasis_chain::{
    amount::Amount,
    block::{self, merkle, Block, Header, Height},
    parameters::{Network, NetworkParameters},
    shutdown::IS_SHUTTING_DOWN,
    transaction::Transaction,
    transparent::{Input, OpCode, OutPoint, Output, Script},
    zerocoin::{accumulator_modulus, CoinSpend, Denomination, PublicCoin, SpendKind},
};

use crate::error::{BlockError, SupplyError, ZerocoinError};

use super::*;

/// Serializes the tests that flip the global shutdown flag or race the
/// ledger, so parallel test threads never observe each other's state.
static SHUTDOWN_FLAG_LOCK: Mutex<()> = Mutex::new(());

fn shutdown_flag_guard() -> MutexGuard<'static, ()> {
    SHUTDOWN_FLAG_LOCK
        .lock()
        .expect("shutdown flag lock is never poisoned")
}

fn unit_test_parameters() -> NetworkParameters {
    Network::UnitTest.parameters()
}

fn mint_output(denomination: Denomination, value: u64) -> Output {
    let coin = PublicCoin {
        value: BigUint::from(value),
        denomination,
    };
    Output {
        value: denomination.amount(),
        lock_script: coin.mint_script(),
    }
}

fn spend_input(denomination: Denomination, serial: u64, marker: OpCode) -> Input {
    let spend = CoinSpend {
        version: 1,
        denomination,
        serial_number: BigUint::from(serial),
        accumulator_checksum: 0,
        tx_hash: oasis_chain::transaction::Hash([0; 32]),
        proof: vec![0x01; 16],
    };
    let mut raw = vec![marker as u8];
    raw.extend(
        oasis_chain::serialization::OasisSerialize::oasis_serialize_to_vec(&spend)
            .expect("serializing a spend to a Vec never fails"),
    );
    Input {
        previous_output: OutPoint::null(),
        unlock_script: Script::new(&raw),
        sequence: u32::MAX,
    }
}

fn garbage_spend_input() -> Input {
    Input {
        previous_output: OutPoint::null(),
        unlock_script: Script::new(&[OpCode::ZerocoinSpend as u8, 0xff, 0xff]),
        sequence: u32::MAX,
    }
}

/// A block holding one transaction with the given inputs and outputs, plus
/// a trivial coinbase.
fn block_with(inputs: Vec<Input>, outputs: Vec<Output>) -> Block {
    let coinbase = Transaction {
        version: 1,
        inputs: vec![Input {
            previous_output: OutPoint::null(),
            unlock_script: Script::new(&[0x51]),
            sequence: u32::MAX,
        }],
        outputs: vec![Output {
            value: Amount::zero(),
            lock_script: Script::new(&[0x51]),
        }],
        lock_time: 0,
    };

    let mut transactions = vec![Arc::new(coinbase)];
    if !inputs.is_empty() || !outputs.is_empty() {
        let inputs = if inputs.is_empty() {
            vec![Input {
                previous_output: OutPoint {
                    hash: oasis_chain::transaction::Hash([0x33; 32]),
                    index: 0,
                },
                unlock_script: Script::new(&[]),
                sequence: u32::MAX,
            }]
        } else {
            inputs
        };
        transactions.push(Arc::new(Transaction {
            version: 1,
            inputs,
            outputs,
            lock_time: 0,
        }));
    }

    Block {
        header: Header {
            version: 4,
            previous_block_hash: block::Hash([0; 32]),
            merkle_root: merkle::root(&transactions),
            time: 1_527_415_096,
            difficulty_bits: 0x1e0ffff0,
            nonce: 0,
        },
        transactions,
        signature: Default::default(),
    }
}

/// An in-memory chain for replay tests.
#[derive(Default)]
struct MemoryChain {
    blocks: Vec<(Arc<Block>, SupplyEntry)>,
}

impl MemoryChain {
    fn push(&mut self, block: Block) {
        self.blocks.push((Arc::new(block), SupplyEntry::default()));
    }
}

impl ChainReader for MemoryChain {
    fn tip_height(&self) -> Option<Height> {
        self.blocks.len().checked_sub(1).map(|h| Height(h as u32))
    }

    fn block_at(&self, height: Height) -> Option<Arc<Block>> {
        self.blocks.get(height.0 as usize).map(|(b, _)| b.clone())
    }

    fn entry_at(&mut self, height: Height) -> Option<&mut SupplyEntry> {
        self.blocks.get_mut(height.0 as usize).map(|(_, e)| e)
    }
}

/// A ten-block chain with one mint at height 10 and one spend at height 12.
fn mint_and_spend_chain() -> MemoryChain {
    let mut chain = MemoryChain::default();
    for height in 0u32..=14 {
        let block = match height {
            10 => block_with(vec![], vec![mint_output(Denomination::Ten, 0x1234)]),
            11 => block_with(vec![], vec![mint_output(Denomination::One, 0x5678)]),
            12 => block_with(
                vec![spend_input(Denomination::Ten, 0x9999, OpCode::ZerocoinSpend)],
                vec![],
            ),
            _ => block_with(vec![], vec![]),
        };
        chain.push(block);
    }
    chain
}

#[test]
fn well_formed_mint_extracts_exactly_once() {
    let _init_guard = oasis_test::init();

    let block = block_with(vec![], vec![mint_output(Denomination::OneHundred, 0xfeed)]);
    let mints = mints_from_block(&block, Height(10), MalformedMintPolicy::Filter)
        .expect("extraction succeeds");

    assert_eq!(mints.len(), 1);
    assert_eq!(mints[0].denomination, Denomination::OneHundred);
    assert_eq!(mints[0].height, Height(10));
    assert!(mints[0].is_valid);
}

#[test]
fn malformed_mint_is_filtered_or_rejected_by_policy() {
    let _init_guard = oasis_test::init();

    // A mint-marked output whose value is not a denomination.
    let coin = PublicCoin {
        value: BigUint::from(0x77u8),
        denomination: Denomination::One,
    };
    let malformed = Output {
        value: Amount::new_from_coins(3),
        lock_script: coin.mint_script(),
    };
    let block = block_with(
        vec![],
        vec![malformed, mint_output(Denomination::Five, 0xbeef)],
    );

    // Tolerant mode drops the malformed mint and keeps the good one.
    let mints = mints_from_block(&block, Height(10), MalformedMintPolicy::Filter)
        .expect("tolerant extraction succeeds");
    assert_eq!(mints.len(), 1);
    assert_eq!(mints[0].denomination, Denomination::Five);

    // Strict mode rejects the whole block.
    assert!(matches!(
        mints_from_block(&block, Height(20), MalformedMintPolicy::Reject),
        Err(ZerocoinError::MalformedMint(_)),
    ));
}

#[test]
fn out_of_group_mint_is_flagged_invalid() {
    let _init_guard = oasis_test::init();

    let coin = PublicCoin {
        value: accumulator_modulus().clone(),
        denomination: Denomination::One,
    };
    let block = block_with(
        vec![],
        vec![Output {
            value: Denomination::One.amount(),
            lock_script: coin.mint_script(),
        }],
    );

    let mints = mints_from_block(&block, Height(10), MalformedMintPolicy::Filter)
        .expect("tolerant extraction succeeds");
    assert_eq!(mints.len(), 1);
    assert!(!mints[0].is_valid);

    assert!(matches!(
        mints_from_block(&block, Height(20), MalformedMintPolicy::Reject),
        Err(ZerocoinError::MintValueOutOfRange),
    ));
}

#[test]
fn policy_follows_serial_range_check_activation() {
    let _init_guard = oasis_test::init();

    let parameters = unit_test_parameters();
    assert_eq!(
        MalformedMintPolicy::for_height(&parameters, Height(19)),
        MalformedMintPolicy::Filter
    );
    assert_eq!(
        MalformedMintPolicy::for_height(&parameters, Height(20)),
        MalformedMintPolicy::Reject
    );
}

#[test]
fn spends_enumerate_with_filtering() {
    let _init_guard = oasis_test::init();

    let block = block_with(
        vec![
            spend_input(Denomination::Fifty, 0x01, OpCode::ZerocoinSpend),
            garbage_spend_input(),
            spend_input(Denomination::One, 0x02, OpCode::ZerocoinPublicSpend),
        ],
        vec![],
    );

    // Filtered: the garbage spend is skipped, both good spends survive.
    let spends = spends_from_block(&block, true).expect("filtered enumeration succeeds");
    assert_eq!(spends.len(), 2);
    assert_eq!(spends[0].denomination(), Denomination::Fifty);
    assert_eq!(spends[0].kind, SpendKind::Private);
    assert_eq!(spends[1].kind, SpendKind::Public);
    for spend in &spends {
        assert!(Denomination::ALL.contains(&spend.denomination()));
    }

    // Unfiltered: the garbage spend propagates.
    assert!(matches!(
        spends_from_block(&block, false),
        Err(ZerocoinError::MalformedSpend(_)),
    ));
}

#[test]
fn public_coin_extraction_is_gated_by_activation() {
    let _init_guard = oasis_test::init();

    let parameters = unit_test_parameters();
    let output = mint_output(Denomination::Ten, 0xabcd);

    // Public spends activate at UnitTest height 30.
    assert!(matches!(
        public_coin_from_output(&parameters, Height(29), &output),
        Err(ZerocoinError::PublicSpendsNotActive(Height(29))),
    ));

    let coin = public_coin_from_output(&parameters, Height(30), &output)
        .expect("active-era extraction succeeds");
    assert_eq!(coin.denomination, Denomination::Ten);
}

#[test]
fn contextual_spend_checks() {
    let _init_guard = oasis_test::init();

    let parameters = unit_test_parameters();
    let mut spend = CoinSpend {
        version: 1,
        denomination: Denomination::One,
        serial_number: BigUint::from(0x1111u32),
        accumulator_checksum: 0,
        tx_hash: oasis_chain::transaction::Hash([0; 32]),
        proof: vec![],
    };

    // Before zerocoin activates, spends are invalid outright.
    assert!(matches!(
        check_spend(&parameters, Height(9), &spend),
        Err(ZerocoinError::NotActive(_)),
    ));

    // Between activation and the serial checks, a v1 serial passes.
    assert!(check_spend(&parameters, Height(10), &spend).is_ok());

    // Once v2 serials are required, a v1 serial fails.
    assert!(matches!(
        check_spend(&parameters, Height(20), &spend),
        Err(ZerocoinError::SerialVersionMismatch { found: 1, .. }),
    ));

    // A marked v2 serial passes the same height.
    let mut marked = [0u8; 32];
    marked[0] = 0xf0;
    marked[31] = 0x05;
    spend.serial_number = BigUint::from_bytes_be(&marked);
    assert!(check_spend(&parameters, Height(20), &spend).is_ok());
}

#[test]
fn per_transaction_spend_limits() {
    let _init_guard = oasis_test::init();

    let parameters = unit_test_parameters();
    let too_many: Vec<Input> = (0..8)
        .map(|i| spend_input(Denomination::One, 0x100 + i, OpCode::ZerocoinSpend))
        .collect();
    let transaction = Transaction {
        version: 1,
        inputs: too_many,
        outputs: vec![],
        lock_time: 0,
    };

    assert!(matches!(
        check_spend_limits(&parameters, &transaction),
        Err(ZerocoinError::TooManySpends {
            kind: SpendKind::Private,
            limit: 7,
        }),
    ));

    let transaction = Transaction {
        version: 1,
        inputs: vec![spend_input(Denomination::One, 0x1, OpCode::ZerocoinSpend)],
        outputs: vec![],
        lock_time: 0,
    };
    assert!(check_spend_limits(&parameters, &transaction).is_ok());
}

#[test]
fn apply_block_updates_supply_and_entry() {
    let _init_guard = oasis_test::init();
    let _flag_guard = shutdown_flag_guard();

    let parameters = unit_test_parameters();
    let ledger = SupplyLedger::new();

    let block = block_with(vec![], vec![mint_output(Denomination::Ten, 0x1234)]);
    let mut entry = SupplyEntry::default();

    ledger
        .apply_block(&parameters, Height(10), &block, &mut entry)
        .expect("applying a valid block succeeds");

    assert_eq!(ledger.supply().coins(Denomination::Ten), 1);
    assert!(entry.applied);
    assert_eq!(entry.supply.coins(Denomination::Ten), 1);
    assert_eq!(
        ledger.supply().total_value().expect("supply in range"),
        Denomination::Ten.amount()
    );
}

#[test]
fn apply_block_is_idempotent() {
    let _init_guard = oasis_test::init();
    let _flag_guard = shutdown_flag_guard();

    let parameters = unit_test_parameters();
    let ledger = SupplyLedger::new();

    let block = block_with(vec![], vec![mint_output(Denomination::Five, 0x4321)]);
    let mut entry = SupplyEntry::default();

    ledger
        .apply_block(&parameters, Height(10), &block, &mut entry)
        .expect("first application succeeds");
    let after_first = ledger.supply();

    // Re-applying the same block (as happens during reorg replay) must not
    // double-count.
    ledger
        .apply_block(&parameters, Height(10), &block, &mut entry)
        .expect("second application is a no-op");
    assert_eq!(ledger.supply(), after_first);
    assert_eq!(ledger.supply().coins(Denomination::Five), 1);
}

#[test]
fn apply_block_ignores_blocks_before_activation() {
    let _init_guard = oasis_test::init();
    let _flag_guard = shutdown_flag_guard();

    let parameters = unit_test_parameters();
    let ledger = SupplyLedger::new();

    // Zerocoin data in a pre-activation block does not count.
    let block = block_with(vec![], vec![mint_output(Denomination::Ten, 0x1234)]);
    let mut entry = SupplyEntry::default();
    ledger
        .apply_block(&parameters, Height(5), &block, &mut entry)
        .expect("pre-activation blocks apply as no-ops");

    assert_eq!(ledger.supply().coins(Denomination::Ten), 0);
    assert!(entry.applied);
}

#[test]
fn overspending_a_denomination_is_fatal() {
    let _init_guard = oasis_test::init();
    let _flag_guard = shutdown_flag_guard();

    let parameters = unit_test_parameters();
    let ledger = SupplyLedger::new();

    // A spend with no matching mint would drive the count negative.
    let block = block_with(
        vec![spend_input(Denomination::Fifty, 0x7777, OpCode::ZerocoinSpend)],
        vec![],
    );
    let mut entry = SupplyEntry::default();

    let result = ledger.apply_block(&parameters, Height(10), &block, &mut entry);
    assert!(matches!(
        result,
        Err(BlockError::Supply(SupplyError::NegativeSupply {
            denomination: Denomination::Fifty,
        })),
    ));
    // The failed block is not marked applied and the counter is unchanged.
    assert!(!entry.applied);
    assert_eq!(ledger.supply().coins(Denomination::Fifty), 0);
}

#[test]
fn recompute_matches_incremental_application() {
    let _init_guard = oasis_test::init();
    let _flag_guard = shutdown_flag_guard();

    let parameters = unit_test_parameters();

    // Apply the chain incrementally.
    let incremental = SupplyLedger::new();
    let mut chain = mint_and_spend_chain();
    for height in 0u32..=14 {
        let height = Height(height);
        let block = chain.block_at(height).expect("height is in the chain");
        let entry = chain.entry_at(height).expect("height is in the chain");
        incremental
            .apply_block(&parameters, height, &block, entry)
            .expect("chain blocks apply");
    }

    // Replay the same chain from genesis into a fresh ledger.
    let replayed = SupplyLedger::new();
    let mut replay_chain = mint_and_spend_chain();
    let outcome = replayed
        .recompute_from_height(&parameters, &mut replay_chain, Height(0), false)
        .expect("replay succeeds");
    assert_eq!(outcome, RecomputeOutcome::Completed { tip: Height(14) });

    // The two counters agree, and the consistency check accepts them.
    assert_eq!(incremental.supply(), replayed.supply());
    incremental
        .check_consistency(&replayed.supply())
        .expect("incremental and replayed supply agree");

    assert_eq!(replayed.supply().coins(Denomination::Ten), 0);
    assert_eq!(replayed.supply().coins(Denomination::One), 1);
}

#[test]
fn recompute_from_middle_seeds_from_parent_entry() {
    let _init_guard = oasis_test::init();
    let _flag_guard = shutdown_flag_guard();

    let parameters = unit_test_parameters();

    let ledger = SupplyLedger::new();
    let mut chain = mint_and_spend_chain();
    ledger
        .recompute_from_height(&parameters, &mut chain, Height(0), false)
        .expect("full replay succeeds");
    let full = ledger.supply();

    // Replaying just the tail over the recorded entries gives the same
    // result.
    let tail_ledger = SupplyLedger::new();
    let outcome = tail_ledger
        .recompute_from_height(&parameters, &mut chain, Height(12), false)
        .expect("tail replay succeeds");
    assert_eq!(outcome, RecomputeOutcome::Completed { tip: Height(14) });
    assert_eq!(tail_ledger.supply(), full);
}

#[test]
fn skipping_the_subsystem_zeroes_the_counter() {
    let _init_guard = oasis_test::init();
    let _flag_guard = shutdown_flag_guard();

    let parameters = unit_test_parameters();
    let ledger = SupplyLedger::new();
    let mut chain = mint_and_spend_chain();

    ledger
        .recompute_from_height(&parameters, &mut chain, Height(0), false)
        .expect("replay succeeds");
    assert_ne!(ledger.supply(), ZerocoinSupply::default());

    ledger
        .recompute_from_height(&parameters, &mut chain, Height(0), true)
        .expect("skipping replay succeeds");
    assert_eq!(ledger.supply(), ZerocoinSupply::default());
}

#[test]
fn recompute_is_interruptible_at_block_boundaries() {
    let _init_guard = oasis_test::init();
    let _flag_guard = shutdown_flag_guard();

    let parameters = unit_test_parameters();
    let ledger = SupplyLedger::new();
    let mut chain = mint_and_spend_chain();

    IS_SHUTTING_DOWN.store(true, Ordering::SeqCst);
    let outcome = ledger.recompute_from_height(&parameters, &mut chain, Height(0), false);
    IS_SHUTTING_DOWN.store(false, Ordering::SeqCst);

    // The replay stopped before applying anything, at a block boundary.
    assert_eq!(
        outcome.expect("interrupted replay still succeeds"),
        RecomputeOutcome::Interrupted {
            resume: Height(0),
        }
    );
    assert_eq!(ledger.supply(), ZerocoinSupply::default());

    // Resuming after shutdown completes the replay.
    let outcome = ledger
        .recompute_from_height(&parameters, &mut chain, Height(0), false)
        .expect("resumed replay succeeds");
    assert_eq!(outcome, RecomputeOutcome::Completed { tip: Height(14) });
}

#[test]
fn divergent_supply_is_fatal() {
    let _init_guard = oasis_test::init();
    let _flag_guard = shutdown_flag_guard();

    let parameters = unit_test_parameters();
    let ledger = SupplyLedger::new();

    let block = block_with(vec![], vec![mint_output(Denomination::Ten, 0x1234)]);
    let mut entry = SupplyEntry::default();
    ledger
        .apply_block(&parameters, Height(10), &block, &mut entry)
        .expect("applying a valid block succeeds");

    let empty = ZerocoinSupply::default();
    assert!(matches!(
        ledger.check_consistency(&empty),
        Err(SupplyError::Inconsistent {
            denomination: Denomination::Ten,
            incremental: 1,
            recomputed: 0,
        }),
    ));
}

#[test]
fn mint_value_enumeration_by_denomination() {
    let _init_guard = oasis_test::init();

    let block = block_with(
        vec![],
        vec![
            mint_output(Denomination::Ten, 0x0a),
            mint_output(Denomination::Ten, 0x0b),
            mint_output(Denomination::One, 0x0c),
        ],
    );

    let values = mint_values_for_denomination(&block, Denomination::Ten);
    assert_eq!(
        values,
        vec![BigUint::from(0x0au8), BigUint::from(0x0bu8)]
    );
    assert_eq!(
        mint_values_for_denomination(&block, Denomination::FiveThousand),
        Vec::<BigUint>::new()
    );
}
