//! Checkpoint verifier tests.

use oasis_chain::{
    block::{self, Height},
    parameters::Network,
};

use crate::error::CheckpointError;

use super::{list::CheckpointList, CheckpointVerifier};

#[test]
fn hard_coded_lists_parse() {
    let _init_guard = oasis_test::init();

    for network in Network::iter() {
        let list = CheckpointList::new(network);
        assert!(list.contains(Height(0)));
    }

    // Mainnet carries the full table; test networks are trivial.
    let mainnet = CheckpointList::new(Network::Mainnet);
    assert_eq!(mainnet.max_height(), Height(315_204));
    assert_eq!(CheckpointList::new(Network::Regtest).max_height(), Height(0));
    assert_eq!(
        CheckpointList::new(Network::UnitTest).max_height(),
        Height(0)
    );
}

#[test]
fn list_rejects_bad_data() {
    let _init_guard = oasis_test::init();

    let hash_a: block::Hash = "00000d928efd171c0d8435d457d9becf8542c8e19ddb560dc9e08189014f6617"
        .parse()
        .expect("valid hash parses");
    let hash_b: block::Hash = "000002cb5693188479b0634f5b5edb1357674b9bf20b2b17b5ca5b5c540fd7e3"
        .parse()
        .expect("valid hash parses");

    // Missing genesis checkpoint.
    assert!(CheckpointList::from_list([(Height(5), hash_a)]).is_err());
    // Empty list.
    assert!(CheckpointList::from_list([]).is_err());
    // Duplicate heights.
    assert!(CheckpointList::from_list([
        (Height(0), hash_a),
        (Height(5), hash_b),
        (Height(5), hash_b),
    ])
    .is_err());
    // Duplicate hashes.
    assert!(
        CheckpointList::from_list([(Height(0), hash_a), (Height(5), hash_a)]).is_err()
    );
    // Null hash.
    assert!(CheckpointList::from_list([(Height(0), block::Hash([0; 32]))]).is_err());

    // A well-formed two-entry list is fine.
    let list = CheckpointList::from_list([(Height(0), hash_a), (Height(5), hash_b)])
        .expect("well-formed list validates");
    assert_eq!(list.max_height(), Height(5));
    assert_eq!(list.min_height_in_range(Height(1)..), Some(Height(5)));
}

#[test]
fn checkpoint_match_and_mismatch() {
    let _init_guard = oasis_test::init();

    let verifier = CheckpointVerifier::new(Network::Mainnet);

    let checkpoint_8: block::Hash =
        "000002477df15df6a08518bd924b7815ead096c3421c6dbcb96eb49f2ce9b6af"
            .parse()
            .expect("valid hash parses");
    let other_hash: block::Hash =
        "1111111111111111111111111111111111111111111111111111111111111111"
            .parse()
            .expect("valid hash parses");

    // A matching hash at a checkpoint height is accepted.
    assert!(verifier.check(Height(8), checkpoint_8).is_ok());

    // A candidate block at height 8 with any other hash is permanently
    // rejected.
    assert!(matches!(
        verifier.check(Height(8), other_hash),
        Err(CheckpointError::Violation {
            height: Height(8),
            ..
        })
    ));

    // Between checkpoints, no constraint is imposed.
    assert!(verifier.check(Height(9), other_hash).is_ok());
    assert!(verifier.check(Height(1_000_000), other_hash).is_ok());
}

#[test]
fn reorganizations_below_checkpoints_are_vetoed() {
    let _init_guard = oasis_test::init();

    let verifier = CheckpointVerifier::new(Network::Mainnet);
    let last = verifier.max_checkpoint_height();

    // A fork point below the highest checkpoint would remove checkpointed
    // blocks, regardless of the contending chain's own validity.
    assert!(matches!(
        verifier.check_reorganization(Height(8)),
        Err(CheckpointError::ReorgBelowCheckpoint { .. })
    ));
    assert!(verifier
        .check_reorganization(last.previous().expect("non-zero"))
        .is_err());

    // Forks at or above the highest checkpoint are allowed.
    assert!(verifier.check_reorganization(last).is_ok());
    assert!(verifier
        .check_reorganization(last.next().expect("in range"))
        .is_ok());

    // Test networks are unconstrained above genesis.
    let regtest = CheckpointVerifier::new(Network::Regtest);
    assert!(regtest.check_reorganization(Height(1)).is_ok());
}

#[test]
fn transaction_estimate_is_monotonic() {
    let _init_guard = oasis_test::init();

    let verifier = CheckpointVerifier::new(Network::Mainnet);
    let data = verifier.data();

    let at_checkpoint = chrono::DateTime::from_timestamp(data.last_checkpoint_time, 0)
        .expect("checkpoint time is in range");
    let a_week_later = chrono::DateTime::from_timestamp(
        data.last_checkpoint_time + 7 * 86_400,
        0,
    )
    .expect("checkpoint time is in range");

    assert_eq!(
        verifier.estimated_transactions(at_checkpoint),
        data.total_transactions
    );
    assert_eq!(
        verifier.estimated_transactions(a_week_later),
        data.total_transactions + 7 * data.transactions_per_day
    );
}
