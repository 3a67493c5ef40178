//! Consensus parameter tests for oasis.

use proptest::prelude::*;

use crate::block::Height;

use super::*;

use Network::*;

#[test]
fn all_networks_construct_and_validate() {
    let _init_guard = oasis_test::init();

    for network in Network::iter() {
        let parameters =
            NetworkParameters::new(network).expect("hard-coded parameters validate");
        assert_eq!(parameters.network, network);
        assert_eq!(parameters.magic, network.magic());
        assert_eq!(parameters.default_port, network.default_port());
    }
}

#[test]
fn activation_boundaries_are_inclusive() {
    let _init_guard = oasis_test::init();

    let parameters = Testnet.parameters();

    // Zerocoin activates at testnet height 250.
    assert!(!parameters.zerocoin_active(Height(249)));
    assert!(parameters.zerocoin_active(Height(250)));
    assert!(parameters.zerocoin_active(Height(251)));
    assert!(parameters.zerocoin_active(Height::MAX));

    // Public spends, serial checks and v2 serials all arrive at 500.
    assert!(!parameters.zerocoin_public_spends_active(Height(499)));
    assert!(parameters.zerocoin_public_spends_active(Height(500)));
    assert!(!parameters.zerocoin_serial_range_check_active(Height(499)));
    assert!(parameters.zerocoin_serial_range_check_active(Height(500)));
    assert!(!parameters.zerocoin_serials_v2_active(Height(499)));
    assert!(parameters.zerocoin_serials_v2_active(Height(500)));
}

#[test]
fn never_thresholds_are_never_active() {
    let _init_guard = oasis_test::init();

    let parameters = Mainnet.parameters();

    // Mainnet never enabled public spends or the serial checks.
    assert!(!parameters.zerocoin_public_spends_active(Height::MAX));
    assert!(!parameters.zerocoin_serial_range_check_active(Height::MAX));
    assert!(!parameters.zerocoin_serials_v2_active(Height::MAX));

    // And its accumulator checkpoints are never retired.
    assert!(!parameters.accumulator_checkpoints_retired(Height::MAX));
}

#[test]
fn accumulator_checkpoint_retirement_is_exclusive() {
    let _init_guard = oasis_test::init();

    let parameters = Regtest.parameters();

    // The last regtest checkpoint is at height 310; retirement starts after.
    assert!(!parameters.accumulator_checkpoints_retired(Height(310)));
    assert!(parameters.accumulator_checkpoints_retired(Height(311)));
}

#[test]
fn stake_modifier_era_machine() {
    let _init_guard = oasis_test::init();

    let parameters = Testnet.parameters();

    // Legacy until the new selection rule at 210, then V2 from 500.
    assert_eq!(
        parameters.stake_modifier_era(Height(0)),
        StakeModifierEra::Legacy
    );
    assert_eq!(
        parameters.stake_modifier_era(Height(209)),
        StakeModifierEra::Legacy
    );
    assert_eq!(
        parameters.stake_modifier_era(Height(210)),
        StakeModifierEra::NewSelectionTransition
    );
    assert_eq!(
        parameters.stake_modifier_era(Height(499)),
        StakeModifierEra::NewSelectionTransition
    );
    assert_eq!(
        parameters.stake_modifier_era(Height(500)),
        StakeModifierEra::V2
    );
    assert_eq!(
        parameters.stake_modifier_era(Height::MAX),
        StakeModifierEra::V2
    );
}

#[test]
fn non_monotonic_activations_fail_validation() {
    let _init_guard = oasis_test::init();

    // Start from a valid table and break one invariant at a time.
    let valid = Testnet.parameters().activation;
    assert_eq!(valid.validate(), Ok(()));

    let mut broken = valid;
    broken.stake_modifier_v2 = Threshold::At(Height(100));
    assert!(matches!(
        broken.validate(),
        Err(ParameterError::NonMonotonicActivation {
            feature: "stake modifier v2",
            ..
        })
    ));

    // A sub-feature enabled while its parent is disabled is also broken.
    let mut broken = valid;
    broken.zerocoin = Threshold::Never;
    assert!(matches!(
        broken.validate(),
        Err(ParameterError::NonMonotonicActivation {
            feature: "zerocoin public spends",
            ..
        })
    ));

    // `Never` sub-features are fine under an active parent.
    let mut disabled = valid;
    disabled.zerocoin_public_spends = Threshold::Never;
    assert_eq!(disabled.validate(), Ok(()));
}

#[test]
fn pow_era_ends_at_last_pow_height() {
    let _init_guard = oasis_test::init();

    let parameters = Mainnet.parameters();
    assert!(parameters.pow_allowed(Height(200)));
    assert!(!parameters.pow_allowed(Height(201)));

    // Zerocoin starts right after the PoW era on mainnet.
    assert!(!parameters.zerocoin_active(Height(200)));
    assert!(parameters.zerocoin_active(Height(201)));
}

#[test]
fn timing_constants_follow_the_time_protocol_eras() {
    let _init_guard = oasis_test::init();

    let parameters = Testnet.parameters();
    assert_eq!(parameters.target_spacing().num_seconds(), 60);
    assert_eq!(parameters.time_slot_length().num_seconds(), 15);
    assert_eq!(
        parameters.future_time_drift(Height(1)).num_seconds(),
        7200
    );
    assert_eq!(
        parameters.future_time_drift(Height(201)).num_seconds(),
        180
    );
}

#[test]
fn genesis_block_matches_descriptor() {
    let _init_guard = oasis_test::init();

    for network in Network::iter() {
        let parameters = network.parameters();
        let genesis = genesis_block(&parameters);

        assert_eq!(genesis.header.time, parameters.genesis.time);
        assert_eq!(genesis.header.nonce, parameters.genesis.nonce);
        assert_eq!(
            genesis.header.difficulty_bits,
            parameters.genesis.difficulty_bits
        );
        assert_eq!(
            genesis.header.previous_block_hash,
            GENESIS_PREVIOUS_BLOCK_HASH
        );
        assert!(genesis.is_proof_of_work());
        assert!(genesis.signature.is_empty());

        // The merkle root commits to the single coinbase transaction.
        assert_eq!(genesis.transactions.len(), 1);
        assert!(genesis.transactions[0].is_coinbase());
        assert_eq!(
            genesis.header.merkle_root.0,
            genesis.transactions[0].hash().0
        );
        assert_eq!(
            genesis.transactions[0].outputs[0].value,
            parameters.genesis.reward
        );
    }
}

proptest! {
    /// Every activation predicate is exactly `height >= threshold`.
    #[test]
    fn activation_predicates_match_thresholds(height in 0u32..=Height::MAX.0) {
        let _init_guard = oasis_test::init();

        let height = Height(height);
        for network in Network::iter() {
            let parameters = network.parameters();
            let activation = &parameters.activation;

            let cases: [(bool, Threshold); 6] = [
                (parameters.zerocoin_active(height), activation.zerocoin),
                (
                    parameters.zerocoin_public_spends_active(height),
                    activation.zerocoin_public_spends,
                ),
                (
                    parameters.zerocoin_serial_range_check_active(height),
                    activation.zerocoin_serial_range_check,
                ),
                (
                    parameters.zerocoin_serials_v2_active(height),
                    activation.zerocoin_serials_v2,
                ),
                (
                    parameters.new_message_signatures_active(height),
                    activation.new_message_signatures,
                ),
                (
                    parameters.time_protocol_v2_active(height),
                    activation.time_protocol_v2,
                ),
            ];

            for (active, threshold) in cases {
                let expected = match threshold {
                    Threshold::At(at) => height >= at,
                    Threshold::Never => false,
                };
                prop_assert_eq!(active, expected);
            }
        }
    }
}
