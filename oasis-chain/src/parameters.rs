//! Consensus parameters for each oasis network.
//!
//! Some consensus rules change based on height-activated features. Each
//! feature activates at a particular block height, and the activation
//! predicates on [`NetworkParameters`] are the only way consensus code asks
//! "is feature X on at height h". The predicates are pure, deterministic
//! and O(1), so they are safe to call for every block.
//!
//! Every network's parameter set is constructed by its own function,
//! producing a fully independent value: there is no inheritance layering
//! between networks, and no global "current parameters" pointer. Construct
//! the parameters once at startup and pass them by reference through the
//! validation call chain.

mod activation;
mod genesis;
mod network;

pub use activation::{ActivationHeights, ParameterError, StakeModifierEra, Threshold};
pub use genesis::{genesis_block, GENESIS_PREVIOUS_BLOCK_HASH};
pub use network::{magics, InvalidNetworkError, Magic, Network};

#[cfg(test)]
mod tests;

use chrono::Duration;

use crate::{
    amount::{Amount, NonNegative, CENT},
    block::{self, merkle, Height},
    work::ExpandedDifficulty,
};

/// The genesis block descriptor for one network.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GenesisParameters {
    /// The genesis block version.
    pub version: i32,
    /// The genesis block timestamp.
    pub time: u32,
    /// The genesis block nonce.
    pub nonce: u32,
    /// The genesis difficulty target, in compact form.
    pub difficulty_bits: u32,
    /// The genesis coinbase reward.
    pub reward: Amount<NonNegative>,
}

/// The base58 version bytes for one network's address encodings.
///
/// These are consumed by the address encode/decode collaborator; the table
/// itself is part of the consensus parameter surface.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AddressPrefixes {
    /// Pay-to-public-key-hash addresses.
    pub public_key: u8,
    /// Pay-to-script-hash addresses.
    pub script: u8,
    /// Cold-staking addresses.
    pub staking: u8,
    /// WIF private keys.
    pub secret_key: u8,
    /// BIP32 extended public keys.
    pub ext_public_key: [u8; 4],
    /// BIP32 extended secret keys.
    pub ext_secret_key: [u8; 4],
    /// The BIP44 coin type.
    pub ext_coin_type: [u8; 4],
}

/// The zerocoin sub-protocol constants for one network.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ZerocoinParameters {
    /// The maximum number of private spends in one transaction.
    /// (Each private spend input is roughly 20 kB.)
    pub max_spends_per_transaction: u32,
    /// The maximum number of public spends in one transaction.
    /// (Each public spend input is roughly 220 bytes.)
    pub max_public_spends_per_transaction: u32,
    /// The confirmations a mint needs before it can be spent.
    pub min_mint_confirmations: u32,
    /// The minimum fee paid when minting.
    pub min_mint_fee: Amount<NonNegative>,
    /// The depth a zerocoin stake input needs.
    pub min_stake_depth: u32,
    /// The Unix time at which the zerocoin protocol opened.
    pub start_time: i64,
}

/// The full, immutable consensus parameter set for one network.
///
/// One instance exists per process, selected by [`Network`] at startup.
/// Construction validates the activation-height invariants; a set that
/// fails validation must never be used.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NetworkParameters {
    /// The network this parameter set describes.
    pub network: Network,
    /// The genesis block descriptor.
    pub genesis: GenesisParameters,
    /// The expected genesis block hash.
    pub genesis_hash: block::Hash,
    /// The expected genesis merkle root.
    pub genesis_merkle_root: merkle::Root,

    /// Allow sub-minimum-difficulty blocks (test networks only).
    pub pow_allow_min_difficulty_blocks: bool,
    /// The easiest allowed proof-of-work target.
    pub pow_limit: ExpandedDifficulty,
    /// The easiest allowed proof-of-stake target before the version 2
    /// modifier.
    pub pos_limit_v1: ExpandedDifficulty,
    /// The easiest allowed proof-of-stake target from the version 2
    /// modifier on.
    pub pos_limit_v2: ExpandedDifficulty,

    /// The budget superblock cycle length, in blocks.
    pub budget_cycle_blocks: u32,
    /// Confirmations required on a budget finalization fee.
    pub budget_fee_confirmations: u32,
    /// The number of masternodes the see-saw payment check may be off by.
    pub masternode_count_drift: u32,
    /// The minimum age of a proposal before it enters a budget, in seconds.
    pub proposal_establishment_seconds: i64,
    /// The maximum number of transactions in an obfuscation pool session.
    pub pool_max_transactions: u32,
    /// The obfuscation pool collateral address.
    pub obfuscation_pool_dummy_address: &'static str,

    /// Confirmations before a coinbase output can be spent.
    pub coinbase_maturity: u32,
    /// The maximum outstanding supply.
    pub max_money_out: Amount<NonNegative>,
    /// The minimum age of a staked output, in seconds.
    pub stake_min_age_seconds: i64,
    /// The minimum depth of a staked output, in blocks.
    pub stake_min_depth: u32,

    /// Allowed future drift of proof-of-work block times, in seconds.
    pub future_time_drift_pow_seconds: i64,
    /// Allowed future drift of proof-of-stake block times, in seconds.
    pub future_time_drift_pos_seconds: i64,
    /// The difficulty retarget timespan, in seconds.
    pub target_timespan_seconds: i64,
    /// The retarget timespan under the second time protocol, in seconds.
    pub target_timespan_v2_seconds: i64,
    /// The target block spacing, in seconds.
    pub target_spacing_seconds: i64,
    /// The block-time slot length under the second time protocol, in
    /// seconds.
    pub time_slot_seconds: i64,

    /// The key that signs network-wide spork messages.
    pub spork_public_key: &'static str,

    /// The height-activation table.
    pub activation: ActivationHeights,
    /// The zerocoin sub-protocol constants.
    pub zerocoin: ZerocoinParameters,

    /// The peer-to-peer message start bytes.
    pub magic: Magic,
    /// The default peer-to-peer port.
    pub default_port: u16,
    /// The base58 address version bytes.
    pub address_prefixes: AddressPrefixes,
}

impl NetworkParameters {
    /// Build the validated parameter set for `network`.
    ///
    /// # Errors
    ///
    /// Fails if the activation-height ordering invariants are violated.
    /// This is fatal and non-recoverable: it means the hard-coded
    /// parameters are wrong.
    pub fn new(network: Network) -> Result<NetworkParameters, ParameterError> {
        let parameters = match network {
            Network::Mainnet => NetworkParameters::mainnet(),
            Network::Testnet => NetworkParameters::testnet(),
            Network::Regtest => NetworkParameters::regtest(),
            Network::UnitTest => NetworkParameters::unit_test(),
        };
        parameters.activation.validate()?;
        Ok(parameters)
    }

    /// The production mainnet.
    ///
    /// Monetary cap and rule-change height follow the final edit of the
    /// deployed parameters; see DESIGN.md for the discrepancy history.
    fn mainnet() -> NetworkParameters {
        NetworkParameters {
            network: Network::Mainnet,
            genesis: GenesisParameters {
                version: 1,
                time: 1_527_359_509,
                nonce: 737_213,
                difficulty_bits: 0x1e0ffff0,
                reward: Amount::zero(),
            },
            genesis_hash: "00000d928efd171c0d8435d457d9becf8542c8e19ddb560dc9e08189014f6617"
                .parse()
                .expect("hard-coded hash parses"),
            genesis_merkle_root: merkle::Root(
                hash_bytes("92efca81c11c8026ae8ee4fc743aee0e458f5b9866b917c381b0d3a1e7edda63"),
            ),

            pow_allow_min_difficulty_blocks: false,
            // oasis starting difficulty is 1 / 2^12
            pow_limit: ExpandedDifficulty::ones_shifted_right(20),
            pos_limit_v1: ExpandedDifficulty::ones_shifted_right(24),
            pos_limit_v2: ExpandedDifficulty::ones_shifted_right(20),

            budget_cycle_blocks: 43_200, // approx. 1 every 30 days
            budget_fee_confirmations: 6,
            masternode_count_drift: 20,
            proposal_establishment_seconds: 60 * 60 * 24,
            pool_max_transactions: 3,
            obfuscation_pool_dummy_address: "oSQo21b24dD6AvQ2QyAfQFdBHTSw894tJb",

            coinbase_maturity: 10,
            max_money_out: Amount::new_from_coins(300_000),
            stake_min_age_seconds: 60 * 60,
            stake_min_depth: 600,

            future_time_drift_pow_seconds: 7200,
            future_time_drift_pos_seconds: 180,
            target_timespan_seconds: 30,
            target_timespan_v2_seconds: 60,
            target_spacing_seconds: 60,
            time_slot_seconds: 15,

            spork_public_key: "04b080934472357368be9982a8c138968958267ff5de3d70d92d2d436642dd1d\
                 a3976b2b1ec62f934a6b925fc1ccab32205580d1d50554fb1da3c2d8b964c15d3d",

            activation: ActivationHeights {
                last_pow: Height(200),
                bip65: Threshold::At(Height(1_620_500)),
                new_message_signatures: Threshold::At(Height(1_620_500)),
                stake_modifier_new_selection: Threshold::At(Height(1_520_435)),
                stake_modifier_v2: Threshold::At(Height(1_520_445)),
                time_protocol_v2: Threshold::At(Height(1_620_500)),
                zerocoin: Threshold::At(Height(201)),
                zerocoin_public_spends: Threshold::Never,
                zerocoin_serial_range_check: Threshold::Never,
                zerocoin_serials_v2: Threshold::Never,
                last_accumulator_checkpoint: Threshold::Never,
            },
            zerocoin: ZerocoinParameters {
                max_spends_per_transaction: 7,
                max_public_spends_per_transaction: 637,
                min_mint_confirmations: 20,
                min_mint_fee: mint_fee(),
                min_stake_depth: 200,
                start_time: 1_527_415_096, // 2018-05-27T09:58:16Z
            },

            magic: magics::MAINNET,
            default_port: Network::Mainnet.default_port(),
            address_prefixes: AddressPrefixes {
                public_key: 115,
                script: 15,
                staking: 63, // starting with 'S'
                secret_key: 212,
                ext_public_key: [0x04, 0x28, 0x21, 0x38],
                ext_secret_key: [0x05, 0x27, 0x33, 0x22],
                ext_coin_type: [0x70, 0x00, 0x00, 0xac],
            },
        }
    }

    /// The public test network.
    fn testnet() -> NetworkParameters {
        NetworkParameters {
            network: Network::Testnet,
            genesis: GenesisParameters {
                version: 1,
                time: 1_522_130_562,
                nonce: 3_706_113,
                difficulty_bits: 0x1e0ffff0,
                reward: Amount::new_from_coins(120),
            },
            genesis_hash: "000009f854e700ab62642c7d3e94be65a1d8c112384f5edfb4b2b3fa3fecaef6"
                .parse()
                .expect("hard-coded hash parses"),
            genesis_merkle_root: merkle::Root(
                hash_bytes("dda70dbacbeeb39750532e69dad0a0025c16e9bcc7ca412cf12a988d0020309d"),
            ),

            pow_allow_min_difficulty_blocks: true,
            pow_limit: ExpandedDifficulty::ones_shifted_right(20),
            pos_limit_v1: ExpandedDifficulty::ones_shifted_right(24),
            pos_limit_v2: ExpandedDifficulty::ones_shifted_right(20),

            budget_cycle_blocks: 144, // approx 10 cycles per day
            budget_fee_confirmations: 3,
            masternode_count_drift: 4,
            proposal_establishment_seconds: 60 * 5,
            pool_max_transactions: 2,
            obfuscation_pool_dummy_address: "y57cqfGRkekRyDRNeJiLtYVEbvhXrNbmox",

            coinbase_maturity: 15,
            max_money_out: Amount::new_from_coins(83_000_000),
            stake_min_age_seconds: 60 * 60,
            stake_min_depth: 180,

            future_time_drift_pow_seconds: 7200,
            future_time_drift_pos_seconds: 180,
            target_timespan_seconds: 60,
            target_timespan_v2_seconds: 60,
            target_spacing_seconds: 60,
            time_slot_seconds: 15,

            spork_public_key: "045fdc1d5796a4cc3ec7b93de854747f91ac8c44b150a37a45fe7b115e19463f\
                 902639ac385a7262423d5ac2e5fcea81a403525b25e56c6ff6d6020ff97b9bff57",

            activation: ActivationHeights {
                last_pow: Height(200),
                bip65: Threshold::At(Height(500)),
                new_message_signatures: Threshold::At(Height(500)),
                stake_modifier_new_selection: Threshold::At(Height(210)),
                stake_modifier_v2: Threshold::At(Height(500)),
                time_protocol_v2: Threshold::At(Height(500)),
                zerocoin: Threshold::At(Height(250)),
                zerocoin_public_spends: Threshold::At(Height(500)),
                zerocoin_serial_range_check: Threshold::At(Height(500)),
                zerocoin_serials_v2: Threshold::At(Height(500)),
                last_accumulator_checkpoint: Threshold::At(Height(500)),
            },
            zerocoin: ZerocoinParameters {
                max_spends_per_transaction: 7,
                max_public_spends_per_transaction: 637,
                min_mint_confirmations: 20,
                min_mint_fee: mint_fee(),
                min_stake_depth: 200,
                start_time: 1_501_776_000,
            },

            magic: magics::TESTNET,
            default_port: Network::Testnet.default_port(),
            address_prefixes: AddressPrefixes {
                public_key: 139, // starting with 'x' or 'y'
                script: 19,      // starting with '8' or '9'
                staking: 73,     // starting with 'W'
                secret_key: 239,
                ext_public_key: [0x3a, 0x80, 0x61, 0xa0],
                ext_secret_key: [0x3a, 0x80, 0x58, 0x37],
                ext_coin_type: [0x00, 0x00, 0x00, 0x01],
            },
        }
    }

    /// The local regression test network.
    fn regtest() -> NetworkParameters {
        NetworkParameters {
            network: Network::Regtest,
            genesis: GenesisParameters {
                version: 1,
                time: 1_454_124_731,
                nonce: 2_402_015,
                difficulty_bits: 0x1e0ffff0,
                reward: Amount::new_from_coins(250),
            },
            genesis_hash: "0000041e482b9b9691d98eefb48473405c0b8ec31b76df3797c74a78680ef818"
                .parse()
                .expect("hard-coded hash parses"),
            genesis_merkle_root: merkle::Root(
                hash_bytes("1b2ef6e2f28be914103a277377ae7729dcd125dfeb8bf97bd5964ba72b6dc39b"),
            ),

            pow_allow_min_difficulty_blocks: true,
            pow_limit: ExpandedDifficulty::ones_shifted_right(20),
            pos_limit_v1: ExpandedDifficulty::ones_shifted_right(24),
            pos_limit_v2: ExpandedDifficulty::ones_shifted_right(20),

            budget_cycle_blocks: 144,
            budget_fee_confirmations: 3,
            masternode_count_drift: 4,
            proposal_establishment_seconds: 60 * 5,
            pool_max_transactions: 2,
            obfuscation_pool_dummy_address: "y57cqfGRkekRyDRNeJiLtYVEbvhXrNbmox",

            coinbase_maturity: 100,
            max_money_out: Amount::new_from_coins(43_199_500),
            stake_min_age_seconds: 0,
            stake_min_depth: 2,

            future_time_drift_pow_seconds: 7200,
            future_time_drift_pos_seconds: 180,
            target_timespan_seconds: 40 * 60,
            target_timespan_v2_seconds: 30 * 60,
            target_spacing_seconds: 60,
            time_slot_seconds: 15,

            spork_public_key: "043969b1b0e6f327de37f297a015d37e2235eaaeeb3933deecd8162c075cee02\
                 07b13537618bde640879606001a8136091c62ec272dd0133424a178704e6e75bb7",

            activation: ActivationHeights {
                last_pow: Height(250),
                // Not defined for regtest; the deployed value was kept.
                bip65: Threshold::At(Height(851_019)),
                new_message_signatures: Threshold::At(Height(1)),
                stake_modifier_new_selection: Threshold::At(Height(0)),
                stake_modifier_v2: Threshold::At(Height(251)),
                time_protocol_v2: Threshold::At(Height(999_999_999)),
                zerocoin: Threshold::At(Height(300)),
                zerocoin_public_spends: Threshold::At(Height(400)),
                zerocoin_serial_range_check: Threshold::At(Height(300)),
                zerocoin_serials_v2: Threshold::At(Height(300)),
                last_accumulator_checkpoint: Threshold::At(Height(310)),
            },
            zerocoin: ZerocoinParameters {
                max_spends_per_transaction: 7,
                max_public_spends_per_transaction: 637,
                min_mint_confirmations: 10,
                min_mint_fee: mint_fee(),
                min_stake_depth: 10,
                start_time: 0,
            },

            magic: magics::REGTEST,
            default_port: Network::Regtest.default_port(),
            address_prefixes: AddressPrefixes {
                public_key: 139,
                script: 19,
                staking: 73,
                secret_key: 239,
                ext_public_key: [0x3a, 0x80, 0x61, 0xa0],
                ext_secret_key: [0x3a, 0x80, 0x58, 0x37],
                ext_coin_type: [0x00, 0x00, 0x00, 0x01],
            },
        }
    }

    /// The unit test network: regtest with every feature era reachable in a
    /// few blocks.
    fn unit_test() -> NetworkParameters {
        NetworkParameters {
            network: Network::UnitTest,
            activation: ActivationHeights {
                last_pow: Height(100),
                bip65: Threshold::At(Height(1)),
                new_message_signatures: Threshold::At(Height(300)),
                stake_modifier_new_selection: Threshold::At(Height(0)),
                stake_modifier_v2: Threshold::At(Height(110)),
                time_protocol_v2: Threshold::At(Height(300)),
                zerocoin: Threshold::At(Height(10)),
                zerocoin_public_spends: Threshold::At(Height(30)),
                zerocoin_serial_range_check: Threshold::At(Height(20)),
                zerocoin_serials_v2: Threshold::At(Height(20)),
                last_accumulator_checkpoint: Threshold::At(Height(200)),
            },
            magic: magics::UNIT_TEST,
            default_port: Network::UnitTest.default_port(),
            ..NetworkParameters::regtest()
        }
    }

    /// Returns true if blocks at `height` may be proof-of-work.
    pub fn pow_allowed(&self, height: Height) -> bool {
        height <= self.activation.last_pow
    }

    /// Returns true if BIP65 is enforced at `height`.
    pub fn bip65_active(&self, height: Height) -> bool {
        self.activation.bip65.active_at(height)
    }

    /// Returns true if blocks and messages at `height` use the explicit-key
    /// signature scheme.
    pub fn new_message_signatures_active(&self, height: Height) -> bool {
        self.activation.new_message_signatures.active_at(height)
    }

    /// Returns true if the second time protocol is in effect at `height`.
    pub fn time_protocol_v2_active(&self, height: Height) -> bool {
        self.activation.time_protocol_v2.active_at(height)
    }

    /// Returns true if the zerocoin sub-protocol is enabled at `height`.
    pub fn zerocoin_active(&self, height: Height) -> bool {
        self.activation.zerocoin.active_at(height)
    }

    /// Returns true if zerocoin public spends are allowed at `height`.
    pub fn zerocoin_public_spends_active(&self, height: Height) -> bool {
        self.activation.zerocoin_public_spends.active_at(height)
    }

    /// Returns true if zerocoin serial numbers are range-checked at
    /// `height`.
    pub fn zerocoin_serial_range_check_active(&self, height: Height) -> bool {
        self.activation.zerocoin_serial_range_check.active_at(height)
    }

    /// Returns true if version 2 (marked) serial numbers are required at
    /// `height`.
    pub fn zerocoin_serials_v2_active(&self, height: Height) -> bool {
        self.activation.zerocoin_serials_v2.active_at(height)
    }

    /// Returns true if accumulator checkpoints are retired at `height`.
    ///
    /// Retirement starts on the block *after* the last checkpoint height;
    /// a network with [`Threshold::Never`] keeps checkpoints forever.
    pub fn accumulator_checkpoints_retired(&self, height: Height) -> bool {
        match self.activation.last_accumulator_checkpoint {
            Threshold::At(last) => height > last,
            Threshold::Never => false,
        }
    }

    /// Returns the stake-modifier era at `height`.
    ///
    /// The era machine has exactly three states; callers must not
    /// interpolate behavior between them.
    pub fn stake_modifier_era(&self, height: Height) -> StakeModifierEra {
        if self.activation.stake_modifier_v2.active_at(height) {
            StakeModifierEra::V2
        } else if self
            .activation
            .stake_modifier_new_selection
            .active_at(height)
        {
            StakeModifierEra::NewSelectionTransition
        } else {
            StakeModifierEra::Legacy
        }
    }

    /// The minimum age of a staked output.
    pub fn stake_min_age(&self) -> Duration {
        Duration::seconds(self.stake_min_age_seconds)
    }

    /// The allowed future drift of a block time at `height`.
    pub fn future_time_drift(&self, height: Height) -> Duration {
        if self.pow_allowed(height) {
            Duration::seconds(self.future_time_drift_pow_seconds)
        } else {
            Duration::seconds(self.future_time_drift_pos_seconds)
        }
    }

    /// The difficulty retarget timespan at `height`.
    pub fn target_timespan(&self, height: Height) -> Duration {
        if self.time_protocol_v2_active(height) {
            Duration::seconds(self.target_timespan_v2_seconds)
        } else {
            Duration::seconds(self.target_timespan_seconds)
        }
    }

    /// The target block spacing.
    pub fn target_spacing(&self) -> Duration {
        Duration::seconds(self.target_spacing_seconds)
    }

    /// The block-time slot length under the second time protocol.
    pub fn time_slot_length(&self) -> Duration {
        Duration::seconds(self.time_slot_seconds)
    }

    /// The minimum age of a proposal before it enters a budget.
    pub fn proposal_establishment_time(&self) -> Duration {
        Duration::seconds(self.proposal_establishment_seconds)
    }
}

impl Network {
    /// Returns the validated parameter set for this network.
    ///
    /// # Panics
    ///
    /// If the hard-coded parameters fail validation. This can only happen
    /// if the parameter tables themselves are edited incorrectly.
    pub fn parameters(&self) -> NetworkParameters {
        NetworkParameters::new(*self).expect("hard-coded network parameters validate")
    }
}

/// The mint fee shared by every network.
fn mint_fee() -> Amount<NonNegative> {
    CENT.try_into().expect("one cent is a valid amount")
}

/// Decode a hard-coded 32-byte hex constant.
fn hash_bytes(hex_str: &str) -> [u8; 32] {
    let mut bytes = [0; 32];
    hex::decode_to_slice(hex_str, &mut bytes[..]).expect("hard-coded hash hex parses");
    bytes
}
