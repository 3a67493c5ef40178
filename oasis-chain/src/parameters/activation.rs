//! Height-based feature activations.
//!
//! Each protocol feature turns on at a per-network block height. A feature
//! is active at its threshold height and at every later height; a feature
//! whose threshold is [`Threshold::Never`] is permanently disabled on that
//! network. Thresholds that depend on each other must be ordered, and the
//! ordering is validated when a parameter set is constructed, not assumed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block::Height;

/// An activation threshold: a concrete height, or never.
///
/// # Correctness
///
/// The derived ordering places `Never` above every concrete height, so
/// threshold comparisons treat a disabled feature as activating at
/// infinity.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Threshold {
    /// The feature activates at this height (inclusive).
    At(Height),
    /// The feature never activates on this network.
    Never,
}

impl Threshold {
    /// Returns true if a feature with this threshold is active at `height`.
    ///
    /// Activation is inclusive: a feature is active at exactly its
    /// threshold height.
    pub fn active_at(&self, height: Height) -> bool {
        match self {
            Threshold::At(activation) => height >= *activation,
            Threshold::Never => false,
        }
    }
}

/// The era of the stake-modifier computation at some height.
///
/// The modifier algorithm changed twice, with a short transition window
/// where the new selection rule ran against the old modifier. Callers must
/// treat the three states as distinct; there is no interpolation between
/// them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum StakeModifierEra {
    /// The original modifier and selection rules.
    Legacy,
    /// The new selection rule, still using the version 1 modifier.
    NewSelectionTransition,
    /// The version 2 modifier.
    V2,
}

/// The per-network set of named activation heights.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ActivationHeights {
    /// The last height at which proof-of-work blocks are produced.
    /// Later blocks are proof-of-stake.
    pub last_pow: Height,
    /// BIP65 (`OP_CHECKLOCKTIMEVERIFY`) enforcement.
    pub bip65: Threshold,
    /// The switch from recoverable legacy block/message signatures to
    /// explicit-key signatures.
    pub new_message_signatures: Threshold,
    /// The new stake-selection rule, activated shortly before the version 2
    /// modifier.
    pub stake_modifier_new_selection: Threshold,
    /// The version 2 stake modifier.
    pub stake_modifier_v2: Threshold,
    /// The second time protocol (block-time slots).
    pub time_protocol_v2: Threshold,
    /// The zerocoin sub-protocol.
    pub zerocoin: Threshold,
    /// Zerocoin public spends.
    pub zerocoin_public_spends: Threshold,
    /// The zerocoin serial-number range check.
    pub zerocoin_serial_range_check: Threshold,
    /// Version 2 (marked) zerocoin serial numbers.
    pub zerocoin_serials_v2: Threshold,
    /// The last height carrying a zerocoin accumulator checkpoint.
    ///
    /// Unlike the other thresholds this one marks an end: checkpoints are
    /// retired *after* it.
    pub last_accumulator_checkpoint: Threshold,
}

impl ActivationHeights {
    /// Check the ordering invariants between dependent thresholds.
    ///
    /// A sub-feature must never activate below its prerequisite. Violations
    /// are construction-time errors: a parameter set that fails this check
    /// must never be used for validation.
    pub fn validate(&self) -> Result<(), ParameterError> {
        let ordered: [(&'static str, Threshold, &'static str, Threshold); 4] = [
            (
                "stake modifier v2",
                self.stake_modifier_v2,
                "stake modifier new selection",
                self.stake_modifier_new_selection,
            ),
            (
                "zerocoin public spends",
                self.zerocoin_public_spends,
                "zerocoin",
                self.zerocoin,
            ),
            (
                "zerocoin serial range check",
                self.zerocoin_serial_range_check,
                "zerocoin",
                self.zerocoin,
            ),
            (
                "zerocoin serials v2",
                self.zerocoin_serials_v2,
                "zerocoin",
                self.zerocoin,
            ),
        ];

        for (feature, threshold, prerequisite, prerequisite_threshold) in ordered {
            if threshold < prerequisite_threshold {
                return Err(ParameterError::NonMonotonicActivation {
                    feature,
                    prerequisite,
                });
            }
        }

        Ok(())
    }
}

/// An error constructing a network parameter set.
///
/// These errors are fatal and non-recoverable: they indicate the hard-coded
/// parameters themselves are wrong.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ParameterError {
    /// A dependent feature is configured to activate below its prerequisite.
    #[error("{feature} is configured to activate before its prerequisite {prerequisite}")]
    NonMonotonicActivation {
        /// The dependent feature.
        feature: &'static str,
        /// The feature it depends on.
        prerequisite: &'static str,
    },
}
