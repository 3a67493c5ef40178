//! The zerocoin ledger: mint/spend extraction and aggregate supply
//! accounting.
//!
//! Mints and spends ride inside ordinary blocks; this module scans blocks
//! for them, maintains the per-denomination outstanding supply
//! (`outstanding = mints - spends`), and can rebuild that supply from any
//! height by replaying the chain. Extraction is *tolerant* by historical
//! necessity: malformed mint commitments are filtered (and logged) rather
//! than rejecting the block that carries them, until the serial-range-check
//! activation switches extraction to strict mode.
//!
//! The zero-knowledge spend proofs themselves are verified by the external
//! accumulator proof verifier; this module only enforces structural
//! well-formedness.

#[cfg(test)]
mod tests;

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use oasis_chain::{
    amount::{self, Amount, NonNegative, COIN},
    block::{Block, Height},
    parameters::NetworkParameters,
    shutdown::is_shutting_down,
    transaction,
    transparent::{Input, Output},
    zerocoin::{CoinSpend, Denomination, PublicCoin, SpendKind, ZerocoinMint},
};

use crate::error::{BlockError, SupplyError, ZerocoinError};

/// How extraction treats malformed mint commitments.
///
/// This is a first-class parameter of the extraction functions, derived
/// from the serial-range-check activation height, never inferred from
/// call-site convention.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MalformedMintPolicy {
    /// Drop malformed mints from the result and log them, mirroring the
    /// tolerant historical behavior.
    Filter,
    /// Reject the whole block on any malformed mint.
    Reject,
}

impl MalformedMintPolicy {
    /// The policy in force at `height`: strict once the serial-range-check
    /// activation is reached, tolerant before it.
    pub fn for_height(parameters: &NetworkParameters, height: Height) -> MalformedMintPolicy {
        if parameters.zerocoin_serial_range_check_active(height) {
            MalformedMintPolicy::Reject
        } else {
            MalformedMintPolicy::Filter
        }
    }
}

/// A zerocoin spend located in a block, with its carrier transaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BlockSpend {
    /// The parsed spend proof.
    pub spend: CoinSpend,
    /// Whether the spend is private or public.
    pub kind: SpendKind,
    /// The hash of the transaction carrying the spend.
    pub tx_hash: transaction::Hash,
}

impl BlockSpend {
    /// The denomination being spent.
    pub fn denomination(&self) -> Denomination {
        self.spend.denomination
    }
}

/// Scan every transaction output in `block` for mint commitments.
///
/// Under [`MalformedMintPolicy::Filter`], outputs that carry the mint
/// marker but fail to parse are dropped with a warning, and parseable
/// commitments with out-of-group values are returned flagged invalid.
/// Under [`MalformedMintPolicy::Reject`], either case fails the block.
pub fn mints_from_block(
    block: &Block,
    height: Height,
    policy: MalformedMintPolicy,
) -> Result<Vec<ZerocoinMint>, ZerocoinError> {
    let mut mints = Vec::new();

    for tx in &block.transactions {
        if !tx.has_zerocoin_mint_outputs() {
            continue;
        }
        for output in tx.outputs.iter().filter(|output| output.is_zerocoin_mint()) {
            match PublicCoin::from_mint_output(output) {
                Ok(coin) => {
                    let mint = ZerocoinMint::from_coin(coin, height);
                    if !mint.is_valid && policy == MalformedMintPolicy::Reject {
                        return Err(ZerocoinError::MintValueOutOfRange);
                    }
                    if !mint.is_valid {
                        warn!(
                            ?height,
                            denomination = %mint.denomination,
                            "filtered mint with out-of-group commitment value",
                        );
                    }
                    mints.push(mint);
                }
                Err(error) => match policy {
                    MalformedMintPolicy::Reject => {
                        return Err(ZerocoinError::MalformedMint(error))
                    }
                    MalformedMintPolicy::Filter => {
                        warn!(?height, %error, "filtered malformed mint commitment");
                    }
                },
            }
        }
    }

    Ok(mints)
}

/// List the commitment values of every well-formed, valid mint of
/// `denomination` in `block`.
///
/// Used by the accumulator (re)building collaborator; always tolerant.
pub fn mint_values_for_denomination(block: &Block, denomination: Denomination) -> Vec<BigUint> {
    let mut values = Vec::new();

    for tx in &block.transactions {
        if !tx.has_zerocoin_mint_outputs() {
            continue;
        }
        for output in tx.outputs.iter().filter(|output| output.is_zerocoin_mint()) {
            if let Ok(coin) = PublicCoin::from_mint_output(output) {
                if coin.denomination == denomination && coin.is_valid() {
                    values.push(coin.value);
                }
            }
        }
    }

    values
}

/// Parse a public coin from a transaction output.
///
/// Only valid once the public-spend activation height is reached; calling
/// this before that height is a caller contract violation and returns
/// [`ZerocoinError::PublicSpendsNotActive`].
pub fn public_coin_from_output(
    parameters: &NetworkParameters,
    height: Height,
    output: &Output,
) -> Result<PublicCoin, ZerocoinError> {
    if !parameters.zerocoin_public_spends_active(height) {
        return Err(ZerocoinError::PublicSpendsNotActive(height));
    }

    PublicCoin::from_mint_output(output).map_err(ZerocoinError::InvalidPublicCoinEncoding)
}

/// Deserialize the spend proof carried by a transaction input.
///
/// Validates structural well-formedness only (denomination in range,
/// serial number correctly sized); the zero-knowledge proof itself is
/// checked by the external proof verifier. Height-gated rules are in
/// [`check_spend`].
pub fn spend_from_input(input: &Input) -> Result<(CoinSpend, SpendKind), ZerocoinError> {
    CoinSpend::from_input(input).map_err(ZerocoinError::MalformedSpend)
}

/// Aggregate every zerocoin spend across the block's transactions.
///
/// With `filter_invalid`, structurally invalid spends are skipped (and
/// logged) rather than propagated; otherwise the first malformed spend
/// fails the scan. Every returned spend has a denomination from the fixed
/// set: that is guaranteed by the structural parse.
pub fn spends_from_block(
    block: &Block,
    filter_invalid: bool,
) -> Result<Vec<BlockSpend>, ZerocoinError> {
    let mut spends = Vec::new();

    for tx in &block.transactions {
        if !tx.has_zerocoin_spend_inputs() && !tx.has_zerocoin_public_spend_inputs() {
            continue;
        }
        let tx_hash = tx.hash();
        for input in tx.inputs.iter().filter(|input| input.is_any_zerocoin_spend()) {
            match spend_from_input(input) {
                Ok((spend, kind)) => spends.push(BlockSpend {
                    spend,
                    kind,
                    tx_hash,
                }),
                Err(error) if filter_invalid => {
                    warn!(%error, "skipped malformed zerocoin spend");
                }
                Err(error) => return Err(error),
            }
        }
    }

    Ok(spends)
}

/// Contextual checks for one spend at one height.
///
/// Structural parsing never sees heights, so the height-gated rules live
/// here: the serial range check and the serial version requirement.
pub fn check_spend(
    parameters: &NetworkParameters,
    height: Height,
    spend: &CoinSpend,
) -> Result<(), ZerocoinError> {
    if !parameters.zerocoin_active(height) {
        return Err(ZerocoinError::NotActive(height));
    }

    if parameters.zerocoin_serial_range_check_active(height) && !spend.serial_in_range() {
        return Err(ZerocoinError::SerialOutOfRange);
    }

    if parameters.zerocoin_serials_v2_active(height) && spend.serial_version() != 2 {
        return Err(ZerocoinError::SerialVersionMismatch {
            found: spend.serial_version(),
            height,
        });
    }

    Ok(())
}

/// Check a transaction's spends against the per-transaction limits.
pub fn check_spend_limits(
    parameters: &NetworkParameters,
    transaction: &transaction::Transaction,
) -> Result<(), ZerocoinError> {
    let private = transaction
        .inputs
        .iter()
        .filter(|input| input.is_zerocoin_spend())
        .count() as u32;
    if private > parameters.zerocoin.max_spends_per_transaction {
        return Err(ZerocoinError::TooManySpends {
            kind: SpendKind::Private,
            limit: parameters.zerocoin.max_spends_per_transaction,
        });
    }

    let public = transaction
        .inputs
        .iter()
        .filter(|input| input.is_zerocoin_public_spend())
        .count() as u32;
    if public > parameters.zerocoin.max_public_spends_per_transaction {
        return Err(ZerocoinError::TooManySpends {
            kind: SpendKind::Public,
            limit: parameters.zerocoin.max_public_spends_per_transaction,
        });
    }

    Ok(())
}

/// The per-denomination outstanding zerocoin supply.
///
/// # Invariants
///
/// Every count is `mints - spends` for its denomination and is never
/// negative. At any height the counter must equal a full replay from
/// genesis; divergence is a consensus bug and fatal (see
/// [`SupplyLedger::check_consistency`]).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ZerocoinSupply(BTreeMap<Denomination, u64>);

impl ZerocoinSupply {
    /// The number of outstanding coins of `denomination`.
    pub fn coins(&self, denomination: Denomination) -> u64 {
        self.0.get(&denomination).copied().unwrap_or(0)
    }

    /// The total outstanding value across all denominations.
    pub fn total_value(&self) -> Result<Amount<NonNegative>, amount::Error> {
        let mut total: i64 = 0;
        for (denomination, count) in &self.0 {
            // Saturate into the amount range; the range check below reports
            // the overflow.
            let value = (denomination.coins() as i64)
                .saturating_mul(*count as i64)
                .saturating_mul(COIN);
            total = total.saturating_add(value);
        }
        total.try_into()
    }

    /// Record one mint of `denomination`.
    fn credit_mint(&mut self, denomination: Denomination) {
        *self.0.entry(denomination).or_insert(0) += 1;
    }

    /// Record one spend of `denomination`.
    fn debit_spend(&mut self, denomination: Denomination) -> Result<(), SupplyError> {
        let count = self.0.entry(denomination).or_insert(0);
        *count = count
            .checked_sub(1)
            .ok_or(SupplyError::NegativeSupply { denomination })?;
        Ok(())
    }
}

/// The zerocoin portion of one block's index entry.
///
/// Owned by the external block-index storage; `apply_block` records the
/// post-block totals here and uses the marker for idempotency during reorg
/// replays.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SupplyEntry {
    /// Set once the block's supply delta has been applied.
    pub applied: bool,
    /// The per-denomination totals after this block.
    pub supply: ZerocoinSupply,
}

/// Read access to the external block index, for supply replays.
///
/// The storage engine is an external collaborator; the ledger only needs
/// blocks by height and mutable access to each height's supply entry.
pub trait ChainReader {
    /// The current chain tip height, or `None` for an empty chain.
    fn tip_height(&self) -> Option<Height>;

    /// The block at `height` on the best chain.
    fn block_at(&self, height: Height) -> Option<Arc<Block>>;

    /// The supply entry for the block at `height`.
    fn entry_at(&mut self, height: Height) -> Option<&mut SupplyEntry>;
}

/// The outcome of a supply recompute.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RecomputeOutcome {
    /// The replay reached the chain tip.
    Completed {
        /// The tip height that was reached.
        tip: Height,
    },
    /// The replay was interrupted by shutdown at a block boundary.
    ///
    /// The counter holds a valid prefix state; resume from `resume`.
    Interrupted {
        /// The first height that was not applied.
        resume: Height,
    },
}

/// The exclusive owner of the running zerocoin supply counter.
///
/// # Concurrency
///
/// All mutations go through one internal lock: concurrent `apply_block`
/// calls, and `apply_block` against a running recompute, are serialized.
/// Each block's delta is applied as a single atomic step, so an interrupted
/// recompute never leaves a block half-applied.
#[derive(Debug, Default)]
pub struct SupplyLedger {
    supply: Mutex<ZerocoinSupply>,
}

impl SupplyLedger {
    /// Create a ledger with a zeroed supply counter.
    pub fn new() -> SupplyLedger {
        SupplyLedger::default()
    }

    /// A snapshot of the current supply counter.
    pub fn supply(&self) -> ZerocoinSupply {
        self.supply.lock().expect("supply lock is never poisoned").clone()
    }

    /// Apply one block's mint and spend deltas to the supply counter, and
    /// record the post-block totals on the block's index entry.
    ///
    /// Idempotent: if `entry.applied` is already set (as happens during
    /// reorg replay), the call is a no-op.
    pub fn apply_block(
        &self,
        parameters: &NetworkParameters,
        height: Height,
        block: &Block,
        entry: &mut SupplyEntry,
    ) -> Result<(), BlockError> {
        let mut supply = self.supply.lock().expect("supply lock is never poisoned");

        if entry.applied {
            debug!(?height, "skipping already-applied block");
            return Ok(());
        }

        let next = apply_deltas(parameters, height, block, &supply)?;

        *supply = next;
        entry.applied = true;
        entry.supply = supply.clone();
        update_supply_gauges(&supply);

        Ok(())
    }

    /// Rebuild the supply counter by replaying every block from
    /// `start_height` to the current chain tip.
    ///
    /// Used to repair state after an unclean shutdown or a detected
    /// inconsistency. With `skip_zerocoin` the replay is skipped entirely
    /// and the counter is zeroed (for networks or height ranges where the
    /// sub-protocol was never enabled).
    ///
    /// The replay holds the supply lock for its whole duration, checks the
    /// shutdown flag between blocks, and applies each block atomically, so
    /// cancellation always leaves a valid prefix state.
    pub fn recompute_from_height(
        &self,
        parameters: &NetworkParameters,
        chain: &mut dyn ChainReader,
        start_height: Height,
        skip_zerocoin: bool,
    ) -> Result<RecomputeOutcome, BlockError> {
        let mut supply = self.supply.lock().expect("supply lock is never poisoned");

        if skip_zerocoin {
            *supply = ZerocoinSupply::default();
            update_supply_gauges(&supply);
            return Ok(RecomputeOutcome::Completed {
                tip: chain.tip_height().unwrap_or(Height(0)),
            });
        }

        let tip = match chain.tip_height() {
            Some(tip) => tip,
            None => {
                *supply = ZerocoinSupply::default();
                return Ok(RecomputeOutcome::Completed { tip: Height(0) });
            }
        };

        // Seed from the entry below the start, or from zero at genesis.
        *supply = match start_height.previous() {
            Some(seed_height) => chain
                .entry_at(seed_height)
                .ok_or(SupplyError::MissingBlock(seed_height))?
                .supply
                .clone(),
            None => ZerocoinSupply::default(),
        };

        info!(?start_height, ?tip, "recomputing zerocoin supply");

        for height in start_height.0..=tip.0 {
            let height = Height(height);

            if is_shutting_down() {
                info!(resume = ?height, "zerocoin supply recompute interrupted by shutdown");
                return Ok(RecomputeOutcome::Interrupted { resume: height });
            }

            let block = chain
                .block_at(height)
                .ok_or(SupplyError::MissingBlock(height))?;

            let next = apply_deltas(parameters, height, &block, &supply)?;
            *supply = next;

            let entry = chain
                .entry_at(height)
                .ok_or(SupplyError::MissingBlock(height))?;
            entry.applied = true;
            entry.supply = supply.clone();
        }

        update_supply_gauges(&supply);
        info!(?tip, "zerocoin supply recompute complete");

        Ok(RecomputeOutcome::Completed { tip })
    }

    /// Compare the incrementally-maintained counter against a replayed one.
    ///
    /// Divergence indicates a consensus bug: the error is fatal to node
    /// startup, since continuing risks validating against corrupt state.
    pub fn check_consistency(&self, recomputed: &ZerocoinSupply) -> Result<(), SupplyError> {
        let supply = self.supply.lock().expect("supply lock is never poisoned");

        for denomination in Denomination::ALL {
            let incremental = supply.coins(denomination);
            let replayed = recomputed.coins(denomination);
            if incremental != replayed {
                tracing::error!(
                    %denomination,
                    incremental,
                    recomputed = replayed,
                    "zerocoin supply diverges from replay",
                );
                return Err(SupplyError::Inconsistent {
                    denomination,
                    incremental,
                    recomputed: replayed,
                });
            }
        }

        Ok(())
    }
}

/// Compute the supply after applying `block` on top of `supply`.
///
/// Pure: the caller commits the result, keeping each block's application a
/// single atomic step under the ledger lock.
fn apply_deltas(
    parameters: &NetworkParameters,
    height: Height,
    block: &Block,
    supply: &ZerocoinSupply,
) -> Result<ZerocoinSupply, BlockError> {
    let mut next = supply.clone();

    if !parameters.zerocoin_active(height) {
        return Ok(next);
    }

    let policy = MalformedMintPolicy::for_height(parameters, height);
    let mints = mints_from_block(block, height, policy)?;
    // Spend extraction mirrors the tolerant mint behavior before strict
    // mode, so the supply matches what historical nodes accepted.
    let spends = spends_from_block(block, policy == MalformedMintPolicy::Filter)?;

    for mint in mints.iter().filter(|mint| mint.is_valid) {
        next.credit_mint(mint.denomination);
    }
    for spend in &spends {
        next.debit_spend(spend.denomination())
            .map_err(BlockError::Supply)?;
    }

    Ok(next)
}

/// Export the per-denomination counts as gauges.
fn update_supply_gauges(supply: &ZerocoinSupply) {
    for denomination in Denomination::ALL {
        metrics::gauge!("zerocoin.supply.coins", "denomination" => denomination.name())
            .set(supply.coins(denomination) as f64);
    }
}
