//! Zerocoin data structures: denominations, blinded coins, and spend proofs.
//!
//! The zerocoin sub-protocol mints denominated, cryptographically blinded
//! coins into an RSA-modulus accumulator and later spends them with a
//! zero-knowledge membership proof keyed by a unique serial number. This
//! module holds the on-chain encodings; the ledger bookkeeping and the
//! tolerant/strict extraction rules live in `oasis-consensus`.

mod coin;
mod denomination;
mod spend;

pub use coin::{PublicCoin, ZerocoinMint};
pub use denomination::Denomination;
pub use spend::{CoinSpend, SpendKind};

use lazy_static::lazy_static;
use num_bigint::BigUint;

/// The RSA accumulator modulus, as a decimal string.
///
/// Every network uses the same modulus (the RSA-2048 factoring challenge
/// number), so it is a crate constant rather than a per-network parameter.
const ACCUMULATOR_MODULUS_DECIMAL: &str = concat!(
    "25195908475657893494027183240048398571429282126204032027777137836043662020707595556264018525880784",
    "4069182906412495150821892985591491761845028084891200728449926873928072877767359714183472702618963750149718246911",
    "6507761337985909570009733045974880842840179742910064245869181719511874612151517265463228221686998754918242243363",
    "7259085141865462043576798423387184774447920739934236584823824281198163815010674810451660377306056201619676256133",
    "8441436038339044149526344321901146575444541784240209246165157233507787077498171257724679629263863563732899121548",
    "31438167899885040445364023527381951378636564391212010397122822120720357",
);

lazy_static! {
    /// The parsed accumulator modulus.
    static ref ACCUMULATOR_MODULUS: BigUint = BigUint::parse_bytes(
        ACCUMULATOR_MODULUS_DECIMAL.as_bytes(),
        10,
    )
    .expect("hard-coded accumulator modulus parses");
}

/// Returns the RSA accumulator modulus.
pub fn accumulator_modulus() -> &'static BigUint {
    &ACCUMULATOR_MODULUS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_modulus_parses() {
        let _init_guard = oasis_test::init();

        // RSA-2048 is a 2048-bit number.
        assert_eq!(accumulator_modulus().bits(), 2048);
    }
}
