//! Blinded public coins and mint records.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::{
    block::Height,
    serialization::SerializationError,
    transparent::{OpCode, Output, Script},
};

use super::{accumulator_modulus, Denomination};

/// The public half of a zerocoin: the blinded commitment value that is added
/// to the accumulator, plus its denomination.
///
/// The commitment blinds the coin's serial number; nothing in the public
/// coin reveals which spend will later consume it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PublicCoin {
    /// The blinded commitment value.
    pub value: BigUint,
    /// The coin's denomination.
    pub denomination: Denomination,
}

impl PublicCoin {
    /// Returns true if the commitment value is in the accumulator group:
    /// strictly between zero and the modulus.
    pub fn is_valid(&self) -> bool {
        self.value.bits() != 0 && self.value < *accumulator_modulus()
    }

    /// Build the mint output script for this coin: the zerocoin mint marker
    /// opcode followed by the big-endian commitment bytes.
    pub fn mint_script(&self) -> Script {
        Script::marker_with_data(OpCode::ZerocoinMint, &self.value.to_bytes_be())
    }

    /// Parse a public coin from a mint-marked transaction output.
    ///
    /// The denomination is carried by the output value; an output value that
    /// is not exactly a denomination face value is malformed.
    pub fn from_mint_output(output: &Output) -> Result<PublicCoin, SerializationError> {
        let data = output.lock_script.parse_marker_data(OpCode::ZerocoinMint)?;
        if data.is_empty() {
            return Err(SerializationError::Parse("empty mint commitment value"));
        }

        let denomination = Denomination::from_amount(output.value).ok_or(
            SerializationError::Parse("mint output value is not a zerocoin denomination"),
        )?;

        Ok(PublicCoin {
            value: BigUint::from_bytes_be(data),
            denomination,
        })
    }
}

/// A mint recorded on-chain: a public coin plus where and how it entered the
/// chain.
///
/// Never mutated after creation; consumed only by reads (supply accounting
/// and spend matching).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ZerocoinMint {
    /// The coin's denomination.
    pub denomination: Denomination,
    /// The blinded commitment value.
    pub value: BigUint,
    /// The height of the block that contains the mint.
    pub height: Height,
    /// Whether the commitment value passed validation.
    ///
    /// Historical tolerant behavior keeps structurally parseable mints with
    /// out-of-group values in the list, flagged invalid, instead of
    /// rejecting the block that carries them.
    pub is_valid: bool,
}

impl ZerocoinMint {
    /// Record a mint for `coin` observed at `height`.
    pub fn from_coin(coin: PublicCoin, height: Height) -> ZerocoinMint {
        let is_valid = coin.is_valid();
        ZerocoinMint {
            denomination: coin.denomination,
            value: coin.value,
            height,
            is_valid,
        }
    }
}
