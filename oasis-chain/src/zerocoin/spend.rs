//! Accumulator-based zerocoin spend proofs.

use std::io;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::{
    serialization::{
        OasisDeserialize, OasisSerialize, ReadOasisExt, SerializationError, WriteOasisExt,
    },
    transaction,
    transparent::{Input, OpCode},
};

use super::Denomination;

/// The largest serial number size, in bytes: serials are 256-bit values.
const MAX_SERIAL_BYTES: u64 = 32;

/// How a zerocoin spend reveals itself.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SpendKind {
    /// A private spend: the coin is proven to be in the accumulator without
    /// revealing which mint it was.
    Private,
    /// A public spend: the coin's commitment value is revealed, trading
    /// anonymity for a much cheaper proof.
    Public,
}

/// A deserialized zerocoin spend proof.
///
/// Structural well-formedness (denomination in range, serial number
/// correctly sized) is checked at parse time. The zero-knowledge proof
/// itself is opaque here and verified by the external accumulator proof
/// verifier.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CoinSpend {
    /// The spend format version. Version 2 introduced marked serial numbers.
    pub version: u8,
    /// The denomination being spent.
    pub denomination: Denomination,
    /// The coin's unique serial number, revealed to prevent double spends.
    pub serial_number: BigUint,
    /// A checksum identifying the accumulator value the proof was built
    /// against.
    pub accumulator_checksum: u32,
    /// The hash of the transaction carrying this spend, binding the proof to
    /// its transaction.
    pub tx_hash: transaction::Hash,
    /// The opaque accumulator witness and signature data.
    pub proof: Vec<u8>,
}

impl CoinSpend {
    /// Parse a spend proof from a transaction input, returning the proof and
    /// whether it is a private or public spend.
    ///
    /// The input's unlock script must be a zerocoin spend marker opcode
    /// followed by the serialized proof.
    pub fn from_input(input: &Input) -> Result<(CoinSpend, SpendKind), SerializationError> {
        let raw = input.unlock_script.as_raw_bytes();
        let kind = match raw.first() {
            Some(&op) if op == OpCode::ZerocoinSpend as u8 => SpendKind::Private,
            Some(&op) if op == OpCode::ZerocoinPublicSpend as u8 => SpendKind::Public,
            _ => {
                return Err(SerializationError::Parse(
                    "input does not carry a zerocoin spend",
                ))
            }
        };

        let spend = CoinSpend::oasis_deserialize(&raw[1..])?;
        Ok((spend, kind))
    }

    /// The serial number as 32 big-endian bytes.
    ///
    /// Out-of-range serials (over 256 bits) keep only their low 256 bits
    /// here; use [`CoinSpend::serial_in_range`] to detect them.
    pub fn serial_bytes(&self) -> [u8; 32] {
        let raw = self.serial_number.to_bytes_be();
        let mut bytes = [0u8; 32];
        if raw.len() >= 32 {
            bytes.copy_from_slice(&raw[raw.len() - 32..]);
        } else {
            bytes[32 - raw.len()..].copy_from_slice(&raw);
        }
        bytes
    }

    /// The serial format version implied by the serial number itself.
    ///
    /// Version 2 serials carry an `0xF` marker in the top nibble; everything
    /// else is a version 1 serial.
    pub fn serial_version(&self) -> u8 {
        if self.serial_bytes()[0] & 0xf0 == 0xf0 {
            2
        } else {
            1
        }
    }

    /// Returns true if the serial number is in the valid range: non-zero and
    /// at most 256 bits.
    ///
    /// # Consensus
    ///
    /// Until the serial-range-check activation height this is not enforced;
    /// the historical exploit used serials outside this range.
    pub fn serial_in_range(&self) -> bool {
        self.serial_number.bits() != 0 && self.serial_number.bits() <= 256
    }
}

impl OasisSerialize for CoinSpend {
    fn oasis_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_u8(self.version)?;
        writer.write_u32::<LittleEndian>(self.denomination.coins() as u32)?;
        let serial = self.serial_number.to_bytes_be();
        writer.write_compactsize(serial.len() as u64)?;
        writer.write_all(&serial)?;
        writer.write_u32::<LittleEndian>(self.accumulator_checksum)?;
        writer.write_all(&self.tx_hash.0)?;
        self.proof.oasis_serialize(&mut writer)?;
        Ok(())
    }
}

impl OasisDeserialize for CoinSpend {
    fn oasis_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let version = reader.read_u8()?;
        if !(1..=2).contains(&version) {
            return Err(SerializationError::Parse("unsupported spend version"));
        }

        let denomination_coins = reader.read_u32::<LittleEndian>()?;
        let denomination = Denomination::from_coins(denomination_coins as u64).ok_or(
            SerializationError::Parse("spend denomination is not a zerocoin denomination"),
        )?;

        let serial_len = reader.read_compactsize()?;
        if serial_len == 0 || serial_len > MAX_SERIAL_BYTES {
            return Err(SerializationError::Parse("serial number is wrongly sized"));
        }
        let mut serial = vec![0u8; serial_len as usize];
        reader.read_exact(&mut serial)?;

        let accumulator_checksum = reader.read_u32::<LittleEndian>()?;
        let tx_hash = transaction::Hash(reader.read_32_bytes()?);
        let proof = Vec::oasis_deserialize(&mut reader)?;

        Ok(CoinSpend {
            version,
            denomination,
            serial_number: BigUint::from_bytes_be(&serial),
            accumulator_checksum,
            tx_hash,
            proof,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::transparent::{OutPoint, Script};

    use super::*;

    fn test_spend() -> CoinSpend {
        CoinSpend {
            version: 1,
            denomination: Denomination::Fifty,
            serial_number: BigUint::from(0xdead_beefu32),
            accumulator_checksum: 0x1122_3344,
            tx_hash: transaction::Hash([0x77; 32]),
            proof: vec![0x0f; 96],
        }
    }

    /// Build a spend-carrying input the way wallets do: marker opcode, then
    /// the serialized proof.
    fn spend_input(spend: &CoinSpend, marker: OpCode) -> Input {
        let mut raw = vec![marker as u8];
        raw.extend(
            spend
                .oasis_serialize_to_vec()
                .expect("serializing a spend to a Vec never fails"),
        );
        Input {
            previous_output: OutPoint::null(),
            unlock_script: Script::new(&raw),
            sequence: u32::MAX,
        }
    }

    #[test]
    fn spend_input_roundtrip() {
        let _init_guard = oasis_test::init();

        let spend = test_spend();

        let private = spend_input(&spend, OpCode::ZerocoinSpend);
        let (parsed, kind) = CoinSpend::from_input(&private).expect("well-formed spend parses");
        assert_eq!(parsed, spend);
        assert_eq!(kind, SpendKind::Private);

        let public = spend_input(&spend, OpCode::ZerocoinPublicSpend);
        let (_, kind) = CoinSpend::from_input(&public).expect("well-formed spend parses");
        assert_eq!(kind, SpendKind::Public);
    }

    #[test]
    fn non_spend_input_is_rejected() {
        let _init_guard = oasis_test::init();

        let input = Input {
            previous_output: OutPoint::null(),
            unlock_script: Script::new(&[0x51]),
            sequence: u32::MAX,
        };
        assert!(CoinSpend::from_input(&input).is_err());
    }

    #[test]
    fn bad_denomination_is_rejected() {
        let _init_guard = oasis_test::init();

        let mut bytes = test_spend()
            .oasis_serialize_to_vec()
            .expect("serializing a spend to a Vec never fails");
        // Corrupt the denomination field to 51 coins.
        bytes[1] = 51;
        assert!(CoinSpend::oasis_deserialize(&bytes[..]).is_err());
    }

    #[test]
    fn serial_version_marker() {
        let _init_guard = oasis_test::init();

        let mut spend = test_spend();
        assert_eq!(spend.serial_version(), 1);
        assert!(spend.serial_in_range());

        let mut marked = [0u8; 32];
        marked[0] = 0xf5;
        marked[31] = 0x01;
        spend.serial_number = BigUint::from_bytes_be(&marked);
        assert_eq!(spend.serial_version(), 2);
        assert!(spend.serial_in_range());

        spend.serial_number = BigUint::from(0u8);
        assert!(!spend.serial_in_range());
    }
}
