//! Transparent (Bitcoin-inherited) transaction pieces for oasis.

mod opcodes;
mod script;

pub use opcodes::OpCode;
pub use script::Script;

pub(crate) use script::append_data_push;

use std::io;

use serde::{Deserialize, Serialize};

use crate::{
    amount::{Amount, NonNegative},
    serialization::{OasisDeserialize, OasisSerialize, ReadOasisExt, SerializationError},
    transaction,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// A reference to a previous transaction output.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// The hash of the transaction containing the output.
    pub hash: transaction::Hash,
    /// The index of the output within that transaction.
    pub index: u32,
}

impl OutPoint {
    /// The null outpoint, used by coinbase inputs and zerocoin spends.
    pub fn null() -> OutPoint {
        OutPoint {
            hash: transaction::Hash([0; 32]),
            index: u32::MAX,
        }
    }

    /// Returns true if this is the null outpoint.
    pub fn is_null(&self) -> bool {
        *self == OutPoint::null()
    }
}

/// A transparent transaction input.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Input {
    /// The output being spent, or the null outpoint for coinbase inputs and
    /// zerocoin spends.
    pub previous_output: OutPoint,
    /// The unlocking script.
    ///
    /// For zerocoin spends this carries a marker opcode followed by the
    /// serialized spend proof instead of ordinary script operations.
    pub unlock_script: Script,
    /// The sequence number.
    pub sequence: u32,
}

impl Input {
    /// Returns true if this input carries a private (accumulator-proof)
    /// zerocoin spend.
    pub fn is_zerocoin_spend(&self) -> bool {
        self.unlock_script.first_opcode() == Some(OpCode::ZerocoinSpend as u8)
    }

    /// Returns true if this input carries a public zerocoin spend.
    pub fn is_zerocoin_public_spend(&self) -> bool {
        self.unlock_script.first_opcode() == Some(OpCode::ZerocoinPublicSpend as u8)
    }

    /// Returns true if this input carries any kind of zerocoin spend.
    pub fn is_any_zerocoin_spend(&self) -> bool {
        self.is_zerocoin_spend() || self.is_zerocoin_public_spend()
    }
}

/// A transparent transaction output.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Output {
    /// The value of the output, in satoshis.
    pub value: Amount<NonNegative>,
    /// The locking script.
    pub lock_script: Script,
}

impl Output {
    /// Returns true if this output is empty: zero value and an empty script.
    ///
    /// The first output of a coinstake transaction is empty by construction.
    pub fn is_empty(&self) -> bool {
        self.value == Amount::zero() && self.lock_script.as_raw_bytes().is_empty()
    }

    /// Returns true if this output carries a zerocoin mint commitment.
    pub fn is_zerocoin_mint(&self) -> bool {
        self.lock_script.first_opcode() == Some(OpCode::ZerocoinMint as u8)
    }
}

impl OasisSerialize for OutPoint {
    fn oasis_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_all(&self.hash.0)?;
        writer.write_u32::<LittleEndian>(self.index)?;
        Ok(())
    }
}

impl OasisDeserialize for OutPoint {
    fn oasis_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(OutPoint {
            hash: transaction::Hash(reader.read_32_bytes()?),
            index: reader.read_u32::<LittleEndian>()?,
        })
    }
}

impl OasisSerialize for Input {
    fn oasis_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        self.previous_output.oasis_serialize(&mut writer)?;
        self.unlock_script.oasis_serialize(&mut writer)?;
        writer.write_u32::<LittleEndian>(self.sequence)?;
        Ok(())
    }
}

impl OasisDeserialize for Input {
    fn oasis_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(Input {
            previous_output: OutPoint::oasis_deserialize(&mut reader)?,
            unlock_script: Script::oasis_deserialize(&mut reader)?,
            sequence: reader.read_u32::<LittleEndian>()?,
        })
    }
}

impl OasisSerialize for Output {
    fn oasis_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_i64::<LittleEndian>(self.value.satoshis())?;
        self.lock_script.oasis_serialize(&mut writer)?;
        Ok(())
    }
}

impl OasisDeserialize for Output {
    fn oasis_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let value = reader.read_i64::<LittleEndian>()?;
        Ok(Output {
            value: Amount::try_from(value)?,
            lock_script: Script::oasis_deserialize(&mut reader)?,
        })
    }
}
