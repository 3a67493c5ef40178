//! Transactions and transaction-related structures.

use std::{fmt, io};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::{
    serialization::{
        OasisDeserialize, OasisSerialize, ReadOasisExt, SerializationError, Sha256dWriter,
        WriteOasisExt,
    },
    transparent::{Input, Output},
};

/// An oasis transaction.
///
/// Zerocoin operations ride inside ordinary transactions: mints are outputs
/// with a marker script, spends are inputs whose unlock script carries a
/// serialized proof instead of signatures.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The transaction format version.
    pub version: i32,
    /// The transparent inputs.
    pub inputs: Vec<Input>,
    /// The transparent outputs.
    pub outputs: Vec<Output>,
    /// The earliest time or block height this transaction can be added to the
    /// chain.
    pub lock_time: u32,
}

impl Transaction {
    /// Compute the hash of this transaction.
    pub fn hash(&self) -> Hash {
        Hash::from(self)
    }

    /// Returns true if this is a coinbase transaction: a single input
    /// spending the null outpoint.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1
            && self.inputs[0].previous_output.is_null()
            && !self.inputs[0].is_any_zerocoin_spend()
    }

    /// Returns true if this is a coinstake transaction: at least one input,
    /// and at least two outputs of which the first is empty.
    pub fn is_coinstake(&self) -> bool {
        !self.inputs.is_empty()
            && self.outputs.len() >= 2
            && self.outputs[0].is_empty()
            && !self.is_coinbase()
    }

    /// Returns true if any output carries a zerocoin mint commitment.
    pub fn has_zerocoin_mint_outputs(&self) -> bool {
        self.outputs.iter().any(Output::is_zerocoin_mint)
    }

    /// Returns true if any input carries a private zerocoin spend proof.
    pub fn has_zerocoin_spend_inputs(&self) -> bool {
        self.inputs.iter().any(Input::is_zerocoin_spend)
    }

    /// Returns true if any input carries a public zerocoin spend.
    pub fn has_zerocoin_public_spend_inputs(&self) -> bool {
        self.inputs.iter().any(Input::is_zerocoin_public_spend)
    }

    /// Returns true if this transaction carries any zerocoin data at all.
    pub fn contains_zerocoin(&self) -> bool {
        self.has_zerocoin_mint_outputs()
            || self.has_zerocoin_spend_inputs()
            || self.has_zerocoin_public_spend_inputs()
    }
}

/// A SHA-256d hash of a `Transaction`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("transaction::Hash")
            .field(&hex::encode(self.0))
            .finish()
    }
}

impl<'a> From<&'a Transaction> for Hash {
    fn from(transaction: &'a Transaction) -> Self {
        let mut hash_writer = Sha256dWriter::default();
        transaction
            .oasis_serialize(&mut hash_writer)
            .expect("Sha256dWriter is infallible");
        Self(hash_writer.finish())
    }
}

impl std::str::FromStr for Hash {
    type Err = SerializationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0; 32];
        if hex::decode_to_slice(s, &mut bytes[..]).is_err() {
            Err(SerializationError::Parse("hex decoding error"))
        } else {
            Ok(Hash(bytes))
        }
    }
}

impl OasisSerialize for Transaction {
    fn oasis_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_i32::<LittleEndian>(self.version)?;
        writer.write_compactsize(self.inputs.len() as u64)?;
        for input in &self.inputs {
            input.oasis_serialize(&mut writer)?;
        }
        writer.write_compactsize(self.outputs.len() as u64)?;
        for output in &self.outputs {
            output.oasis_serialize(&mut writer)?;
        }
        writer.write_u32::<LittleEndian>(self.lock_time)?;
        Ok(())
    }
}

impl OasisDeserialize for Transaction {
    fn oasis_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let version = reader.read_i32::<LittleEndian>()?;

        let input_count = reader.read_compactsize()?;
        if input_count > crate::block::MAX_BLOCK_BYTES {
            return Err(SerializationError::Parse(
                "input count longer than the maximum block",
            ));
        }
        let mut inputs = Vec::with_capacity(input_count.min(1024) as usize);
        for _ in 0..input_count {
            inputs.push(Input::oasis_deserialize(&mut reader)?);
        }

        let output_count = reader.read_compactsize()?;
        if output_count > crate::block::MAX_BLOCK_BYTES {
            return Err(SerializationError::Parse(
                "output count longer than the maximum block",
            ));
        }
        let mut outputs = Vec::with_capacity(output_count.min(1024) as usize);
        for _ in 0..output_count {
            outputs.push(Output::oasis_deserialize(&mut reader)?);
        }

        Ok(Transaction {
            version,
            inputs,
            outputs,
            lock_time: reader.read_u32::<LittleEndian>()?,
        })
    }
}
