//! Consensus serialization for block headers and blocks.

use std::{io, sync::Arc};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    serialization::{
        OasisDeserialize, OasisSerialize, ReadOasisExt, SerializationError, WriteOasisExt,
    },
    transaction::Transaction,
};

use super::{merkle, Block, Hash, Header, Signature};

/// The maximum serialized size of a block.
pub const MAX_BLOCK_BYTES: u64 = 2_000_000;

impl OasisSerialize for Header {
    fn oasis_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_i32::<LittleEndian>(self.version)?;
        writer.write_all(&self.previous_block_hash.0)?;
        writer.write_all(&self.merkle_root.0)?;
        writer.write_u32::<LittleEndian>(self.time)?;
        writer.write_u32::<LittleEndian>(self.difficulty_bits)?;
        writer.write_u32::<LittleEndian>(self.nonce)?;
        Ok(())
    }
}

impl OasisDeserialize for Header {
    fn oasis_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(Header {
            version: reader.read_i32::<LittleEndian>()?,
            previous_block_hash: Hash(reader.read_32_bytes()?),
            merkle_root: merkle::Root(reader.read_32_bytes()?),
            time: reader.read_u32::<LittleEndian>()?,
            difficulty_bits: reader.read_u32::<LittleEndian>()?,
            nonce: reader.read_u32::<LittleEndian>()?,
        })
    }
}

impl OasisSerialize for Block {
    fn oasis_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        self.header.oasis_serialize(&mut writer)?;
        writer.write_compactsize(self.transactions.len() as u64)?;
        for transaction in &self.transactions {
            transaction.oasis_serialize(&mut writer)?;
        }
        // An empty signature still takes one length byte, so proof-of-work
        // and proof-of-stake blocks share one layout.
        self.signature.0.oasis_serialize(&mut writer)?;
        Ok(())
    }
}

impl OasisDeserialize for Block {
    fn oasis_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let header = Header::oasis_deserialize(&mut reader)?;

        let transaction_count = reader.read_compactsize()?;
        if transaction_count > MAX_BLOCK_BYTES {
            return Err(SerializationError::Parse(
                "transaction count longer than the maximum block",
            ));
        }
        let mut transactions = Vec::with_capacity(transaction_count.min(1024) as usize);
        for _ in 0..transaction_count {
            transactions.push(Arc::new(Transaction::oasis_deserialize(&mut reader)?));
        }

        let signature = Signature(Vec::oasis_deserialize(&mut reader)?);

        Ok(Block {
            header,
            transactions,
            signature,
        })
    }
}
