use std::{fmt, io};

use serde::{Deserialize, Serialize};

use crate::serialization::{
    OasisDeserialize, OasisSerialize, ReadOasisExt, SerializationError, Sha256dWriter,
};

use super::Header;

/// A SHA-256d hash of a block `Header`.
///
/// This is usually called a 'block hash', as it is frequently used to
/// identify the entire block, since the hash preimage includes the merkle
/// root of the transactions in this block. But _technically_ it is just a
/// hash of the block header, and the stake signature appended to
/// proof-of-stake blocks is not covered by it.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("block::Hash")
            .field(&hex::encode(self.0))
            .finish()
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl<'a> From<&'a Header> for Hash {
    fn from(header: &'a Header) -> Self {
        let mut hash_writer = Sha256dWriter::default();
        header
            .oasis_serialize(&mut hash_writer)
            .expect("Sha256dWriter is infallible");
        Self(hash_writer.finish())
    }
}

impl OasisSerialize for Hash {
    fn oasis_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_all(&self.0)?;
        Ok(())
    }
}

impl OasisDeserialize for Hash {
    fn oasis_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(Hash(reader.read_32_bytes()?))
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
