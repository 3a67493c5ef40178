//! Consensus-critical serialization.
//!
//! This module contains the `OasisSerialize` and `OasisDeserialize` traits,
//! analogs of the Serde `Serialize` and `Deserialize` traits but intended for
//! the consensus-critical oasis wire formats, and `WriteOasisExt` and
//! `ReadOasisExt`, extension traits for `io::Read` and `io::Write` with
//! utility functions for reading and writing data (e.g., the Bitcoin
//! variable-integer format).

mod error;
mod read_oasis;
mod sha256d;
mod write_oasis;

pub use error::SerializationError;
pub use read_oasis::ReadOasisExt;
pub use sha256d::Sha256dWriter;
pub use write_oasis::WriteOasisExt;

pub(crate) use sha256d::sha256d;

use std::io;

/// The maximum length of an oasis protocol message or serialized block.
///
/// Attacker-supplied length prefixes are capped at this size before any
/// allocation happens.
pub const MAX_PROTOCOL_MESSAGE_LEN: usize = 2 * 1024 * 1024;

/// Consensus-critical serialization for oasis.
///
/// This trait provides a generic serialization for consensus-critical
/// formats, such as network messages, transactions, and blocks.
pub trait OasisSerialize: Sized {
    /// Write `self` to the given `writer` using the canonical format.
    ///
    /// This function has a `oasis_` prefix to alert the reader that the
    /// serialization in use is consensus-critical serialization, rather than
    /// some other kind of serialization.
    fn oasis_serialize<W: io::Write>(&self, writer: W) -> Result<(), io::Error>;

    /// Helper: serialize `self` into a new byte vector.
    fn oasis_serialize_to_vec(&self) -> Result<Vec<u8>, io::Error> {
        let mut bytes = Vec::new();
        self.oasis_serialize(&mut bytes)?;
        Ok(bytes)
    }
}

/// Consensus-critical deserialization for oasis.
///
/// This trait provides a generic deserialization for consensus-critical
/// formats, such as network messages, transactions, and blocks.
pub trait OasisDeserialize: Sized {
    /// Try to read `self` from the given `reader`.
    fn oasis_deserialize<R: io::Read>(reader: R) -> Result<Self, SerializationError>;
}

impl OasisSerialize for Vec<u8> {
    fn oasis_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_compactsize(self.len() as u64)?;
        writer.write_all(self)?;
        Ok(())
    }
}

impl OasisDeserialize for Vec<u8> {
    fn oasis_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let len = reader.read_compactsize()?;
        if len > MAX_PROTOCOL_MESSAGE_LEN as u64 {
            return Err(SerializationError::Parse(
                "byte vector longer than the maximum protocol message",
            ));
        }
        let mut bytes = vec![0u8; len as usize];
        reader.read_exact(&mut bytes)?;
        Ok(bytes)
    }
}
