//! Reading extensions for the oasis consensus formats.

use std::io;

use byteorder::{LittleEndian, ReadBytesExt};

use super::SerializationError;

/// Extends [`io::Read`] with methods for reading oasis consensus encodings.
pub trait ReadOasisExt: io::Read {
    /// Reads a Bitcoin-encoded variable-length integer, rejecting
    /// non-canonical encodings.
    ///
    /// # Consensus
    ///
    /// Accepting a non-minimal encoding would let two different byte strings
    /// deserialize to the same value, which breaks hash-based identity.
    fn read_compactsize(&mut self) -> Result<u64, SerializationError> {
        let flag = self.read_u8()?;
        match flag {
            n @ 0x00..=0xfc => Ok(n as u64),
            0xfd => {
                let n = self.read_u16::<LittleEndian>()?;
                if n < 0xfd {
                    return Err(SerializationError::Parse("non-canonical compactsize"));
                }
                Ok(n as u64)
            }
            0xfe => {
                let n = self.read_u32::<LittleEndian>()?;
                if n < 0x1_0000 {
                    return Err(SerializationError::Parse("non-canonical compactsize"));
                }
                Ok(n as u64)
            }
            0xff => {
                let n = self.read_u64::<LittleEndian>()?;
                if n < 0x1_0000_0000 {
                    return Err(SerializationError::Parse("non-canonical compactsize"));
                }
                Ok(n)
            }
        }
    }

    /// Convenience method to read a `[u8; 32]`.
    fn read_32_bytes(&mut self) -> io::Result<[u8; 32]> {
        let mut bytes = [0; 32];
        self.read_exact(&mut bytes)?;
        Ok(bytes)
    }
}

/// Mark all types implementing `Read` as implementing the extension.
impl<R: io::Read + ?Sized> ReadOasisExt for R {}
