//! Bitcoin-inherited script for oasis.

use std::{fmt, io};

use serde::{Deserialize, Serialize};

use crate::serialization::{OasisDeserialize, OasisSerialize, SerializationError};

use super::opcodes::OpCode;

/// An encoding of a Bitcoin script.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, Hash)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Script(Vec<u8>);

impl Script {
    /// Create a new Bitcoin script from its raw bytes.
    /// The raw bytes must not contain the length prefix.
    pub fn new(raw_bytes: &[u8]) -> Self {
        Script(raw_bytes.to_vec())
    }

    /// Return the raw bytes of the script without the length prefix.
    ///
    /// # Correctness
    ///
    /// These raw bytes do not have a length prefix.
    /// The oasis serialization format requires a length prefix; use
    /// `oasis_serialize` and `oasis_deserialize` to create byte data with a
    /// length prefix.
    pub fn as_raw_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Return the first byte of the script, if any.
    ///
    /// Marker-prefixed scripts (zerocoin mints and spends) are recognized by
    /// their first opcode.
    pub fn first_opcode(&self) -> Option<u8> {
        self.0.first().copied()
    }

    /// Create a script consisting of a marker opcode followed by a single
    /// data push.
    ///
    /// This is the layout of zerocoin mint outputs.
    pub fn marker_with_data(marker: OpCode, data: &[u8]) -> Self {
        let mut raw = vec![marker as u8];
        append_data_push(&mut raw, data);
        Script(raw)
    }

    /// Parse a script created by [`Script::marker_with_data`], returning the
    /// pushed data.
    pub fn parse_marker_data(&self, marker: OpCode) -> Result<&[u8], SerializationError> {
        let raw = &self.0;
        if raw.first() != Some(&(marker as u8)) {
            return Err(SerializationError::Parse("missing script marker opcode"));
        }
        let (data, rest) = read_data_push(&raw[1..])?;
        if !rest.is_empty() {
            return Err(SerializationError::Parse(
                "trailing bytes after script data push",
            ));
        }
        Ok(data)
    }

    /// Create a pay-to-public-key script: `<key> OP_CHECKSIG`.
    pub fn new_pay_to_public_key(key: &[u8]) -> Self {
        let mut raw = Vec::with_capacity(key.len() + 2);
        append_data_push(&mut raw, key);
        raw.push(OpCode::CheckSig as u8);
        Script(raw)
    }

    /// Create a pay-to-public-key-hash script:
    /// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`.
    pub fn new_pay_to_public_key_hash(key_hash: [u8; 20]) -> Self {
        let mut raw = Vec::with_capacity(25);
        raw.push(OpCode::Dup as u8);
        raw.push(OpCode::Hash160 as u8);
        raw.push(OpCode::Push20Bytes as u8);
        raw.extend_from_slice(&key_hash);
        raw.push(OpCode::EqualVerify as u8);
        raw.push(OpCode::CheckSig as u8);
        Script(raw)
    }

    /// If this is a pay-to-public-key script, return the encoded public key.
    pub fn pay_to_public_key(&self) -> Option<&[u8]> {
        let (data, rest) = read_data_push(&self.0).ok()?;
        if rest == [OpCode::CheckSig as u8] && (data.len() == 33 || data.len() == 65) {
            Some(data)
        } else {
            None
        }
    }

    /// If this is a pay-to-public-key-hash script, return the 20-byte key
    /// hash.
    pub fn pay_to_public_key_hash(&self) -> Option<[u8; 20]> {
        let raw = &self.0;
        if raw.len() == 25
            && raw[0] == OpCode::Dup as u8
            && raw[1] == OpCode::Hash160 as u8
            && raw[2] == OpCode::Push20Bytes as u8
            && raw[23] == OpCode::EqualVerify as u8
            && raw[24] == OpCode::CheckSig as u8
        {
            let mut hash = [0; 20];
            hash.copy_from_slice(&raw[3..23]);
            Some(hash)
        } else {
            None
        }
    }
}

/// Append a minimally-encoded data push to `raw`.
pub(crate) fn append_data_push(raw: &mut Vec<u8>, data: &[u8]) {
    match data.len() {
        0..=0x4b => raw.push(data.len() as u8),
        0x4c..=0xff => {
            raw.push(OpCode::PushData1 as u8);
            raw.push(data.len() as u8);
        }
        0x100..=0xffff => {
            raw.push(OpCode::PushData2 as u8);
            raw.extend_from_slice(&(data.len() as u16).to_le_bytes());
        }
        _ => unreachable!("script data pushes are always under 64 kB"),
    }
    raw.extend_from_slice(data);
}

/// Read a single data push from the front of `bytes`, returning the pushed
/// data and the remaining bytes.
pub(crate) fn read_data_push(bytes: &[u8]) -> Result<(&[u8], &[u8]), SerializationError> {
    let (len, data_start) = match bytes.first() {
        Some(&n) if n <= 0x4b => (n as usize, 1),
        Some(&n) if n == OpCode::PushData1 as u8 => {
            let len = *bytes
                .get(1)
                .ok_or(SerializationError::Parse("truncated script data push"))?;
            (len as usize, 2)
        }
        Some(&n) if n == OpCode::PushData2 as u8 => {
            let len_bytes: [u8; 2] = bytes
                .get(1..3)
                .ok_or(SerializationError::Parse("truncated script data push"))?
                .try_into()
                .expect("slice of length 2 converts to an array");
            (u16::from_le_bytes(len_bytes) as usize, 3)
        }
        _ => return Err(SerializationError::Parse("expected a script data push")),
    };

    let data_end = data_start + len;
    if bytes.len() < data_end {
        return Err(SerializationError::Parse("truncated script data push"));
    }
    Ok((&bytes[data_start..data_end], &bytes[data_end..]))
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Script")
            .field(&hex::encode(&self.0))
            .finish()
    }
}

impl OasisSerialize for Script {
    fn oasis_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        self.0.oasis_serialize(&mut writer)
    }
}

impl OasisDeserialize for Script {
    fn oasis_deserialize<R: io::Read>(reader: R) -> Result<Self, SerializationError> {
        Ok(Script(Vec::oasis_deserialize(reader)?))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn pay_to_public_key_roundtrip() {
        let _init_guard = oasis_test::init();

        let key = [0x02; 33];
        let script = Script::new_pay_to_public_key(&key);
        assert_eq!(script.pay_to_public_key(), Some(&key[..]));
        assert_eq!(script.pay_to_public_key_hash(), None);
    }

    #[test]
    fn pay_to_public_key_hash_roundtrip() {
        let _init_guard = oasis_test::init();

        let hash = [0xab; 20];
        let script = Script::new_pay_to_public_key_hash(hash);
        assert_eq!(script.pay_to_public_key_hash(), Some(hash));
        assert_eq!(script.pay_to_public_key(), None);
    }

    #[test]
    fn marker_data_pushes() {
        let _init_guard = oasis_test::init();

        // Small, PUSHDATA1-sized, and PUSHDATA2-sized payloads.
        for len in [1usize, 75, 76, 255, 256, 384] {
            let data = vec![0x5a; len];
            let script = Script::marker_with_data(OpCode::ZerocoinMint, &data);
            let parsed = script
                .parse_marker_data(OpCode::ZerocoinMint)
                .expect("encoded push parses");
            assert_eq!(parsed, &data[..]);
            // The wrong marker is rejected.
            assert!(script.parse_marker_data(OpCode::ZerocoinSpend).is_err());
        }
    }

    proptest! {
        #[test]
        fn script_roundtrip(script in any::<Script>()) {
            let _init_guard = oasis_test::init();

            let mut bytes = Cursor::new(Vec::new());
            script.oasis_serialize(&mut bytes)?;

            bytes.set_position(0);
            let other_script = Script::oasis_deserialize(&mut bytes)?;

            prop_assert_eq![script, other_script];
        }
    }
}
