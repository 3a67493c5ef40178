//! Script opcodes used by oasis consensus checks.

/// Supported opcodes
///
/// Only the opcodes the consensus core inspects are listed; full script
/// execution is delegated to the script interpreter collaborator.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OpCode {
    // Pushes of more than 75 bytes need an explicit length prefix.
    PushData1 = 0x4c,
    PushData2 = 0x4d,
    // Opcodes used to generate P2SH scripts.
    Equal = 0x87,
    Hash160 = 0xa9,
    Push20Bytes = 0x14,
    // Additional opcodes used to generate P2PKH scripts.
    Dup = 0x76,
    EqualVerify = 0x88,
    CheckSig = 0xac,
    // Zerocoin marker opcodes.
    ZerocoinMint = 0xc1,
    ZerocoinSpend = 0xc2,
    ZerocoinPublicSpend = 0xc3,
}
