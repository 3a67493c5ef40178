//! Stake-block signature creation and verification.
//!
//! Each proof-of-stake block is signed by the private key of the staked
//! output: the key material is recoverable from the second output of the
//! coinstake transaction. Two signature eras exist, selected by the
//! new-message-signatures activation height:
//!
//! - **Legacy**: the block carries a recoverable compact signature over the
//!   block hash; verification recovers the public key from the signature
//!   and matches it against the key or key-hash in the stake output script.
//! - **V2**: the stake output script must encode the public key explicitly,
//!   and the block carries a plain compact signature checked against it.
//!
//! Both eras are implemented side by side and dispatched by a tagged
//! [`SignatureEra`]; callers must route only proof-of-stake blocks here.


use tracing::debug;

use oasis_chain::{
    block::{Block, Height, Signature},
    keys::{self, KeyId, KeyStore, PublicKey, SecretKey},
    parameters::NetworkParameters,
    transparent::Script,
};

use crate::error::SignatureError;

/// The stake-signature era in force at some height.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SignatureEra {
    /// Recoverable signatures; no explicit key in the block.
    Legacy,
    /// Plain signatures against the key encoded in the stake output script.
    V2,
}

impl SignatureEra {
    /// Resolve the era for a block at `height`.
    pub fn for_height(parameters: &NetworkParameters, height: Height) -> SignatureEra {
        if parameters.new_message_signatures_active(height) {
            SignatureEra::V2
        } else {
            SignatureEra::Legacy
        }
    }
}

/// The key id named by a stake output script, for key store lookups.
fn script_key_id(script: &Script) -> Option<KeyId> {
    if let Some(key) = script.pay_to_public_key() {
        Some(KeyId(keys::hash160(key)))
    } else {
        script.pay_to_public_key_hash().map(KeyId)
    }
}

/// Check that `key` is the key the stake output script commits to.
fn key_matches_script(
    script: &Script,
    key: &SecretKey,
    era: SignatureEra,
) -> Result<(), SignatureError> {
    let public = PublicKey::from_secret_key(key);

    if let Some(script_key) = script.pay_to_public_key() {
        if script_key == public.serialize() {
            return Ok(());
        }
        return Err(SignatureError::KeyMismatch);
    }

    if let Some(script_hash) = script.pay_to_public_key_hash() {
        // The V2 scheme verifies against an explicit key, so a key-hash
        // script cannot be signed for in that era.
        if era == SignatureEra::V2 {
            return Err(SignatureError::UnsupportedScript);
        }
        if script_hash == public.key_id().0 {
            return Ok(());
        }
        return Err(SignatureError::KeyMismatch);
    }

    Err(SignatureError::UnsupportedScript)
}

/// Sign a proof-of-stake block with the staking key.
///
/// The era is selected by the block's declared `height`. Fails with
/// [`SignatureError::KeyMismatch`] if `key` does not correspond to the
/// stake output's script.
pub fn sign_block_with_key(
    parameters: &NetworkParameters,
    block: &mut Block,
    height: Height,
    key: &SecretKey,
) -> Result<(), SignatureError> {
    let era = SignatureEra::for_height(parameters, height);

    let stake_script = block
        .stake_output()
        .ok_or(SignatureError::MissingStakeOutput)?
        .lock_script
        .clone();
    key_matches_script(&stake_script, key, era)?;

    let digest = block.hash().0;
    block.signature = match era {
        SignatureEra::Legacy => Signature(keys::sign_recoverable(digest, key).to_vec()),
        SignatureEra::V2 => Signature(keys::sign_compact(digest, key).to_vec()),
    };

    Ok(())
}

/// Sign a proof-of-stake block, looking the staking key up in `key_store`.
pub fn sign_block(
    parameters: &NetworkParameters,
    block: &mut Block,
    height: Height,
    key_store: &impl KeyStore,
) -> Result<(), SignatureError> {
    let key_id = {
        let stake_output = block
            .stake_output()
            .ok_or(SignatureError::MissingStakeOutput)?;
        script_key_id(&stake_output.lock_script).ok_or(SignatureError::UnsupportedScript)?
    };

    let key = key_store
        .get_key(&key_id)
        .ok_or(SignatureError::KeyNotFound)?;

    sign_block_with_key(parameters, block, height, &key)
}

/// Verify the stake signature attached to a proof-of-stake block.
///
/// This is a consensus-path predicate: any malformed signature, missing
/// stake output, or key mismatch yields `false`, never a panic or an
/// error. Proof-of-work blocks must not be routed here; they yield `false`.
pub fn check_block_signature(
    parameters: &NetworkParameters,
    block: &Block,
    height: Height,
) -> bool {
    let stake_output = match block.stake_output() {
        Some(output) => output,
        None => {
            debug!(?height, "block has no stake output to verify");
            return false;
        }
    };
    let script = &stake_output.lock_script;

    if block.signature.is_empty() {
        return false;
    }
    let digest = block.hash().0;

    match SignatureEra::for_height(parameters, height) {
        SignatureEra::Legacy => {
            let recovered = match keys::recover(digest, block.signature.as_bytes()) {
                Some(recovered) => recovered,
                None => return false,
            };

            if let Some(script_key) = script.pay_to_public_key() {
                script_key == recovered.serialize()
            } else if let Some(script_hash) = script.pay_to_public_key_hash() {
                script_hash == recovered.key_id().0
            } else {
                false
            }
        }
        SignatureEra::V2 => {
            let script_key = match script.pay_to_public_key() {
                Some(script_key) => script_key,
                None => return false,
            };
            let public = match PublicKey::from_slice(script_key) {
                Some(public) => public,
                None => return false,
            };
            public.verify(digest, block.signature.as_bytes())
        }
    }
}
