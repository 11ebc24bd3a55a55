//! P2PKH scripts and the signing primitives behind them
//!
//! An output is locked to the hash of a public key; an input unlocks it by
//! presenting that public key together with a signature over the transaction's
//! signing string (see [`crate::transaction::signing_string`]). Keys are the
//! 32-byte Ed25519 keys members receive at roll call, and signatures are the
//! 64-byte Ed25519 signatures over the raw bytes of the signing string.

use crate::error::{CashError, Result};
use crate::types::*;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Script format tag. Only pay-to-public-key-hash exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptType {
    #[default]
    #[serde(rename = "P2PKH")]
    P2pkh,
}

impl ScriptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptType::P2pkh => crate::constants::SCRIPT_TYPE,
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Script carried by an input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockingScript {
    #[serde(rename = "type")]
    pub script_type: ScriptType,
    pub public_key: PublicKey,
    pub signature: Signature,
}

/// Script carried by an output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockingScript {
    #[serde(rename = "type")]
    pub script_type: ScriptType,
    pub public_key_hash: Hash,
}

impl LockingScript {
    /// Lock to the hash of `public_key`
    pub fn pay_to(public_key: &PublicKey) -> Self {
        Self {
            script_type: ScriptType::P2pkh,
            public_key_hash: public_key.hash(),
        }
    }

    /// Whether `public_key` is the one this script is locked to
    pub fn is_unlocked_by(&self, public_key: &PublicKey) -> bool {
        self.public_key_hash == public_key.hash()
    }
}

/// An Ed25519 signing key together with its public key
#[derive(Clone)]
pub struct KeyPair {
    signing: SigningKey,
    public: PublicKey,
}

impl KeyPair {
    /// Build from a 32-byte Ed25519 secret seed
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        let seed: [u8; SECRET_KEY_LEN] = bytes.try_into().map_err(|_| {
            CashError::InvalidKey(format!(
                "Secret key must be {} bytes, got {}",
                SECRET_KEY_LEN,
                bytes.len()
            ))
        })?;
        let signing = SigningKey::from_bytes(&seed);
        let public = PublicKey::from_bytes(signing.verifying_key().to_bytes().to_vec());

        Ok(Self { signing, public })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Sign `message` as-is
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::from_bytes(self.signing.sign(message).to_bytes().to_vec())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

const SECRET_KEY_LEN: usize = 32;

/// Verify an Ed25519 signature over `message`
///
/// Keys or signatures of the wrong length verify as `false`.
pub fn verify_signature(public_key: &PublicKey, signature: &Signature, message: &[u8]) -> bool {
    let key_bytes: [u8; 32] = match public_key.as_bytes().try_into() {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let verifying_key = match VerifyingKey::from_bytes(&key_bytes) {
        Ok(key) => key,
        Err(_) => return false,
    };

    let signature = match ed25519_dalek::Signature::from_slice(signature.as_bytes()) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    verifying_key.verify(message, &signature).is_ok()
}

/// Check that an unlocking script carries a valid signature over `message`
pub fn verify_unlocking_script(script: &UnlockingScript, message: &[u8]) -> bool {
    verify_signature(&script.public_key, &script.signature, message)
}
