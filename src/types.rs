//! Core value types of the digital cash ledger

use crate::constants::*;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// Transferred amounts and balances
pub type Amount = u64;

/// Hash: base64url text of a digest
///
/// Transaction ids, public key hashes and organization ids all travel as
/// base64url text and are compared as such.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hash(String);

impl Hash {
    /// Wrap already-encoded hash text without checking it
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Field hash: SHA-256 over `len(s) ‖ s` for each string, in order
    pub fn from_strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hasher = Sha256::new();
        for item in items {
            let item = item.as_ref();
            hasher.update(item.len().to_string().as_bytes());
            hasher.update(item.as_bytes());
        }
        Self(encode_base64url(&hasher.finalize()))
    }

    /// Public key hash: leading 20 bytes of SHA-256 over the raw key
    pub fn of_public_key(public_key: &PublicKey) -> Self {
        let digest = Sha256::digest(public_key.as_bytes());
        Self(encode_base64url(&digest[..PUBLIC_KEY_HASH_LEN]))
    }

    /// The sentinel outpoint hash of coinbase inputs
    pub fn coinbase() -> Self {
        Self(COINBASE_HASH.to_string())
    }

    pub fn is_coinbase(&self) -> bool {
        self.0 == COINBASE_HASH
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Organizations are identified by their (LAO) id hash
pub type OrganizationId = Hash;

/// Public key: raw key bytes, base64url on the wire
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_base64url(text: &str) -> Result<Self, base64::DecodeError> {
        decode_base64url(text).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_base64url(&self) -> String {
        encode_base64url(&self.0)
    }

    /// Hash under which outputs paying this key are locked
    pub fn hash(&self) -> Hash {
        Hash::of_public_key(self)
    }
}

/// Signature: raw signature bytes, base64url on the wire
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_base64url(text: &str) -> Result<Self, base64::DecodeError> {
        decode_base64url(text).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_base64url(&self) -> String {
        encode_base64url(&self.0)
    }
}

macro_rules! base64url_text_impls {
    ($name:ident) => {
        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_base64url())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_base64url())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_base64url())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                Self::from_base64url(&text).map_err(serde::de::Error::custom)
            }
        }
    };
}

base64url_text_impls!(PublicKey);
base64url_text_impls!(Signature);

pub fn encode_base64url(bytes: &[u8]) -> String {
    URL_SAFE.encode(bytes)
}

pub fn decode_base64url(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE.decode(text)
}
