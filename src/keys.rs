// src/keys.rs
//! Link credentials
//!
//! A drop's access keys are ed25519 pairs encoded as `ed25519:<base58>`. The
//! secret half travels in the fragment of a claim link and never reaches a
//! server. This module parses those strings, derives the public half, builds
//! links and slugs, and hashes claim passwords.
//!
//! Generating a drop's key range is delegated to a [`KeyDeriver`]; the
//! [`EntropyKeyDeriver`] shipped here derives each key from a root entropy
//! string and the key's index.

use crate::error::DropError;
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

pub const ED25519_PREFIX: &str = "ed25519:";

#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey {
    encoded: String,
    seed: [u8; 32],
}

impl SecretKey {
    /// Accepts the key with or without its `ed25519:` prefix. The payload is
    /// either the 64-byte expanded form or a bare 32-byte seed.
    pub fn parse(raw: &str) -> Result<Self, DropError> {
        let body = raw.trim().strip_prefix(ED25519_PREFIX).unwrap_or(raw.trim());
        let bytes = bs58::decode(body)
            .into_vec()
            .map_err(|e| DropError::InvalidKey(e.to_string()))?;
        let seed: [u8; 32] = match bytes.len() {
            32 | 64 => bytes[..32]
                .try_into()
                .map_err(|_| DropError::InvalidKey("bad seed".to_string()))?,
            n => return Err(DropError::InvalidKey(format!("expected 32 or 64 bytes, got {}", n))),
        };
        Ok(Self::from_seed(seed))
    }

    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing = SigningKey::from_bytes(&seed);
        let mut expanded = [0u8; 64];
        expanded[..32].copy_from_slice(&seed);
        expanded[32..].copy_from_slice(signing.verifying_key().as_bytes());
        Self {
            encoded: format!("{}{}", ED25519_PREFIX, bs58::encode(expanded).into_string()),
            seed,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    pub fn without_prefix(&self) -> &str {
        &self.encoded[ED25519_PREFIX.len()..]
    }

    pub fn public_key(&self) -> PublicKey {
        let verifying = SigningKey::from_bytes(&self.seed).verifying_key();
        PublicKey(format!(
            "{}{}",
            ED25519_PREFIX,
            bs58::encode(verifying.as_bytes()).into_string()
        ))
    }

    /// Short display token: characters 8..16 of the full encoded key
    pub fn slug(&self) -> String {
        self.encoded.chars().skip(8).take(8).collect()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey({}…)", self.slug())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(String);

impl PublicKey {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct KeyPair {
    pub public_key: PublicKey,
    pub secret_key: SecretKey,
}

impl From<SecretKey> for KeyPair {
    fn from(secret_key: SecretKey) -> Self {
        Self {
            public_key: secret_key.public_key(),
            secret_key,
        }
    }
}

/// Produces the key pair issued at `index` of a drop.
pub trait KeyDeriver: Send + Sync {
    fn derive(&self, drop_id: &str, index: u64) -> Result<KeyPair, DropError>;

    fn derive_range(&self, drop_id: &str, start: u64, count: u64) -> Result<Vec<KeyPair>, DropError> {
        (start..start + count)
            .map(|index| self.derive(drop_id, index))
            .collect()
    }
}

/// Seeds key `i` of drop `d` with `sha256("{master}-{d}_{i}")`.
pub struct EntropyKeyDeriver {
    master_key: String,
}

impl EntropyKeyDeriver {
    pub fn new(master_key: impl Into<String>) -> Self {
        Self {
            master_key: master_key.into(),
        }
    }
}

impl KeyDeriver for EntropyKeyDeriver {
    fn derive(&self, drop_id: &str, index: u64) -> Result<KeyPair, DropError> {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}-{}_{}", self.master_key, drop_id, index).as_bytes());
        let seed: [u8; 32] = hasher.finalize().into();
        Ok(SecretKey::from_seed(seed).into())
    }
}

/// Shareable claim link; the credential rides in the fragment.
pub fn claim_link(origin: &str, contract_id: &str, secret_key: &SecretKey) -> String {
    format!(
        "{}/claim/{}#{}",
        origin.trim_end_matches('/'),
        contract_id,
        secret_key.without_prefix()
    )
}

/// Lowercase hex sha256 of the input
pub fn hash_password(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// One-time password for the given key use
pub fn claim_password(password: &str, public_key: &PublicKey, cur_key_use: u32) -> String {
    hash_password(&format!("{}{}{}", password, public_key.as_str(), cur_key_use))
}
