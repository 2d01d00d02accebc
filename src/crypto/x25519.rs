// SPDX-License-Identifier: MIT OR Apache-2.0

//! X25519 elliptic-curve Diffie-Hellman key agreement.
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::ZeroizeOnDrop;

use crate::crypto::Secret;

/// Length of an X25519 secret or public key.
pub const X25519_KEY_SIZE: usize = 32;

/// Length of the shared secret resulting from a Diffie-Hellman exchange.
pub const X25519_SHARED_SECRET_SIZE: usize = 32;

/// X25519 secret key for Diffie-Hellman key agreement.
///
/// Long-term recipient keys live for the lifetime of the certificate; ephemeral keys generated
/// for a single publish operation are dropped (and zeroised) at the end of that operation.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize, ZeroizeOnDrop)]
pub struct SecretKey(#[serde(with = "serde_bytes")] [u8; X25519_KEY_SIZE]);

impl SecretKey {
    pub fn from_bytes(bytes: [u8; X25519_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Derive the public counterpart of this secret key.
    pub fn public_key(&self) -> Result<PublicKey, X25519Error> {
        let secret = x25519_dalek::StaticSecret::from(self.0);
        let public = x25519_dalek::PublicKey::from(&secret);
        Ok(PublicKey(public.to_bytes()))
    }

    /// Compute the Diffie-Hellman shared secret with another party's public key.
    ///
    /// Fails when the exchange lands on a low-order point (contributory behaviour check).
    pub fn calculate_agreement(
        &self,
        their_public_key: &PublicKey,
    ) -> Result<Secret<X25519_SHARED_SECRET_SIZE>, X25519Error> {
        let secret = x25519_dalek::StaticSecret::from(self.0);
        let public = x25519_dalek::PublicKey::from(their_public_key.0);
        let shared = secret.diffie_hellman(&public);
        if !shared.was_contributory() {
            return Err(X25519Error::NonContributory);
        }
        Ok(Secret::from_bytes(shared.to_bytes()))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not reveal secret values when printing debug info.
        f.debug_struct("SecretKey").field("value", &"***").finish()
    }
}

/// X25519 public key.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PublicKey(#[serde(with = "serde_bytes")] [u8; X25519_KEY_SIZE]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; X25519_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; X25519_KEY_SIZE] {
        &self.0
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = X25519Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; X25519_KEY_SIZE] = value
            .try_into()
            .map_err(|_| X25519Error::InvalidLength(value.len()))?;
        Ok(Self(bytes))
    }
}

#[derive(Debug, Error)]
pub enum X25519Error {
    #[error("invalid x25519 key length {0}, expected 32 bytes")]
    InvalidLength(usize),

    #[error("diffie-hellman exchange was not contributory")]
    NonContributory,
}
