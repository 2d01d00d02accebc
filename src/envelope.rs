// SPDX-License-Identifier: MIT OR Apache-2.0

//! Envelope and content of a disclosure record.
//!
//! An [`Envelope`] addresses a record to one long-term identity and transports the single-use
//! key-agreement material; the content is the authenticated-encrypted payload.
//! Date and nonce are duplicated inside the encrypted content purely to bind it to its envelope:
//! after decryption both copies must match exactly, otherwise the record was assembled from parts
//! of different publications.
use base64::prelude::{BASE64_URL_SAFE, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::hkdf::{HkdfError, hkdf_sha256};
use crate::crypto::x25519::{PublicKey, X25519_SHARED_SECRET_SIZE};
use crate::crypto::xchacha20::{
    X_AEAD_NONCE_SIZE, XAeadError, XAeadKey, XAeadNonce, x_aead_decrypt, x_aead_encrypt,
};
use crate::crypto::{Rng, RngError, Secret};
use crate::identity::Sid;
use crate::wire::{WireError, decode_base64, encode_base64};

/// Context label binding derived keys to this protocol. Both publisher and recipient must use the
/// identical label during key derivation.
pub(crate) const CONTEXT_LABEL: &[u8] = b"tipline/envelope/v1";

/// Entropy of the envelope nonce (96 bits).
const ENVELOPE_NONCE_SIZE: usize = 12;

/// Public part of a disclosure record, addressing it to one long-term identity.
///
/// Immutable once created; serialized as JSON and base64-encoded for the wire.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Subject identifier of the _intended recipient_ (not the sender).
    pub sid: Sid,

    /// ISO-8601 UTC timestamp of envelope creation.
    pub date: String,

    /// Random value making this envelope unique.
    pub nonce: String,

    /// Freshly generated, single-use elliptic-curve public key (base64).
    pub ecdhe: String,
}

impl Envelope {
    pub(crate) fn new(sid: Sid, date: String, nonce: String, ephemeral_key: &PublicKey) -> Self {
        Self {
            sid,
            date,
            nonce,
            ecdhe: encode_base64(ephemeral_key.as_bytes()),
        }
    }

    /// Generate a fresh envelope nonce.
    pub(crate) fn random_nonce(rng: &Rng) -> Result<String, RngError> {
        let bytes: [u8; ENVELOPE_NONCE_SIZE] = rng.random_array()?;
        Ok(BASE64_URL_SAFE.encode(bytes))
    }

    /// The single-use public key transported in this envelope.
    pub fn ephemeral_key(&self) -> Result<PublicKey, EnvelopeError> {
        let bytes = decode_base64(&self.ecdhe)?;
        PublicKey::try_from(bytes.as_slice()).map_err(|_| EnvelopeError::InvalidEphemeralKey)
    }

    /// Serialize to the base64-encoded JSON wire form.
    pub fn to_wire(&self) -> Result<String, EnvelopeError> {
        let json = serde_json::to_vec(self).map_err(WireError::from)?;
        Ok(encode_base64(&json))
    }

    /// Decode an envelope from its wire form.
    pub fn from_wire(encoded: &str) -> Result<Self, EnvelopeError> {
        let bytes = decode_base64(encoded)?;
        let envelope = serde_json::from_slice(&bytes).map_err(WireError::from)?;
        Ok(envelope)
    }
}

/// Decrypted content of a record: payload plus the envelope-binding copies of date and nonce.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ContentPlaintext {
    pub date: String,
    pub nonce: String,
    pub payload: String,
}

/// Derive the symmetric content key from an ECDH shared secret under the protocol context label.
pub(crate) fn derive_content_key(
    shared_secret: &Secret<X25519_SHARED_SECRET_SIZE>,
) -> Result<XAeadKey, HkdfError> {
    hkdf_sha256(shared_secret.as_bytes(), CONTEXT_LABEL)
}

/// Authenticated-encrypt the content of a record, copying date and nonce from its envelope.
///
/// Returns the raw content bytes (random AEAD nonce prepended to the ciphertext), ready for
/// base64 framing.
pub(crate) fn seal_content(
    envelope: &Envelope,
    payload: &str,
    key: &XAeadKey,
    rng: &Rng,
) -> Result<Vec<u8>, EnvelopeError> {
    let plaintext = ContentPlaintext {
        date: envelope.date.clone(),
        nonce: envelope.nonce.clone(),
        payload: payload.to_string(),
    };
    let plaintext_bytes = serde_json::to_vec(&plaintext).map_err(WireError::from)?;

    let nonce: XAeadNonce = rng.random_array()?;
    let ciphertext = x_aead_encrypt(&plaintext_bytes, key, nonce)?;

    let mut content = Vec::with_capacity(X_AEAD_NONCE_SIZE + ciphertext.len());
    content.extend_from_slice(&nonce);
    content.extend_from_slice(&ciphertext);
    Ok(content)
}

/// Decrypt and authenticate raw content bytes.
///
/// This only checks the AEAD tag; callers must separately verify the envelope binding via
/// [`verify_binding`].
pub(crate) fn open_content(
    content: &[u8],
    key: &XAeadKey,
) -> Result<ContentPlaintext, EnvelopeError> {
    if content.len() <= X_AEAD_NONCE_SIZE {
        return Err(EnvelopeError::ContentTooShort);
    }
    let (nonce_bytes, ciphertext) = content.split_at(X_AEAD_NONCE_SIZE);
    let nonce: XAeadNonce = nonce_bytes
        .try_into()
        .map_err(|_| EnvelopeError::ContentTooShort)?;
    let plaintext_bytes = x_aead_decrypt(ciphertext, key, nonce)?;
    let plaintext = serde_json::from_slice(&plaintext_bytes).map_err(WireError::from)?;
    Ok(plaintext)
}

/// Check that decrypted content belongs to the given envelope.
///
/// A mismatch after successful decryption indicates deliberate record substitution, never simple
/// misdirection, and must be treated as a fatal integrity violation for the record.
pub fn verify_binding(
    envelope: &Envelope,
    plaintext: &ContentPlaintext,
) -> Result<(), BindingError> {
    if envelope.date != plaintext.date {
        return Err(BindingError::DateMismatch {
            envelope: envelope.date.clone(),
            content: plaintext.date.clone(),
        });
    }
    if envelope.nonce != plaintext.nonce {
        return Err(BindingError::NonceMismatch);
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Rng(#[from] RngError),

    #[error(transparent)]
    XAead(#[from] XAeadError),

    #[error("envelope carries an invalid ephemeral public key")]
    InvalidEphemeralKey,

    #[error("content too short to contain aead nonce and ciphertext")]
    ContentTooShort,
}

/// Envelope/content substitution detected after successful decryption.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("content date {content:?} does not match envelope date {envelope:?}")]
    DateMismatch { envelope: String, content: String },

    #[error("content nonce does not match envelope nonce")]
    NonceMismatch,
}

#[cfg(test)]
mod tests {
    use crate::crypto::x25519::SecretKey;
    use crate::crypto::{Rng, Secret};
    use crate::identity::Sid;

    use super::{
        BindingError, Envelope, derive_content_key, open_content, seal_content, verify_binding,
    };

    fn test_envelope(rng: &Rng) -> Envelope {
        let ephemeral = SecretKey::from_bytes(rng.random_array().unwrap());
        Envelope::new(
            Sid::from_parts("CN=b", "CN=ca"),
            "2026-08-30T12:00:00Z".to_string(),
            Envelope::random_nonce(rng).unwrap(),
            &ephemeral.public_key().unwrap(),
        )
    }

    #[test]
    fn wire_round_trip() {
        let rng = Rng::from_seed([1; 32]);
        let envelope = test_envelope(&rng);
        let wire = envelope.to_wire().unwrap();
        assert_eq!(Envelope::from_wire(&wire).unwrap(), envelope);
    }

    #[test]
    fn content_binds_to_envelope() {
        let rng = Rng::from_seed([2; 32]);
        let envelope = test_envelope(&rng);
        let key = derive_content_key(&Secret::from_bytes(rng.random_array().unwrap())).unwrap();

        let content = seal_content(&envelope, "leaked information", &key, &rng).unwrap();
        let plaintext = open_content(&content, &key).unwrap();

        assert_eq!(plaintext.payload, "leaked information");
        assert!(verify_binding(&envelope, &plaintext).is_ok());

        // Content decrypted against a different envelope is a substitution attack.
        let other_envelope = test_envelope(&rng);
        assert!(matches!(
            verify_binding(&other_envelope, &plaintext),
            Err(BindingError::DateMismatch { .. }) | Err(BindingError::NonceMismatch)
        ));
    }
}
