// SPDX-License-Identifier: MIT OR Apache-2.0

//! XChaCha20-Poly1305 authenticated encryption (AEAD).
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use thiserror::Error;

use crate::crypto::Secret;

/// 256-bit AEAD key.
pub const X_AEAD_KEY_SIZE: usize = 32;

/// 192-bit nonce, large enough to be chosen at random per message.
pub const X_AEAD_NONCE_SIZE: usize = 24;

pub type XAeadKey = Secret<X_AEAD_KEY_SIZE>;

pub type XAeadNonce = [u8; X_AEAD_NONCE_SIZE];

/// Encrypt and authenticate plaintext under the given key and nonce.
pub fn x_aead_encrypt(
    plaintext: &[u8],
    key: &XAeadKey,
    nonce: XAeadNonce,
) -> Result<Vec<u8>, XAeadError> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let ciphertext = cipher
        .encrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: &[],
            },
        )
        .map_err(|_| XAeadError::EncryptionFailed)?;
    Ok(ciphertext)
}

/// Decrypt and verify ciphertext under the given key and nonce.
///
/// Fails when the ciphertext was altered or a different key was used; the Poly1305 tag is the
/// authoritative integrity check.
pub fn x_aead_decrypt(
    ciphertext: &[u8],
    key: &XAeadKey,
    nonce: XAeadNonce,
) -> Result<Vec<u8>, XAeadError> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let plaintext = cipher
        .decrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: ciphertext,
                aad: &[],
            },
        )
        .map_err(|_| XAeadError::DecryptionFailed)?;
    Ok(plaintext)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum XAeadError {
    #[error("aead encryption failed")]
    EncryptionFailed,

    #[error("aead decryption failed, ciphertext altered or wrong key")]
    DecryptionFailed,
}

#[cfg(test)]
mod tests {
    use crate::crypto::{Rng, Secret};

    use super::{XAeadError, x_aead_decrypt, x_aead_encrypt};

    #[test]
    fn encrypt_decrypt() {
        let rng = Rng::from_seed([1; 32]);
        let key = Secret::from_bytes(rng.random_array().unwrap());
        let nonce = rng.random_array().unwrap();

        let ciphertext = x_aead_encrypt(b"secret message", &key, nonce).unwrap();
        assert_eq!(
            x_aead_decrypt(&ciphertext, &key, nonce).unwrap(),
            b"secret message"
        );
    }

    #[test]
    fn detect_wrong_key_and_tampering() {
        let rng = Rng::from_seed([2; 32]);
        let key = Secret::from_bytes(rng.random_array().unwrap());
        let wrong_key = Secret::from_bytes(rng.random_array().unwrap());
        let nonce = rng.random_array().unwrap();

        let mut ciphertext = x_aead_encrypt(b"secret message", &key, nonce).unwrap();

        assert_eq!(
            x_aead_decrypt(&ciphertext, &wrong_key, nonce),
            Err(XAeadError::DecryptionFailed)
        );

        ciphertext[0] ^= 1;
        assert_eq!(
            x_aead_decrypt(&ciphertext, &key, nonce),
            Err(XAeadError::DecryptionFailed)
        );
    }
}
