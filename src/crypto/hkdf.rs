// SPDX-License-Identifier: MIT OR Apache-2.0

//! HKDF key derivation (SHA256-based) binding shared secrets to a protocol context label.
use hkdf::Hkdf;
use sha2::Sha256;
use thiserror::Error;

use crate::crypto::Secret;

/// Derive a fixed-length symmetric key from input key material under a context label.
///
/// No salt is used; domain separation comes from the `info` label alone. Both protocol ends must
/// pass the identical label to arrive at the same key.
pub fn hkdf_sha256<const N: usize>(ikm: &[u8], info: &[u8]) -> Result<Secret<N>, HkdfError> {
    let hkdf = Hkdf::<Sha256>::new(None, ikm);
    let mut out = [0u8; N];
    hkdf.expand(info, &mut out)
        .map_err(|_| HkdfError::InvalidOutputLength(N))?;
    Ok(Secret::from_bytes(out))
}

#[derive(Debug, Error)]
pub enum HkdfError {
    #[error("requested invalid hkdf output length {0}")]
    InvalidOutputLength(usize),
}

#[cfg(test)]
mod tests {
    use super::hkdf_sha256;

    #[test]
    fn deterministic_per_label() {
        let key_1 = hkdf_sha256::<32>(b"shared secret", b"label").unwrap();
        let key_2 = hkdf_sha256::<32>(b"shared secret", b"label").unwrap();
        let key_3 = hkdf_sha256::<32>(b"shared secret", b"other label").unwrap();

        assert_eq!(key_1, key_2);
        assert_ne!(key_1, key_3);
    }
}
