// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term identities of disclosure recipients and join-protocol correlation keys.
//!
//! Two distinct identifier types live here on purpose. A [`Sid`] addresses a message _recipient_
//! and is derived from the subject and issuer of their long-term certificate; it appears in
//! envelopes and ledger queries. A [`ClientIdentity`] is the digest of the transport certificate a
//! prospective member authenticates with during the join handshake; it is only ever used by the
//! Group Authority to correlate the two join calls. Keeping them as separate types ensures the
//! join-time identity can never leak into the anonymous publish path.
use std::fmt;

use base64::prelude::{BASE64_STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::crypto::sha2::{SHA256_DIGEST_SIZE, sha2_256};
use crate::crypto::x25519::PublicKey;

/// Long-term certificate of a disclosure recipient.
///
/// Rust-native rendition of the X.509 certificate registered in the ledger's identity registry:
/// the distinguished names identify the subject, the static X25519 key is what publishers run the
/// key agreement against.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    subject: String,
    issuer: String,
    public_key: PublicKey,
}

impl Certificate {
    pub fn new(subject: &str, issuer: &str, public_key: PublicKey) -> Self {
        Self {
            subject: subject.to_string(),
            issuer: issuer.to_string(),
            public_key,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Static public key used for Diffie-Hellman key agreement towards this identity.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Stable subject identifier of this certificate.
    pub fn sid(&self) -> Sid {
        Sid::from_parts(&self.subject, &self.issuer)
    }

    /// Digest of the certificate, used as join-protocol correlation key.
    pub fn digest(&self) -> ClientIdentity {
        let subject = self.subject.as_bytes();
        let issuer = self.issuer.as_bytes();
        let key = self.public_key.as_bytes();
        ClientIdentity(sha2_256(&[subject, b"::", issuer, b"::", key]))
    }
}

/// Stable identifier of a long-term identity, used to address the recipient of a disclosure.
///
/// Derived from the subject and issuer distinguished names, base64-encoded so it survives JSON
/// framing untouched. Sender and recipient derive it independently and compare byte-for-byte.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sid(String);

impl Sid {
    /// Derive the identifier from certificate subject and issuer.
    pub fn from_parts(subject: &str, issuer: &str) -> Self {
        let identity = format!("x509::{subject}::{issuer}");
        Self(BASE64_STANDARD.encode(identity))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SHA-256 digest of the transport certificate a client authenticates with when joining.
///
/// Only meaningful to the Group Authority as a correlation key between the two join calls.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ClientIdentity([u8; SHA256_DIGEST_SIZE]);

impl ClientIdentity {
    pub fn from_bytes(bytes: [u8; SHA256_DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use crate::crypto::Rng;
    use crate::crypto::x25519::SecretKey;

    use super::{Certificate, Sid};

    #[test]
    fn sid_is_stable_across_parties() {
        let rng = Rng::from_seed([1; 32]);
        let secret = SecretKey::from_bytes(rng.random_array().unwrap());
        let certificate = Certificate::new(
            "CN=reporter,O=Org1",
            "CN=ca.org1,O=Org1",
            secret.public_key().unwrap(),
        );

        // The recipient derives the sid from their own certificate parts, the sender from the
        // resolved certificate. Both must agree byte-for-byte.
        assert_eq!(
            certificate.sid(),
            Sid::from_parts("CN=reporter,O=Org1", "CN=ca.org1,O=Org1")
        );
    }

    #[test]
    fn client_identity_differs_per_certificate() {
        let rng = Rng::from_seed([2; 32]);
        let secret_1 = SecretKey::from_bytes(rng.random_array().unwrap());
        let secret_2 = SecretKey::from_bytes(rng.random_array().unwrap());

        let certificate_1 = Certificate::new("CN=a", "CN=ca", secret_1.public_key().unwrap());
        let certificate_2 = Certificate::new("CN=b", "CN=ca", secret_2.public_key().unwrap());

        assert_ne!(certificate_1.digest(), certificate_2.digest());
    }
}
