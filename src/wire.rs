// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON and base64 wire forms fixed by the protocol.
//!
//! The protocol only fixes the framing _around_ the opaque blobs produced by the group-signature
//! primitive and the AEAD: join messages travel as `{token, message}` envelopes, publications as
//! `{envelope, content, signature}` objects of base64 strings, and ledger records as
//! base64-encoded `{envelope, content}` JSON. Digests in the signature payload are computed over
//! the exact base64 bytes as transmitted, so both signer and verifier hash identical input.
use base64::prelude::{BASE64_STANDARD, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::sha2::sha2_256;

/// Encode bytes in the protocol's standard base64 alphabet.
pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

/// Decode standard base64, classifying malformed input as a wire error.
pub fn decode_base64(value: &str) -> Result<Vec<u8>, WireError> {
    BASE64_STANDARD
        .decode(value)
        .map_err(|_| WireError::InvalidBase64)
}

mod base64_bytes {
    use base64::prelude::{BASE64_STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64_STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64_STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}

/// First join-call answer: message 1 of the handshake plus the single-use continuation token.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct JoinOffer {
    pub token: String,

    #[serde(with = "base64_bytes")]
    pub message: Vec<u8>,
}

/// A full publication as submitted to the relay.
///
/// All three fields are base64 strings: the envelope wraps JSON, content and signature wrap
/// opaque cipher/signature bytes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub envelope: String,
    pub content: String,
    pub signature: String,
}

/// Relay-side outcome of a publish request, surfaced verbatim to the publisher.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PublishOutcome {
    /// Record verified and appended to the ledger.
    Stored { key: String },

    /// Record verified but an identical one already exists; nothing was written.
    Duplicate { key: String },

    /// Terminal per-record rejection (invalid signature or malformed request). Not retryable.
    Rejected { reason: String },
}

/// The canonical byte string a publication's group signature covers.
///
/// Hex SHA-256 digests of the base64-encoded envelope and content, serialized as a JSON object
/// with fixed field order. Binding both digests into one signed message prevents mix-and-match of
/// envelopes and contents across records.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignaturePayload {
    envelope: String,
    content: String,
}

impl SignaturePayload {
    pub fn new(envelope_b64: &str, content_b64: &str) -> Self {
        Self {
            envelope: hex::encode(sha2_256(&[envelope_b64.as_bytes()])),
            content: hex::encode(sha2_256(&[content_b64.as_bytes()])),
        }
    }

    /// Canonical JSON bytes to sign or verify.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Verified record as forwarded to the ledger, with the signature already stripped.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub envelope: String,
    pub content: String,
}

impl StoredRecord {
    /// Encode for the ledger: base64 over the JSON object.
    pub fn to_wire(&self) -> Result<String, WireError> {
        Ok(encode_base64(&serde_json::to_vec(self)?))
    }

    /// Decode a ledger value. Fails on anything that is not valid base64-wrapped JSON.
    pub fn from_wire(value: &str) -> Result<Self, WireError> {
        let bytes = decode_base64(value)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// A single ledger record as returned by list queries.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Content-derived key the record is stored under.
    pub hash: String,

    /// Timestamp the ledger recorded the append at.
    pub date: String,

    /// The base64-encoded record itself.
    pub value: String,
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed base64 on wire")]
    InvalidBase64,

    #[error("malformed json on wire: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
