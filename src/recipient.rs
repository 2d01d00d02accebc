// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recipient ("reader"): scans the published feed and recovers disclosures addressed to its own
//! identity.
//!
//! The feed is shared and unfiltered, so most error conditions are per-record and recoverable:
//! malformed entries and records for other recipients are skipped, a failing AEAD tag is logged
//! and skipped (the sid matched but the content was not encrypted towards our key). The one fatal
//! per-record condition is a date/nonce mismatch _after_ successful decryption — the AEAD already
//! proved the content authentic under our key, so a mismatch means the record was assembled from
//! parts of different publications.
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::crypto::hkdf::HkdfError;
use crate::crypto::x25519::{SecretKey, X25519Error};
use crate::crypto::xchacha20::XAeadError;
use crate::envelope::{
    BindingError, Envelope, EnvelopeError, derive_content_key, open_content, verify_binding,
};
use crate::identity::Certificate;
use crate::wire::{LedgerEntry, StoredRecord, decode_base64};

/// A long-term identity reading its own disclosures from the feed.
#[derive(Debug)]
pub struct Reader {
    certificate: Certificate,
    secret_key: SecretKey,
}

/// One successfully recovered and validated disclosure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Disclosure {
    /// Decrypted payload.
    pub payload: String,

    /// Ledger key of the record this was recovered from.
    pub hash: String,

    /// Ledger append timestamp.
    pub date: String,
}

/// Outcome of scanning a feed.
///
/// Zero matches is an informational outcome, not an error; binding violations are collected per
/// offending record while the rest of the feed is still scanned.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub disclosures: Vec<Disclosure>,

    /// Records addressed to us and successfully recovered.
    pub matched: usize,

    /// Entries that were not valid base64/JSON records. The feed may contain unrelated data.
    pub skipped_malformed: usize,

    /// Records addressed to us whose AEAD tag did not verify under the derived key.
    pub undecryptable: usize,

    /// Fatal integrity violations: content did not belong to its envelope.
    pub violations: Vec<(String, BindingError)>,
}

impl Reader {
    pub fn new(certificate: Certificate, secret_key: SecretKey) -> Self {
        Self {
            certificate,
            secret_key,
        }
    }

    /// Scan all published records and recover those addressed to this identity.
    pub fn scan(&self, entries: &[LedgerEntry]) -> ScanReport {
        let mut report = ScanReport::default();

        for entry in entries {
            match self.open_record(entry) {
                Ok(disclosure) => {
                    debug!(hash = %disclosure.hash, "disclosure decrypted successfully");
                    report.matched += 1;
                    report.disclosures.push(disclosure);
                }
                Err(RecordError::NotAddressedToUs) => {}
                Err(RecordError::Malformed(err)) => {
                    debug!(hash = %entry.hash, %err, "skipping malformed feed entry");
                    report.skipped_malformed += 1;
                }
                Err(RecordError::Undecryptable) => {
                    warn!(
                        hash = %entry.hash,
                        "content can not be decrypted with derived key, skipping record"
                    );
                    report.undecryptable += 1;
                }
                Err(err @ (RecordError::KeyAgreement(_) | RecordError::Kdf(_))) => {
                    warn!(hash = %entry.hash, %err, "key agreement failed for record, skipping");
                    report.undecryptable += 1;
                }
                Err(RecordError::Binding(violation)) => {
                    error!(
                        hash = %entry.hash,
                        %violation,
                        "record failed envelope binding check after decryption"
                    );
                    report.violations.push((entry.hash.clone(), violation));
                }
            }
        }

        if report.matched == 0 {
            info!("no disclosures assigned to this identity");
        }
        report
    }

    /// Recover a single record, exposing the full per-record error taxonomy.
    pub fn open_record(&self, entry: &LedgerEntry) -> Result<Disclosure, RecordError> {
        let record = StoredRecord::from_wire(&entry.value)
            .map_err(|err| RecordError::Malformed(err.into()))?;
        let envelope = Envelope::from_wire(&record.envelope).map_err(RecordError::Malformed)?;

        // Byte-for-byte comparison against our own independently derived identifier.
        if envelope.sid != self.certificate.sid() {
            return Err(RecordError::NotAddressedToUs);
        }

        let ephemeral_key = envelope.ephemeral_key().map_err(RecordError::Malformed)?;
        let shared_secret = self.secret_key.calculate_agreement(&ephemeral_key)?;
        let content_key = derive_content_key(&shared_secret)?;

        let content = decode_base64(&record.content)
            .map_err(|err| RecordError::Malformed(err.into()))?;
        let plaintext = match open_content(&content, &content_key) {
            Ok(plaintext) => plaintext,
            // The Poly1305 tag is the authoritative check; a failing tag on a sid match means the
            // content was not encrypted towards our key.
            Err(EnvelopeError::XAead(XAeadError::DecryptionFailed)) => {
                return Err(RecordError::Undecryptable);
            }
            Err(err) => return Err(RecordError::Malformed(err)),
        };

        // Decryption succeeded; from here on any mismatch is deliberate tampering.
        verify_binding(&envelope, &plaintext)?;

        Ok(Disclosure {
            payload: plaintext.payload,
            hash: entry.hash.clone(),
            date: entry.date.clone(),
        })
    }
}

/// Why a single record could not be recovered.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Entry is not a valid record; the feed may contain unrelated data. Skip, not an error.
    #[error("entry is not a valid disclosure record: {0}")]
    Malformed(#[source] EnvelopeError),

    /// Record is addressed to a different identity.
    #[error("record is not addressed to this identity")]
    NotAddressedToUs,

    /// Authenticated decryption failed under the derived key. Recoverable, skip and continue.
    #[error("content can not be decrypted with the derived key")]
    Undecryptable,

    /// Content does not belong to its envelope: fatal integrity violation for this record.
    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    KeyAgreement(#[from] X25519Error),

    #[error(transparent)]
    Kdf(#[from] HkdfError),
}
