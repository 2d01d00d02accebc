// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory ledger collaborator with the same observable behaviour as the reference deployment's
//! chaincode: append-only records keyed by content hash, duplicate detection, a recipient
//! identity registry, and a switch to simulate outages.
use std::collections::{BTreeMap, HashMap};

use chrono::{SecondsFormat, Utc};

use crate::crypto::sha2::sha2_256;
use crate::identity::{Certificate, Sid};
use crate::traits::{AppendOutcome, Ledger, LedgerError};
use crate::wire::LedgerEntry;

#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: BTreeMap<String, StoredValue>,
    certificates: HashMap<Sid, Certificate>,
    unavailable: bool,
}

#[derive(Debug)]
struct StoredValue {
    date: String,
    value: String,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipient certificate in the identity registry.
    pub fn register_certificate(&mut self, certificate: Certificate) {
        self.certificates.insert(certificate.sid(), certificate);
    }

    /// Simulate the ledger being unreachable.
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    fn check_available(&self) -> Result<(), LedgerError> {
        if self.unavailable {
            return Err(LedgerError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

impl Ledger for MemoryLedger {
    fn append(&mut self, key: Option<String>, value: String) -> Result<AppendOutcome, LedgerError> {
        self.check_available()?;

        let key = key.unwrap_or_else(|| hex::encode(sha2_256(&[value.as_bytes()])));
        if self.records.contains_key(&key) {
            return Ok(AppendOutcome::Duplicate { key });
        }

        self.records.insert(
            key.clone(),
            StoredValue {
                date: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                value,
            },
        );
        Ok(AppendOutcome::Stored { key })
    }

    fn records(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.check_available()?;
        Ok(self
            .records
            .iter()
            .map(|(key, stored)| LedgerEntry {
                hash: key.clone(),
                date: stored.date.clone(),
                value: stored.value.clone(),
            })
            .collect())
    }

    fn certificate(&self, sid: &Sid) -> Result<Option<Certificate>, LedgerError> {
        self.check_available()?;
        Ok(self.certificates.get(sid).cloned())
    }

    fn subject_ids(&self) -> Result<Vec<Sid>, LedgerError> {
        self.check_available()?;
        Ok(self.certificates.keys().cloned().collect())
    }
}
