// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

use crate::identity::{Certificate, Sid};
use crate::wire::LedgerEntry;

/// Append-only publish/query store the relay forwards verified records to.
///
/// The ledger is an external collaborator (the reference deployment uses a blockchain holding the
/// records and the recipient identity registry). The protocol assumes nothing stronger than
/// "eventually visible to queries after a successful append" and relies on the ledger for
/// duplicate detection: an identical record appended twice must report [`AppendOutcome::Duplicate`]
/// instead of silently overwriting.
pub trait Ledger {
    /// Append a record under the given key, or a ledger-chosen key when `None`.
    fn append(&mut self, key: Option<String>, value: String) -> Result<AppendOutcome, LedgerError>;

    /// All published records, in no guaranteed order.
    fn records(&self) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Certificate bound to the given subject identifier, `None` when unregistered.
    fn certificate(&self, sid: &Sid) -> Result<Option<Certificate>, LedgerError>;

    /// Subject identifiers of all registered recipients.
    fn subject_ids(&self) -> Result<Vec<Sid>, LedgerError>;
}

/// Result of appending a record to the ledger.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AppendOutcome {
    /// Record stored under the given key.
    Stored { key: String },

    /// An identical record already exists; nothing was written.
    Duplicate { key: String },
}

/// Transient transport faults are kept distinct from integrity errors: every variant here is safe
/// to retry once the underlying condition clears.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger unreachable: {0}")]
    Unavailable(String),

    #[error("ledger rejected request, client credentials are stale")]
    StaleCredentials,

    #[error("ledger backend fault: {0}")]
    Backend(String),
}
