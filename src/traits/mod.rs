// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability interfaces decoupling the protocol from primitive and transport implementations.
mod endpoint;
mod groupsig;
mod ledger;

pub use endpoint::{AuthorityEndpoint, RelayEndpoint};
pub use groupsig::{GroupCredential, GroupScheme};
pub use ledger::{AppendOutcome, Ledger, LedgerError};
