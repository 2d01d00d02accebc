// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anonymous credentialed disclosure protocol for reporting sensitive findings to a designated
//! recipient without revealing which group member sent them.
//!
//! Members of a closed group obtain an anonymous signing credential from a group [`authority`]
//! through a three-message join handshake. With that credential an [`member::Informer`] can seal
//! a payload for exactly one recipient and hand it to a [`relay`], which verifies the group
//! signature, strips it, and appends the remaining record to an append-only ledger. Anyone can
//! read the ledger; only the addressed recipient can decrypt, and nobody (including the relay and
//! the recipient) learns which member published.
//!
//! ## Roles
//!
//! - [`authority::Authority`] holds the group manager key, issues single-use join tokens and
//!   admits members into the group.
//! - [`member::Informer`] joins the group once and then builds [`member::Publication`]s: an
//!   envelope addressed to a recipient, an encrypted content blob bound to that envelope, and a
//!   group signature over both.
//! - [`relay::Relay`] is the only party that ever sees group signatures. It verifies and discards
//!   them before anything reaches the ledger.
//! - [`recipient::Reader`] scans the ledger feed, decrypts the records addressed to it and checks
//!   the envelope/content binding of each one.
//!
//! ## Capability seams
//!
//! The group-signature scheme and the ledger are collaborators, not implementations: both are
//! expressed as traits in [`traits`] ([`traits::GroupScheme`], [`traits::Ledger`]) so deployments
//! can plug in a real scheme and a real backing store. The `test_utils` feature ships an
//! Ed25519-backed scheme and an in-memory ledger which are suitable for tests only.
pub mod authority;
pub mod crypto;
pub mod envelope;
pub mod identity;
pub mod member;
pub mod recipient;
pub mod relay;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
#[cfg(test)]
mod tests;
pub mod traits;
pub mod wire;

pub use crypto::{Rng, RngError};
