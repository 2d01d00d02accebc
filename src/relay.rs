// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay: authenticates publications against the group public key and forwards accepted records
//! to the ledger.
//!
//! The relay learns that a publisher is _some_ authorised group member, never which one. Nothing
//! here accepts or stores a caller identity; the only identity material the relay ever handles is
//! the group public key and the recipient certificates it looks up on behalf of publishers.
//! Signatures are stripped before forwarding: the ledger holds `{envelope, content}` only.
use std::error::Error;

use thiserror::Error;
use tracing::{debug, warn};

use crate::crypto::sha2::sha2_256;
use crate::identity::{Certificate, Sid};
use crate::traits::{AppendOutcome, GroupScheme, Ledger, LedgerError, RelayEndpoint};
use crate::wire::{
    LedgerEntry, PublishOutcome, PublishRequest, SignaturePayload, StoredRecord, WireError,
    decode_base64,
};

/// Relay/verifier for one disclosure group.
#[derive(Debug)]
pub struct Relay<GS, L>
where
    GS: GroupScheme,
    L: Ledger,
{
    group_key: GS::GroupPublicKey,
    ledger: L,
}

impl<GS, L> Relay<GS, L>
where
    GS: GroupScheme,
    GS::Error: Send + Sync + 'static,
    L: Ledger,
{
    pub fn new(group_key: GS::GroupPublicKey, ledger: L) -> Self {
        Self { group_key, ledger }
    }

    /// Verify a publication and forward it to the ledger.
    ///
    /// An invalid signature is a terminal per-record outcome ([`PublishOutcome::Rejected`]), as
    /// is a request whose fields are not valid base64. Ledger faults surface as a distinct,
    /// retryable [`RelayError::Ledger`] instead.
    pub fn handle_publish(
        &mut self,
        request: PublishRequest,
    ) -> Result<PublishOutcome, RelayError> {
        let signature = match decode_base64(&request.signature) {
            Ok(signature) => signature,
            Err(_) => {
                warn!("rejecting publication with malformed signature encoding");
                return Ok(PublishOutcome::Rejected {
                    reason: "malformed signature encoding".to_string(),
                });
            }
        };

        // Re-derive the exact byte string the publisher signed, from the envelope and content as
        // transmitted.
        let payload = SignaturePayload::new(&request.envelope, &request.content).to_bytes()?;
        let valid = GS::verify(&signature, &payload, &self.group_key)
            .map_err(|err| RelayError::Scheme(Box::new(err)))?;
        if !valid {
            warn!("rejecting publication, group signature verification failed");
            return Ok(PublishOutcome::Rejected {
                reason: "invalid signature".to_string(),
            });
        }

        // Signature verified and stripped; only envelope and content reach the ledger.
        let record = StoredRecord {
            envelope: request.envelope,
            content: request.content,
        };
        let value = record.to_wire()?;
        let key = hex::encode(sha2_256(&[value.as_bytes()]));

        match self.ledger.append(Some(key), value)? {
            AppendOutcome::Stored { key } => {
                debug!(key = %key, "disclosure stored");
                Ok(PublishOutcome::Stored { key })
            }
            AppendOutcome::Duplicate { key } => {
                debug!(key = %key, "disclosure already in ledger");
                Ok(PublishOutcome::Duplicate { key })
            }
        }
    }

    /// Certificate bound to a recipient identifier, from the ledger's identity registry.
    pub fn handle_pubkey_lookup(&self, sid: &Sid) -> Result<Option<Certificate>, RelayError> {
        Ok(self.ledger.certificate(sid)?)
    }

    /// Identifiers of all registered recipients.
    pub fn handle_sids(&self) -> Result<Vec<Sid>, RelayError> {
        Ok(self.ledger.subject_ids()?)
    }

    /// All published records, verbatim and unfiltered.
    ///
    /// Filtering by recipient is deliberately left to the reader so the relay cannot link a query
    /// to a recipient identity.
    pub fn handle_list(&self) -> Result<Vec<LedgerEntry>, RelayError> {
        Ok(self.ledger.records()?)
    }
}

impl<GS, L> RelayEndpoint for Relay<GS, L>
where
    GS: GroupScheme,
    GS::Error: Send + Sync + 'static,
    L: Ledger,
{
    type Error = RelayError;

    fn certificate(&self, sid: &Sid) -> Result<Option<Certificate>, Self::Error> {
        self.handle_pubkey_lookup(sid)
    }

    fn subject_ids(&self) -> Result<Vec<Sid>, Self::Error> {
        self.handle_sids()
    }

    fn publish(&mut self, request: PublishRequest) -> Result<PublishOutcome, Self::Error> {
        self.handle_publish(request)
    }

    fn disclosures(&self) -> Result<Vec<LedgerEntry>, Self::Error> {
        self.handle_list()
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    /// Transient ledger fault, safe to retry.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("group signature scheme failed: {0}")]
    Scheme(#[source] Box<dyn Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
    use crate::crypto::Rng;
    use crate::test_utils::{MemoryLedger, TestGroupScheme, join_test_member};
    use crate::traits::GroupScheme;
    use crate::wire::{PublishOutcome, PublishRequest, SignaturePayload, encode_base64};

    use super::Relay;

    fn signed_request(rng: &Rng) -> (Relay<TestGroupScheme, MemoryLedger>, PublishRequest) {
        let (credential, member_key) = join_test_member(rng);
        let group_key = credential.public_key().clone();

        let envelope = encode_base64(b"{\"fake\":\"envelope\"}");
        let content = encode_base64(b"opaque content");
        let payload = SignaturePayload::new(&envelope, &content).to_bytes().unwrap();
        let signature =
            TestGroupScheme::sign(&payload, &member_key, &group_key, rng).unwrap();

        let relay = Relay::new(group_key, MemoryLedger::new());
        let request = PublishRequest {
            envelope,
            content,
            signature: encode_base64(&signature),
        };
        (relay, request)
    }

    #[test]
    fn stores_then_reports_duplicate() {
        let rng = Rng::from_seed([1; 32]);
        let (mut relay, request) = signed_request(&rng);

        assert!(matches!(
            relay.handle_publish(request.clone()).unwrap(),
            PublishOutcome::Stored { .. }
        ));
        assert!(matches!(
            relay.handle_publish(request).unwrap(),
            PublishOutcome::Duplicate { .. }
        ));
        assert_eq!(relay.handle_list().unwrap().len(), 1);
    }

    #[test]
    fn rejects_mutated_envelope_or_content() {
        let rng = Rng::from_seed([2; 32]);
        let (mut relay, request) = signed_request(&rng);

        let mut mutated_envelope = request.clone();
        mutated_envelope.envelope = crate::wire::encode_base64(b"{\"fake\":\"other\"}");
        assert!(matches!(
            relay.handle_publish(mutated_envelope).unwrap(),
            PublishOutcome::Rejected { .. }
        ));

        let mut mutated_content = request.clone();
        mutated_content.content = crate::wire::encode_base64(b"other content");
        assert!(matches!(
            relay.handle_publish(mutated_content).unwrap(),
            PublishOutcome::Rejected { .. }
        ));

        // The unmutated original still verifies.
        assert!(matches!(
            relay.handle_publish(request).unwrap(),
            PublishOutcome::Stored { .. }
        ));
    }

    #[test]
    fn rejects_malformed_signature_encoding() {
        let rng = Rng::from_seed([3; 32]);
        let (mut relay, mut request) = signed_request(&rng);

        request.signature = "%%% not base64 %%%".to_string();
        assert!(matches!(
            relay.handle_publish(request).unwrap(),
            PublishOutcome::Rejected { .. }
        ));
    }
}
