// SPDX-License-Identifier: MIT OR Apache-2.0

//! Member ("informer"): joins the group and publishes disclosures.
//!
//! Publishing is a strict four-step pipeline over a per-message [`Publication`] value: build the
//! envelope, build the content, sign, publish. Calling a step before its prerequisite is a
//! protocol-sequencing error. The ephemeral Diffie-Hellman secret lives only inside
//! [`Publication::build_envelope`] and the derived symmetric key only inside the `Publication`
//! itself, which is consumed by [`Publication::publish`]; both are zeroised on drop and never
//! persisted, so compromise of long-term keys after publication does not expose the message.
use std::error::Error;

use chrono::{SecondsFormat, Utc};
use thiserror::Error;

use crate::crypto::hkdf::HkdfError;
use crate::crypto::x25519::{SecretKey, X25519Error};
use crate::crypto::xchacha20::XAeadKey;
use crate::crypto::{Rng, RngError};
use crate::envelope::{Envelope, EnvelopeError, derive_content_key, seal_content};
use crate::identity::{Certificate, Sid};
use crate::traits::{AuthorityEndpoint, GroupScheme, RelayEndpoint};
use crate::wire::{PublishOutcome, PublishRequest, SignaturePayload, WireError, encode_base64};

/// A joined member of the disclosure group.
#[derive(Debug)]
pub struct Informer<GS>
where
    GS: GroupScheme,
{
    group_key: GS::GroupPublicKey,
    member_key: GS::MemberKey,
}

impl<GS> Informer<GS>
where
    GS: GroupScheme,
{
    /// Run the full join handshake against a Group Authority and store the resulting member
    /// credential.
    ///
    /// Fails if either network call fails or the manager rejects the handshake; a failed join
    /// leaves no usable local state behind.
    pub fn join<E>(endpoint: &mut E, rng: &Rng) -> Result<Self, JoinError<GS, E::Error>>
    where
        E: AuthorityEndpoint<GS>,
    {
        let group_key = endpoint.group_public_key().map_err(JoinError::Endpoint)?;
        let offer = endpoint.join_start().map_err(JoinError::Endpoint)?;
        let (pending, response) =
            GS::join_respond(&group_key, &offer.message, rng).map_err(JoinError::Scheme)?;
        let accept = endpoint
            .join_finish(&offer.token, response)
            .map_err(JoinError::Endpoint)?;
        let member_key =
            GS::join_complete(&group_key, pending, &accept).map_err(JoinError::Scheme)?;

        Ok(Self {
            group_key,
            member_key,
        })
    }

    /// Reconstruct an informer from persisted credentials.
    pub fn from_credentials(group_key: GS::GroupPublicKey, member_key: GS::MemberKey) -> Self {
        Self {
            group_key,
            member_key,
        }
    }

    /// Member credential for persistence. Never transmitted after issuance.
    pub fn member_key(&self) -> &GS::MemberKey {
        &self.member_key
    }

    pub fn group_key(&self) -> &GS::GroupPublicKey {
        &self.group_key
    }

    /// Look up the certificate bound to a recipient identifier via the relay.
    pub fn resolve_recipient<R>(
        relay: &R,
        sid: &Sid,
    ) -> Result<Certificate, ResolveError<R::Error>>
    where
        R: RelayEndpoint,
    {
        relay
            .certificate(sid)
            .map_err(ResolveError::Endpoint)?
            .ok_or_else(|| ResolveError::UnknownRecipient(sid.clone()))
    }
}

/// One disclosure in the making: envelope, content and signature are built in order, then the
/// whole value is consumed by [`publish`](Publication::publish).
///
/// Holds the only copy of the derived symmetric key; dropping the publication (published or not)
/// zeroises it.
#[derive(Debug, Default)]
pub struct Publication {
    envelope: Option<Envelope>,
    envelope_wire: Option<String>,
    content_key: Option<XAeadKey>,
    content_wire: Option<String>,
    signature_wire: Option<String>,
}

impl Publication {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh single-use key pair, agree on a symmetric key with the recipient's static
    /// certificate key and produce the envelope.
    ///
    /// The ephemeral secret key is dropped (and zeroised) before this method returns; only the
    /// public half survives, inside the envelope.
    pub fn build_envelope(
        &mut self,
        recipient: &Certificate,
        rng: &Rng,
    ) -> Result<(), PublicationError> {
        let ephemeral_secret = SecretKey::from_bytes(rng.random_array()?);
        let shared_secret = ephemeral_secret.calculate_agreement(recipient.public_key())?;
        let content_key = derive_content_key(&shared_secret)?;

        let envelope = Envelope::new(
            recipient.sid(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            Envelope::random_nonce(rng)?,
            &ephemeral_secret.public_key()?,
        );

        self.envelope_wire = Some(envelope.to_wire()?);
        self.envelope = Some(envelope);
        self.content_key = Some(content_key);
        Ok(())
    }

    /// Authenticated-encrypt the payload under the derived key, binding it to the envelope.
    pub fn build_content(&mut self, payload: &str, rng: &Rng) -> Result<(), PublicationError> {
        let (Some(envelope), Some(content_key)) = (&self.envelope, &self.content_key) else {
            return Err(PublicationError::EnvelopeMissing);
        };

        let content = seal_content(envelope, payload, content_key, rng)?;
        self.content_wire = Some(encode_base64(&content));
        Ok(())
    }

    /// Group-sign the digests of envelope and content, binding signature validity to this exact
    /// pair.
    pub fn sign<GS>(&mut self, informer: &Informer<GS>, rng: &Rng) -> Result<(), PublicationError>
    where
        GS: GroupScheme,
        GS::Error: Send + Sync + 'static,
    {
        let Some(envelope_wire) = &self.envelope_wire else {
            return Err(PublicationError::EnvelopeMissing);
        };
        let Some(content_wire) = &self.content_wire else {
            return Err(PublicationError::ContentMissing);
        };

        let payload = SignaturePayload::new(envelope_wire, content_wire).to_bytes()?;
        let signature = GS::sign(&payload, &informer.member_key, &informer.group_key, rng)
            .map_err(|err| PublicationError::Scheme(Box::new(err)))?;

        self.signature_wire = Some(encode_base64(&signature));
        Ok(())
    }

    /// Send the finished record to the relay, surfacing its outcome verbatim.
    ///
    /// Consumes the publication; the derived key is zeroised on return.
    pub fn publish<R>(self, relay: &mut R) -> Result<PublishOutcome, PublishError<R::Error>>
    where
        R: RelayEndpoint,
    {
        let Self {
            envelope_wire: Some(envelope),
            content_wire: Some(content),
            signature_wire: Some(signature),
            ..
        } = self
        else {
            return Err(PublishError::Incomplete);
        };

        relay
            .publish(PublishRequest {
                envelope,
                content,
                signature,
            })
            .map_err(PublishError::Endpoint)
    }
}

#[derive(Debug, Error)]
pub enum JoinError<GS, E>
where
    GS: GroupScheme,
    E: Error,
{
    #[error(transparent)]
    Endpoint(E),

    #[error(transparent)]
    Scheme(GS::Error),
}

#[derive(Debug, Error)]
pub enum ResolveError<E>
where
    E: Error,
{
    #[error("unknown recipient {0}")]
    UnknownRecipient(Sid),

    #[error(transparent)]
    Endpoint(E),
}

/// Errors while assembling a publication locally.
///
/// `EnvelopeMissing` and `ContentMissing` are protocol-sequencing errors: the caller invoked a
/// step before its prerequisite and must restart the pipeline.
#[derive(Debug, Error)]
pub enum PublicationError {
    #[error("envelope does not exist yet, run build_envelope first")]
    EnvelopeMissing,

    #[error("content does not exist yet, run build_content first")]
    ContentMissing,

    #[error(transparent)]
    Rng(#[from] RngError),

    #[error(transparent)]
    X25519(#[from] X25519Error),

    #[error(transparent)]
    Hkdf(#[from] HkdfError),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("group signature scheme failed: {0}")]
    Scheme(#[source] Box<dyn Error + Send + Sync>),
}

#[derive(Debug, Error)]
pub enum PublishError<E>
where
    E: Error,
{
    #[error("create envelope, content and signature before publishing")]
    Incomplete,

    #[error(transparent)]
    Endpoint(E),
}
