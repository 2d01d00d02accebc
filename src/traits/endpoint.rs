// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;

use crate::identity::{Certificate, Sid};
use crate::traits::GroupScheme;
use crate::wire::{JoinOffer, LedgerEntry, PublishOutcome, PublishRequest};

/// Client-side view of the Group Authority's join surface.
///
/// The reference deployment exposes this over mutual TLS (`GET /grpkey`, `GET /join`,
/// `POST /join/<token>`); the transport binds each call to the caller's client certificate, which
/// is how the authority correlates the two join calls. That transport identity stays entirely
/// inside implementations of this trait and never reaches the publish path.
pub trait AuthorityEndpoint<GS>
where
    GS: GroupScheme,
{
    type Error: Error;

    /// Fetch the group public key.
    fn group_public_key(&self) -> Result<GS::GroupPublicKey, Self::Error>;

    /// First join call, returns message 1 and the single-use continuation token.
    fn join_start(&mut self) -> Result<JoinOffer, Self::Error>;

    /// Second join call, exchanges message 2 for the final credential material (message 3).
    fn join_finish(&mut self, token: &str, response: Vec<u8>) -> Result<Vec<u8>, Self::Error>;
}

/// Client-side view of the relay's publish and query surface.
///
/// Publishing is anonymous at the application layer: nothing in this interface carries a caller
/// identity, membership is proven solely by the group signature inside the request.
pub trait RelayEndpoint {
    type Error: Error;

    /// Certificate registered for the given subject identifier.
    fn certificate(&self, sid: &Sid) -> Result<Option<Certificate>, Self::Error>;

    /// Subject identifiers of all registered recipients.
    fn subject_ids(&self) -> Result<Vec<Sid>, Self::Error>;

    /// Submit a signed record for verification and forwarding.
    fn publish(&mut self, request: PublishRequest) -> Result<PublishOutcome, Self::Error>;

    /// All published records, unfiltered.
    fn disclosures(&self) -> Result<Vec<LedgerEntry>, Self::Error>;
}
