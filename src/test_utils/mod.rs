// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles: an ed25519-backed group-signature scheme, an in-memory ledger and an in-process
//! authority endpoint adapter.
mod groupsig;
mod ledger;

pub use groupsig::{TestGroupScheme, TestMemberKey, TestSchemeError};
pub use ledger::MemoryLedger;

use crate::authority::{Authority, AuthorityError, AuthorityState};
use crate::crypto::Rng;
use crate::identity::ClientIdentity;
use crate::traits::{AuthorityEndpoint, GroupCredential, GroupScheme};
use crate::wire::JoinOffer;

/// In-process view of a Group Authority, bound to one transport client identity.
///
/// Mirrors the deployment shape where mutual TLS binds each join call to the caller's
/// certificate: the identity is fixed at construction and invisible to the caller of the
/// [`AuthorityEndpoint`] methods.
#[derive(Debug)]
pub struct LocalAuthority<'a, GS>
where
    GS: GroupScheme,
{
    state: &'a mut AuthorityState<GS>,
    client: ClientIdentity,
    rng: &'a Rng,
}

impl<'a, GS> LocalAuthority<'a, GS>
where
    GS: GroupScheme,
{
    pub fn new(state: &'a mut AuthorityState<GS>, client: ClientIdentity, rng: &'a Rng) -> Self {
        Self { state, client, rng }
    }
}

impl<GS> AuthorityEndpoint<GS> for LocalAuthority<'_, GS>
where
    GS: GroupScheme,
{
    type Error = AuthorityError<GS>;

    fn group_public_key(&self) -> Result<GS::GroupPublicKey, Self::Error> {
        Ok(Authority::group_public_key(self.state).clone())
    }

    fn join_start(&mut self) -> Result<JoinOffer, Self::Error> {
        Authority::join_start(self.state, self.client, self.rng)
    }

    fn join_finish(&mut self, token: &str, response: Vec<u8>) -> Result<Vec<u8>, Self::Error> {
        Authority::join_finish(self.state, self.client, token, &response)
    }
}

/// Bootstrap a fresh group and join a single member directly through the scheme, without the
/// authority's token bookkeeping. Handy for tests that only need a signing member.
pub fn join_test_member(rng: &Rng) -> (GroupCredential<TestGroupScheme>, TestMemberKey) {
    let mut credential = TestGroupScheme::setup(rng).expect("test scheme setup");
    let offer = TestGroupScheme::join_offer(
        &credential.manager_key,
        &credential.public_key,
        &mut credential.registry,
        rng,
    )
    .expect("join offer");
    let (pending, response) =
        TestGroupScheme::join_respond(&credential.public_key, &offer, rng).expect("join respond");
    let accept = TestGroupScheme::join_accept(
        &credential.manager_key,
        &credential.public_key,
        &mut credential.registry,
        &response,
    )
    .expect("join accept");
    let member_key = TestGroupScheme::join_complete(&credential.public_key, pending, &accept)
        .expect("join complete");
    (credential, member_key)
}
