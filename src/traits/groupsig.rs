// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::crypto::Rng;

/// Capability interface over a group-signature primitive.
///
/// A group signature proves that _some_ authorised member of a group signed a message without
/// revealing which one. The protocol built in this crate never looks inside the primitive: join
/// messages and signatures cross the wire as opaque byte blobs (base64-framed by the wire layer),
/// keys and registries stay behind associated types. Any scheme offering a 3-message join
/// handshake (member → manager → member) and sign/verify against a single group public key can
/// implement this trait.
///
/// The four join steps map onto the wire exchange as follows:
///
/// 1. [`join_offer`](GroupScheme::join_offer): manager produces message 1 for a joining member.
/// 2. [`join_respond`](GroupScheme::join_respond): member answers with message 2, keeping local
///    pending state.
/// 3. [`join_accept`](GroupScheme::join_accept): manager registers the member and produces the
///    final credential material (message 3).
/// 4. [`join_complete`](GroupScheme::join_complete): member combines pending state and message 3
///    into their member credential.
pub trait GroupScheme {
    /// Secret key of the group manager, never leaves the Group Authority.
    type ManagerKey: Debug + Serialize + for<'a> Deserialize<'a>;

    /// Public key of the group, the only key material ever exported.
    type GroupPublicKey: Clone + Debug + Serialize + for<'a> Deserialize<'a>;

    /// Membership registry (group membership list) maintained by the manager.
    type Registry: Debug + Serialize + for<'a> Deserialize<'a>;

    /// Member-side state held between join steps 2 and 4.
    type Pending: Debug;

    /// Per-member secret signing credential, never transmitted after issuance.
    type MemberKey: Debug + Serialize + for<'a> Deserialize<'a>;

    type Error: Error;

    /// Create a fresh group: manager key, group public key and empty member registry.
    fn setup(rng: &Rng) -> Result<GroupCredential<Self>, Self::Error>;

    /// Manager-side first join step, produces message 1 towards the joining member.
    fn join_offer(
        manager_key: &Self::ManagerKey,
        group_key: &Self::GroupPublicKey,
        registry: &mut Self::Registry,
        rng: &Rng,
    ) -> Result<Vec<u8>, Self::Error>;

    /// Member-side join step, consumes message 1 and produces message 2 plus pending local state.
    fn join_respond(
        group_key: &Self::GroupPublicKey,
        offer: &[u8],
        rng: &Rng,
    ) -> Result<(Self::Pending, Vec<u8>), Self::Error>;

    /// Manager-side final join step, registers the member and produces message 3.
    fn join_accept(
        manager_key: &Self::ManagerKey,
        group_key: &Self::GroupPublicKey,
        registry: &mut Self::Registry,
        response: &[u8],
    ) -> Result<Vec<u8>, Self::Error>;

    /// Member-side final join step, turns pending state and message 3 into the member credential.
    fn join_complete(
        group_key: &Self::GroupPublicKey,
        pending: Self::Pending,
        accept: &[u8],
    ) -> Result<Self::MemberKey, Self::Error>;

    /// Sign a message on behalf of the group.
    fn sign(
        message: &[u8],
        member_key: &Self::MemberKey,
        group_key: &Self::GroupPublicKey,
        rng: &Rng,
    ) -> Result<Vec<u8>, Self::Error>;

    /// Verify that a message was signed by some member of the group.
    fn verify(
        signature: &[u8],
        message: &[u8],
        group_key: &Self::GroupPublicKey,
    ) -> Result<bool, Self::Error>;
}

/// The triple defining one group-signature group.
///
/// Owned exclusively by the Group Authority; [`GroupCredential::public_key`] is the only piece
/// ever handed to members, relays or verifiers.
#[derive(Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct GroupCredential<GS>
where
    GS: GroupScheme + ?Sized,
{
    pub(crate) manager_key: GS::ManagerKey,
    pub(crate) public_key: GS::GroupPublicKey,
    pub(crate) registry: GS::Registry,
}

impl<GS> GroupCredential<GS>
where
    GS: GroupScheme,
{
    pub fn new(
        manager_key: GS::ManagerKey,
        public_key: GS::GroupPublicKey,
        registry: GS::Registry,
    ) -> Self {
        Self {
            manager_key,
            public_key,
            registry,
        }
    }

    /// Exported group public key. Manager key and registry remain private to the authority.
    pub fn public_key(&self) -> &GS::GroupPublicKey {
        &self.public_key
    }
}
