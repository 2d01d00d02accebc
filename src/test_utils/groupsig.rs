// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ed25519-backed stand-in for a real group-signature primitive.
//!
//! The manager certifies each member's verifying key during the join handshake and every
//! signature carries the member key, its certificate and the message signature. A verifier
//! holding the group public key can check membership, which is all the protocol needs — but the
//! member key inside the blob makes signatures linkable to their signer. Real deployments must
//! plug an actual group-signature scheme into [`GroupScheme`]; this implementation exists for
//! tests only.
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{Rng, RngError};
use crate::traits::{GroupCredential, GroupScheme};

const KEY_SIZE: usize = 32;
const SIGNATURE_SIZE: usize = 64;

/// Byte layout of a signature blob: member key, manager certificate, message signature.
const BLOB_SIZE: usize = KEY_SIZE + SIGNATURE_SIZE + SIGNATURE_SIZE;

#[derive(Debug, Serialize, Deserialize)]
pub struct TestManagerKey(#[serde(with = "serde_bytes")] [u8; KEY_SIZE]);

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TestGroupPublicKey(#[serde(with = "serde_bytes")] [u8; KEY_SIZE]);

/// Membership list: verifying keys of all registered members.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TestRegistry {
    members: Vec<serde_bytes::ByteBuf>,
}

impl TestRegistry {
    /// Number of registered members, for state-invariance assertions in tests.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Member-side state between join steps: the generated signing key, waiting for its certificate.
#[derive(Debug)]
pub struct TestPending([u8; KEY_SIZE]);

#[derive(Debug, Serialize, Deserialize)]
pub struct TestMemberKey {
    #[serde(with = "serde_bytes")]
    signing_key: [u8; KEY_SIZE],

    #[serde(with = "serde_bytes")]
    certificate: [u8; SIGNATURE_SIZE],
}

/// Test-only [`GroupScheme`] implementation. Linkable, therefore never anonymous.
#[derive(Debug)]
pub struct TestGroupScheme;

impl GroupScheme for TestGroupScheme {
    type ManagerKey = TestManagerKey;
    type GroupPublicKey = TestGroupPublicKey;
    type Registry = TestRegistry;
    type Pending = TestPending;
    type MemberKey = TestMemberKey;
    type Error = TestSchemeError;

    fn setup(rng: &Rng) -> Result<GroupCredential<Self>, Self::Error> {
        let manager = SigningKey::from_bytes(&rng.random_array()?);
        let public_key = TestGroupPublicKey(manager.verifying_key().to_bytes());
        Ok(GroupCredential::new(
            TestManagerKey(manager.to_bytes()),
            public_key,
            TestRegistry::default(),
        ))
    }

    fn join_offer(
        _manager_key: &Self::ManagerKey,
        _group_key: &Self::GroupPublicKey,
        _registry: &mut Self::Registry,
        rng: &Rng,
    ) -> Result<Vec<u8>, Self::Error> {
        // A session value for wire realism; this mock does not bind the response to it.
        let challenge: [u8; 32] = rng.random_array()?;
        Ok(challenge.to_vec())
    }

    fn join_respond(
        _group_key: &Self::GroupPublicKey,
        _offer: &[u8],
        rng: &Rng,
    ) -> Result<(Self::Pending, Vec<u8>), Self::Error> {
        let member = SigningKey::from_bytes(&rng.random_array()?);
        let response = member.verifying_key().to_bytes().to_vec();
        Ok((TestPending(member.to_bytes()), response))
    }

    fn join_accept(
        manager_key: &Self::ManagerKey,
        _group_key: &Self::GroupPublicKey,
        registry: &mut Self::Registry,
        response: &[u8],
    ) -> Result<Vec<u8>, Self::Error> {
        let member_key: [u8; KEY_SIZE] = response
            .try_into()
            .map_err(|_| TestSchemeError::MalformedJoinMessage)?;
        VerifyingKey::from_bytes(&member_key)
            .map_err(|_| TestSchemeError::MalformedJoinMessage)?;

        let manager = SigningKey::from_bytes(&manager_key.0);
        let certificate = manager.sign(&member_key);

        registry.members.push(serde_bytes::ByteBuf::from(member_key));
        Ok(certificate.to_bytes().to_vec())
    }

    fn join_complete(
        group_key: &Self::GroupPublicKey,
        pending: Self::Pending,
        accept: &[u8],
    ) -> Result<Self::MemberKey, Self::Error> {
        let certificate: [u8; SIGNATURE_SIZE] = accept
            .try_into()
            .map_err(|_| TestSchemeError::MalformedJoinMessage)?;

        // Reject credentials the manager did not actually issue for our key.
        let member = SigningKey::from_bytes(&pending.0);
        let group = VerifyingKey::from_bytes(&group_key.0)
            .map_err(|_| TestSchemeError::MalformedJoinMessage)?;
        group
            .verify(
                &member.verifying_key().to_bytes(),
                &Signature::from_bytes(&certificate),
            )
            .map_err(|_| TestSchemeError::CredentialRejected)?;

        Ok(TestMemberKey {
            signing_key: pending.0,
            certificate,
        })
    }

    fn sign(
        message: &[u8],
        member_key: &Self::MemberKey,
        _group_key: &Self::GroupPublicKey,
        _rng: &Rng,
    ) -> Result<Vec<u8>, Self::Error> {
        let member = SigningKey::from_bytes(&member_key.signing_key);
        let signature = member.sign(message);

        let mut blob = Vec::with_capacity(BLOB_SIZE);
        blob.extend_from_slice(&member.verifying_key().to_bytes());
        blob.extend_from_slice(&member_key.certificate);
        blob.extend_from_slice(&signature.to_bytes());
        Ok(blob)
    }

    fn verify(
        signature: &[u8],
        message: &[u8],
        group_key: &Self::GroupPublicKey,
    ) -> Result<bool, Self::Error> {
        if signature.len() != BLOB_SIZE {
            return Ok(false);
        }
        let member_key: [u8; KEY_SIZE] = signature[..KEY_SIZE].try_into().expect("fixed layout");
        let certificate: [u8; SIGNATURE_SIZE] = signature[KEY_SIZE..KEY_SIZE + SIGNATURE_SIZE]
            .try_into()
            .expect("fixed layout");
        let message_signature: [u8; SIGNATURE_SIZE] = signature[KEY_SIZE + SIGNATURE_SIZE..]
            .try_into()
            .expect("fixed layout");

        let Ok(member) = VerifyingKey::from_bytes(&member_key) else {
            return Ok(false);
        };
        let Ok(group) = VerifyingKey::from_bytes(&group_key.0) else {
            return Ok(false);
        };

        // Member key must be certified by the group manager and the message signature must
        // verify under the member key.
        let certified = group
            .verify(&member_key, &Signature::from_bytes(&certificate))
            .is_ok();
        let signed = member
            .verify(message, &Signature::from_bytes(&message_signature))
            .is_ok();
        Ok(certified && signed)
    }
}

#[derive(Debug, Error)]
pub enum TestSchemeError {
    #[error(transparent)]
    Rng(#[from] RngError),

    #[error("malformed join message")]
    MalformedJoinMessage,

    #[error("manager certificate does not cover our member key")]
    CredentialRejected,
}
