// SPDX-License-Identifier: MIT OR Apache-2.0

//! Group Authority: owns the group credential and issues member credentials through the
//! 3-message join handshake.
//!
//! Join state per client identity moves through `NoRecord → TokenIssued → Completed` and
//! `Completed` is terminal; no operation removes or resets a record once created. All validation
//! happens before any mutation, so a failed call leaves the state exactly as it was. The state
//! object is serializable so deployments can persist it across restarts; losing it strands every
//! member of the group.
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::crypto::{Rng, RngError};
use crate::identity::ClientIdentity;
use crate::traits::{GroupCredential, GroupScheme};
use crate::wire::JoinOffer;

/// Driver for all manager-side operations of one group.
#[derive(Debug)]
pub struct Authority<GS> {
    _marker: PhantomData<GS>,
}

/// Serializable state of the Group Authority (group credential plus join-token table).
#[derive(Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct AuthorityState<GS>
where
    GS: GroupScheme,
{
    credential: GroupCredential<GS>,
    tokens: HashMap<ClientIdentity, JoinRecord>,
}

/// Join-handshake progress of one client identity.
///
/// Persisted by the authority for the lifetime of the group.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct JoinRecord {
    completed: bool,
    token: String,
}

impl<GS> Authority<GS>
where
    GS: GroupScheme,
{
    /// Create a fresh group credential: manager key, group public key and empty member registry.
    ///
    /// Called at most once per deployment. Passing previously persisted state is a fatal misuse
    /// error: bootstrapping over a live group would orphan every issued member credential.
    pub fn bootstrap(
        existing: Option<AuthorityState<GS>>,
        rng: &Rng,
    ) -> Result<AuthorityState<GS>, AuthorityError<GS>> {
        if existing.is_some() {
            return Err(AuthorityError::AlreadyBootstrapped);
        }
        let credential = GS::setup(rng).map_err(AuthorityError::Scheme)?;
        Ok(AuthorityState {
            credential,
            tokens: HashMap::new(),
        })
    }

    /// The group public key, the only piece of the credential ever exported.
    pub fn group_public_key(y: &AuthorityState<GS>) -> &GS::GroupPublicKey {
        y.credential.public_key()
    }

    /// First manager-side step of the join handshake.
    ///
    /// Generates message 1 and mints a fresh single-use token for an identity with no join
    /// record. An identity that already received a token (or completed the handshake) gets an
    /// error and no new token: the existing record stays untouched.
    pub fn join_start(
        y: &mut AuthorityState<GS>,
        client: ClientIdentity,
        rng: &Rng,
    ) -> Result<JoinOffer, AuthorityError<GS>> {
        if let Some(record) = y.tokens.get(&client) {
            return Err(if record.completed {
                AuthorityError::AlreadyCompleted
            } else {
                AuthorityError::AlreadyIssued
            });
        }

        // Token is minted before the scheme runs so a failed draw cannot leave a registry entry
        // with no token tracking it.
        let token = uuid::Builder::from_random_bytes(rng.random_array()?)
            .into_uuid()
            .to_string();

        let message = GS::join_offer(
            &y.credential.manager_key,
            &y.credential.public_key,
            &mut y.credential.registry,
            rng,
        )
        .map_err(AuthorityError::Scheme)?;

        y.tokens.insert(
            client,
            JoinRecord {
                completed: false,
                token: token.clone(),
            },
        );
        debug!(client = %client, "issued join token");

        Ok(JoinOffer { token, message })
    }

    /// Second manager-side step of the join handshake.
    ///
    /// Validates identity, token and completion state before touching anything; a mismatch
    /// returns a descriptive error and changes no state. On success the member is registered and
    /// the final credential material (message 3) returned, marking the record `Completed`.
    pub fn join_finish(
        y: &mut AuthorityState<GS>,
        client: ClientIdentity,
        token: &str,
        response: &[u8],
    ) -> Result<Vec<u8>, AuthorityError<GS>> {
        let Some(record) = y.tokens.get_mut(&client) else {
            return Err(AuthorityError::UnknownIdentity);
        };
        if record.token != token {
            return Err(AuthorityError::InvalidToken);
        }
        if record.completed {
            return Err(AuthorityError::AlreadyCompleted);
        }

        let accept = GS::join_accept(
            &y.credential.manager_key,
            &y.credential.public_key,
            &mut y.credential.registry,
            response,
        )
        .map_err(AuthorityError::Scheme)?;

        record.completed = true;
        debug!(client = %client, "join handshake completed");

        Ok(accept)
    }
}

#[derive(Error)]
pub enum AuthorityError<GS>
where
    GS: GroupScheme,
{
    #[error("group credential state already exists, refusing to bootstrap over it")]
    AlreadyBootstrapped,

    #[error("join token already issued for this identity, continue with join_finish")]
    AlreadyIssued,

    #[error("join handshake already completed for this identity")]
    AlreadyCompleted,

    #[error("identity has no join record, start the handshake with join_start")]
    UnknownIdentity,

    #[error("join token does not match the one issued for this identity")]
    InvalidToken,

    #[error(transparent)]
    Rng(#[from] RngError),

    #[error(transparent)]
    Scheme(GS::Error),
}

// Implemented by hand so the error stays a `std::error::Error` for schemes that are not
// themselves `Debug`; a derive would put a `GS: Debug` bound on it.
impl<GS> fmt::Debug for AuthorityError<GS>
where
    GS: GroupScheme,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyBootstrapped => write!(f, "AlreadyBootstrapped"),
            Self::AlreadyIssued => write!(f, "AlreadyIssued"),
            Self::AlreadyCompleted => write!(f, "AlreadyCompleted"),
            Self::UnknownIdentity => write!(f, "UnknownIdentity"),
            Self::InvalidToken => write!(f, "InvalidToken"),
            Self::Rng(err) => f.debug_tuple("Rng").field(err).finish(),
            Self::Scheme(err) => f.debug_tuple("Scheme").field(err).finish(),
        }
    }
}
