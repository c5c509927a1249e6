//! Storage for the messages every round consumes.

use crate::{
    errors::KeygenError,
    keygen::messages::{KeygenMessageContent, Round1Commit, Round2DeCommit, Round2Vss, Round3PaillierProof},
};
use basic_types::{PartyJar, SlotError};
use generic_ec::Curve;
use tracing::{debug, warn};

/// The messages received during key generation, one jar per message kind.
///
/// Messages are stored as soon as they arrive, regardless of the round we're currently in. Each round only looks at
/// the jars it needs once it's reached.
#[derive(Clone, Debug)]
pub struct MessageStore<E: Curve> {
    pub(crate) commits: PartyJar<Round1Commit<E>>,
    pub(crate) shares: PartyJar<Round2Vss<E>>,
    pub(crate) decommits: PartyJar<Round2DeCommit>,
    pub(crate) proofs: PartyJar<Round3PaillierProof>,
}

impl<E: Curve> MessageStore<E> {
    /// Construct a store for the given number of parties.
    pub fn new(party_count: usize) -> Self {
        Self {
            commits: PartyJar::new(party_count),
            shares: PartyJar::new(party_count),
            decommits: PartyJar::new(party_count),
            proofs: PartyJar::new(party_count),
        }
    }

    /// Store a message sent by the party at the given index.
    ///
    /// Returns `false` if the message was not stored, either because its kind is unknown or because that party
    /// already sent a message of the same kind.
    pub fn store(&mut self, sender: usize, content: KeygenMessageContent<E>) -> Result<bool, KeygenError> {
        let kind = content.kind();
        let result = match content {
            KeygenMessageContent::Round1Commit(message) => self.commits.add_element(sender, message),
            KeygenMessageContent::Round2Vss(message) => self.shares.add_element(sender, message),
            KeygenMessageContent::Round2DeCommit(message) => self.decommits.add_element(sender, message),
            KeygenMessageContent::Round3PaillierProof(message) => self.proofs.add_element(sender, message),
            KeygenMessageContent::Unknown => {
                warn!("Ignoring message of unknown kind from party {sender}");
                return Ok(false);
            }
        };
        match result {
            Ok(()) => {
                debug!("Stored {kind} message from party {sender}");
                Ok(true)
            }
            Err(SlotError::Occupied(_)) => {
                warn!("Ignoring duplicate {kind} message from party {sender}");
                Ok(false)
            }
            Err(e @ SlotError::IndexOutOfRange { .. }) => Err(KeygenError::InvalidMessage(e.to_string())),
        }
    }

    /// The total number of messages stored.
    pub fn stored_message_count(&self) -> usize {
        [
            self.commits.stored_party_count(),
            self.shares.stored_party_count(),
            self.decommits.stored_party_count(),
            self.proofs.stored_party_count(),
        ]
        .into_iter()
        .sum()
    }
}
