//! The parameters a party runs a threshold protocol with.

use crate::party::{PartyId, SortedPartyIds};
use std::collections::HashSet;
use thiserror::Error;

/// The parameters for a single party in a threshold protocol.
///
/// These are validated on construction and immutable afterwards.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameters {
    parties: SortedPartyIds,
    party_id: PartyId,
    threshold: usize,
}

impl Parameters {
    /// Construct and validate a new set of parameters.
    ///
    /// `threshold` is the degree of the sharing polynomial: `threshold + 1` parties are required to
    /// reconstruct a shared secret. The given party id does not need to carry its index, it is looked up
    /// in the sorted party set.
    pub fn new(parties: SortedPartyIds, party_id: PartyId, threshold: usize) -> Result<Self, ParametersError> {
        let party_count = parties.len();
        if party_count < 2 {
            return Err(ParametersError::NotEnoughParties(party_count));
        }
        if threshold == 0 || threshold >= party_count {
            return Err(ParametersError::InvalidThreshold { threshold, party_count });
        }
        let mut ids = HashSet::new();
        let mut keys = HashSet::new();
        for party in parties.iter() {
            let key = party.key();
            if key.iter().all(|byte| *byte == 0) {
                return Err(ParametersError::ZeroKey(party.clone()));
            }
            if !ids.insert(party.id()) {
                return Err(ParametersError::DuplicateId(party.clone()));
            }
            let first_non_zero = key.iter().position(|byte| *byte != 0).unwrap_or_default();
            if !keys.insert(key.get(first_non_zero..).unwrap_or_default()) {
                return Err(ParametersError::DuplicateKey(party.clone()));
            }
        }
        let party_id = parties.find(&party_id).cloned().ok_or(ParametersError::PartyNotFound(party_id))?;
        Ok(Self { parties, party_id, threshold })
    }

    /// The sorted set of parties.
    pub fn parties(&self) -> &SortedPartyIds {
        &self.parties
    }

    /// This party's id, with its index assigned.
    pub fn party_id(&self) -> &PartyId {
        &self.party_id
    }

    /// This party's index.
    pub fn party_index(&self) -> usize {
        self.party_id.index()
    }

    /// The number of parties.
    pub fn party_count(&self) -> usize {
        self.parties.len()
    }

    /// The threshold.
    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

/// An error when constructing [Parameters].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParametersError {
    /// Not enough parties.
    #[error("at least 2 parties are required, got {0}")]
    NotEnoughParties(usize),

    /// The threshold is out of range.
    #[error("threshold {threshold} must be in [1, {party_count})")]
    InvalidThreshold {
        /// The requested threshold.
        threshold: usize,

        /// The number of parties.
        party_count: usize,
    },

    /// Two parties share an id.
    #[error("duplicate party id: {0:?}")]
    DuplicateId(PartyId),

    /// Two parties share a key.
    #[error("duplicate party key: {0:?}")]
    DuplicateKey(PartyId),

    /// A party's key is zero.
    #[error("party key is zero: {0:?}")]
    ZeroKey(PartyId),

    /// The local party is not part of the party set.
    #[error("party not found in party set: {0:?}")]
    PartyNotFound(PartyId),
}
