//! Party identities and the messages they exchange.

use std::{
    cmp::Ordering,
    fmt,
    fmt::{Debug, Display, Formatter},
    hash::Hash,
};

/// Represents a party identifier.
///
/// Besides its opaque `id`, a party carries a `key`: the big-endian encoding of the point its share of the
/// key is evaluated at. The `index` is only meaningful once the party is part of a [SortedPartyIds], which
/// assigns it based on the party's position when all parties are sorted by key.
#[derive(Default, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartyId {
    id: Vec<u8>,
    moniker: String,
    key: Vec<u8>,
    index: usize,
}

impl PartyId {
    /// Construct a new, not yet sorted, party id.
    pub fn new(id: impl Into<Vec<u8>>, moniker: impl Into<String>, key: impl Into<Vec<u8>>) -> Self {
        Self { id: id.into(), moniker: moniker.into(), key: key.into(), index: 0 }
    }

    /// The opaque identifier.
    pub fn id(&self) -> &[u8] {
        &self.id
    }

    /// A human readable name for this party.
    pub fn moniker(&self) -> &str {
        &self.moniker
    }

    /// The big-endian encoded share evaluation point.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The position of this party within its sorted party set.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether both ids refer to the same party, regardless of the index they were assigned.
    pub fn same_party(&self, other: &PartyId) -> bool {
        self.id == other.id && compare_keys(&self.key, &other.key) == Ordering::Equal
    }
}

// Compares two big-endian encoded unsigned integers.
fn compare_keys(left: &[u8], right: &[u8]) -> Ordering {
    let left = strip_leading_zeros(left);
    let right = strip_leading_zeros(right);
    left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first_non_zero = bytes.iter().position(|byte| *byte != 0).unwrap_or(bytes.len());
    bytes.get(first_non_zero..).unwrap_or_default()
}

impl Display for PartyId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{{{},{}}}", self.index, self.moniker)
    }
}

impl Debug for PartyId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "PartyId({}, index={}, moniker={})", hex::encode(&self.id), self.index, self.moniker)
    }
}

impl From<usize> for PartyId {
    fn from(num: usize) -> PartyId {
        PartyId::new(num.to_le_bytes().to_vec(), format!("P[{num}]"), num.to_be_bytes().to_vec())
    }
}

/// A set of parties sorted by their keys.
///
/// Sorting assigns every party its index, which is then used to address it in every per party array during
/// the protocol.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SortedPartyIds(Vec<PartyId>);

impl SortedPartyIds {
    /// Sort the given parties by key and assign their indexes.
    pub fn new(parties: Vec<PartyId>) -> Self {
        let mut parties = parties;
        parties.sort_by(|left, right| compare_keys(&left.key, &right.key));
        for (index, party) in parties.iter_mut().enumerate() {
            party.index = index;
        }
        Self(parties)
    }

    /// The number of parties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the party at the given index.
    pub fn get(&self, index: usize) -> Option<&PartyId> {
        self.0.get(index)
    }

    /// Find the sorted version of the given party.
    pub fn find(&self, party: &PartyId) -> Option<&PartyId> {
        self.0.iter().find(|candidate| candidate.same_party(party))
    }

    /// Iterate the parties in index order.
    pub fn iter(&self) -> impl Iterator<Item = &PartyId> {
        self.0.iter()
    }
}

/// A message exchanged between parties.
///
/// Broadcast messages have no recipient, point to point ones are addressed to a single party.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartyMessage<T> {
    /// The sender party id.
    pub sender: PartyId,

    /// The recipient for point to point messages.
    pub recipient: Option<PartyId>,

    /// The message itself.
    pub message: T,
}

impl<T> PartyMessage<T> {
    /// Construct a broadcast message.
    pub fn broadcast(sender: PartyId, message: T) -> Self {
        Self { sender, recipient: None, message }
    }

    /// Construct a message addressed to a single party.
    pub fn point_to_point(sender: PartyId, recipient: PartyId, message: T) -> Self {
        Self { sender, recipient: Some(recipient), message }
    }

    /// Whether this message is meant for every party.
    pub fn is_broadcast(&self) -> bool {
        self.recipient.is_none()
    }

    /// Decompose this party message into its sender, recipient and inner message.
    pub fn into_parts(self) -> (PartyId, Option<PartyId>, T) {
        (self.sender, self.recipient, self.message)
    }
}
