//! Key generation errors.

use crate::crypto::CryptoError;
use state_machine::errors::StateUnavailableError;
use std::fmt;
use thiserror::Error;

/// The proofs exchanged during key generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProofKind {
    /// A proof that the range proof generators belong to the same group.
    Dln,

    /// A proof that a Paillier modulus is well formed.
    Paillier,
}

impl fmt::Display for ProofKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dln => write!(f, "DLN"),
            Self::Paillier => write!(f, "Paillier"),
        }
    }
}

/// An error during key generation.
///
/// Every error that names a culprit is fatal: the party can't continue and the session should be aborted
/// and retried without the offending party.
#[derive(Error, Debug)]
pub enum KeygenError {
    /// The party could not be constructed.
    #[error("construction failed: {0}")]
    Construction(String),

    /// The party is not in a state where the operation can be performed.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// A message's envelope is invalid.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A party's decommitment does not open its commitment.
    #[error("round {round}: commitment mismatch for party {culprit}")]
    CommitmentMismatch {
        /// The round the error happened in.
        round: u8,

        /// The offending party's index.
        culprit: usize,
    },

    /// A party sent us a share that doesn't match its polynomial commitments.
    #[error("round {round}: invalid share from party {culprit}")]
    InvalidShare {
        /// The round the error happened in.
        round: u8,

        /// The offending party's index.
        culprit: usize,
    },

    /// A party sent an invalid proof.
    #[error("round {round}: invalid {kind} proof from party {culprit}")]
    InvalidProof {
        /// The round the error happened in.
        round: u8,

        /// The offending party's index.
        culprit: usize,

        /// The kind of proof.
        kind: ProofKind,
    },

    /// A party's range proof parameters are malformed.
    #[error("round {round}: invalid range proof parameters from party {culprit}: {reason}")]
    InvalidRangeProofParams {
        /// The round the error happened in.
        round: u8,

        /// The offending party's index.
        culprit: usize,

        /// Why they're invalid.
        reason: &'static str,
    },

    /// A party's Paillier or range proof modulus is too small.
    #[error("round {round}: modulus from party {culprit} is too small ({bits} bits)")]
    WeakModulus {
        /// The round the error happened in.
        round: u8,

        /// The offending party's index.
        culprit: usize,

        /// The size of the modulus.
        bits: usize,
    },

    /// A party claims a share id that is not the one it was assigned.
    #[error("round {round}: party {culprit} claims the wrong share id")]
    ShareIdMismatch {
        /// The round the error happened in.
        round: u8,

        /// The offending party's index.
        culprit: usize,
    },

    /// Two parties have the same share id.
    #[error("duplicate share id")]
    DuplicateShareId,

    /// Our share id is not part of the save data.
    #[error("share id not found in save data")]
    IndexRecovery,

    /// A channel we were sending on was closed.
    #[error("{0} channel dropped")]
    ChannelDropped(&'static str),

    /// The party's state is gone, either because it finished or because a previous error consumed it.
    #[error(transparent)]
    StateUnavailable(#[from] StateUnavailableError),

    /// A cryptographic primitive failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// An unexpected error.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl KeygenError {
    /// The index of the party that caused this error, if any.
    pub fn culprit(&self) -> Option<usize> {
        use KeygenError::*;
        match self {
            CommitmentMismatch { culprit, .. }
            | InvalidShare { culprit, .. }
            | InvalidProof { culprit, .. }
            | InvalidRangeProofParams { culprit, .. }
            | WeakModulus { culprit, .. }
            | ShareIdMismatch { culprit, .. } => Some(*culprit),
            _ => None,
        }
    }

    /// The round this error happened in, if it is tied to one.
    pub fn round(&self) -> Option<u8> {
        use KeygenError::*;
        match self {
            CommitmentMismatch { round, .. }
            | InvalidShare { round, .. }
            | InvalidProof { round, .. }
            | InvalidRangeProofParams { round, .. }
            | WeakModulus { round, .. }
            | ShareIdMismatch { round, .. } => Some(*round),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn culprits() {
        let error = KeygenError::InvalidProof { round: 3, culprit: 2, kind: ProofKind::Paillier };
        assert_eq!(error.culprit(), Some(2));
        assert_eq!(error.round(), Some(3));
        assert_eq!(error.to_string(), "round 3: invalid Paillier proof from party 2");

        let error = KeygenError::InvalidState("party already started or corrupted");
        assert_eq!(error.culprit(), None);
        assert_eq!(error.round(), None);
    }
}
