//! The messages exchanged during key generation.

use crate::crypto::{
    commitment::{HashCommitment, HashDecommitment},
    paillier::{PaillierProof, PaillierPublicKey},
    range_proof::DlnProof,
    vss::Share,
};
use basic_types::PartyMessage;
use generic_ec::{Curve, Scalar};
use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Serialize};

/// A key generation message along with its sender and recipient.
pub type KeygenMessage<E> = PartyMessage<KeygenMessageContent<E>>;

/// The contents of a key generation message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", bound = "")]
pub enum KeygenMessageContent<E: Curve> {
    /// The round 1 broadcast.
    Round1Commit(Round1Commit<E>),

    /// The round 2 point to point message carrying the recipient's share.
    Round2Vss(Round2Vss<E>),

    /// The round 2 broadcast opening the round 1 commitment.
    Round2DeCommit(Round2DeCommit),

    /// The round 3 broadcast.
    Round3PaillierProof(Round3PaillierProof),

    /// A message we don't know about, most likely sent by a newer version of this protocol.
    #[serde(other)]
    Unknown,
}

impl<E: Curve> KeygenMessageContent<E> {
    /// A name for this message's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Round1Commit(_) => "Round1Commit",
            Self::Round2Vss(_) => "Round2Vss",
            Self::Round2DeCommit(_) => "Round2DeCommit",
            Self::Round3PaillierProof(_) => "Round3PaillierProof",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether this message must be addressed to a single party.
    pub fn is_point_to_point(&self) -> bool {
        matches!(self, Self::Round2Vss(_))
    }
}

/// The commitment to the sender's polynomial along with its auxiliary public parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Round1Commit<E: Curve> {
    /// The commitment to the polynomial coefficient commitments.
    pub commitment: HashCommitment,

    /// The sender's Paillier public key.
    pub paillier_pk: PaillierPublicKey,

    /// The range proof modulus.
    pub ntilde: BigNumber,

    /// The first range proof generator.
    pub h1: BigNumber,

    /// The second range proof generator.
    pub h2: BigNumber,

    /// The proof that `h2` is generated by `h1`.
    pub dln_proof_1: DlnProof,

    /// The proof that `h1` is generated by `h2`.
    pub dln_proof_2: DlnProof,

    /// The sender's share evaluation point.
    pub share_id: Scalar<E>,
}

/// The recipient's share of the sender's secret.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Round2Vss<E: Curve> {
    /// The share.
    pub share: Share<E>,
}

/// The opening of the sender's round 1 commitment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Round2DeCommit {
    /// The decommitment, revealing the compressed polynomial coefficient commitments.
    pub decommitment: HashDecommitment,
}

/// The proof that the sender's Paillier modulus is well formed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Round3PaillierProof {
    /// The proof.
    pub proof: PaillierProof,
}
