//! The output of a key generation run.

use crate::{
    crypto::paillier::{PaillierPrivateKey, PaillierPublicKey},
    errors::KeygenError,
};
use generic_ec::{Curve, Point, Scalar};
use libpaillier::unknown_order::BigNumber;
use serde::{Deserialize, Serialize};

/// The key material a party ends up with after a successful key generation run.
///
/// Every per party array is indexed by the party's index in the session's sorted party set.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct LocalPartySaveData<E: Curve> {
    /// Our share of the private key.
    pub xi: Scalar<E>,

    /// The point our share was evaluated at.
    pub share_id: Scalar<E>,

    /// Our Paillier private key.
    pub paillier_sk: PaillierPrivateKey,

    /// `G * x_j` for every party.
    pub big_xj: Vec<Point<E>>,

    /// Every party's Paillier public key.
    pub paillier_pks: Vec<PaillierPublicKey>,

    /// Every party's range proof modulus.
    pub ntilde_j: Vec<BigNumber>,

    /// Every party's first range proof generator.
    pub h1_j: Vec<BigNumber>,

    /// Every party's second range proof generator.
    pub h2_j: Vec<BigNumber>,

    /// Every party's share evaluation point.
    pub ks: Vec<Scalar<E>>,

    /// The public key.
    pub ecdsa_pub: Point<E>,
}

impl<E: Curve> LocalPartySaveData<E> {
    /// Find our position in the party set this key was generated with.
    ///
    /// This is the stable identifier for this party in later signing sessions, which may involve a different
    /// subset of the parties.
    pub fn original_index(&self) -> Result<usize, KeygenError> {
        self.ks.iter().position(|k| k == &self.share_id).ok_or(KeygenError::IndexRecovery)
    }
}
