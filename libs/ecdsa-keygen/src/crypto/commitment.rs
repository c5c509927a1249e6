//! A hash based commitment scheme.
//!
//! A commitment to a list of secrets is `H(r, secrets...)` where `r` is 32 bytes of randomness. The commitment is
//! hiding as long as `r` is kept private and binding because of the collision resistance of the hash function.

use crate::crypto::math::hash_parts;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// The size of the commitment randomness, in bytes.
pub const COMMITMENT_RANDOMNESS_SIZE: usize = 32;

/// A commitment to a list of secrets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashCommitment([u8; 32]);

/// The opening of a [HashCommitment].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDecommitment {
    randomness: [u8; COMMITMENT_RANDOMNESS_SIZE],
    secrets: Vec<Vec<u8>>,
}

impl HashCommitment {
    /// Commit to the given secrets, returning the commitment and the decommitment that opens it.
    pub fn commit<R: RngCore + CryptoRng>(secrets: Vec<Vec<u8>>, rng: &mut R) -> (Self, HashDecommitment) {
        let mut randomness = [0; COMMITMENT_RANDOMNESS_SIZE];
        rng.fill_bytes(&mut randomness);
        let decommitment = HashDecommitment { randomness, secrets };
        (Self(decommitment.digest()), decommitment)
    }

    /// Check whether the given decommitment opens this commitment.
    pub fn verify(&self, decommitment: &HashDecommitment) -> bool {
        self.0.ct_eq(&decommitment.digest()).into()
    }
}

impl HashDecommitment {
    /// The secrets this decommitment reveals.
    pub fn secrets(&self) -> &[Vec<u8>] {
        &self.secrets
    }

    fn digest(&self) -> [u8; 32] {
        let parts = std::iter::once(self.randomness.as_slice()).chain(self.secrets.iter().map(Vec::as_slice));
        hash_parts(parts)
    }
}
