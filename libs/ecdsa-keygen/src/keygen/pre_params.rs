//! Parameters that can be generated ahead of a key generation run.

use crate::{
    config::KeygenConfig,
    crypto::{
        paillier::PaillierPrivateKey,
        range_proof::{RangeProofParameters, RangeProofSecrets},
        CryptoError,
    },
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A party's Paillier key and range proof parameters.
///
/// Generating these requires finding four large safe primes, which can take a long time. Callers are expected to
/// generate them ahead of time and hand them to [LocalParty::new][crate::keygen::LocalParty::new].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalPreParams {
    /// The Paillier private key.
    pub paillier_sk: PaillierPrivateKey,

    /// The range proof parameters and their trapdoor.
    pub range_proof: RangeProofSecrets,
}

impl LocalPreParams {
    /// Generate pre-parameters with the sizes in the given configuration.
    pub fn generate<R: RngCore + CryptoRng>(config: &KeygenConfig, rng: &mut R) -> Result<Self, CryptoError> {
        info!("Generating Paillier key with a {} bit modulus", config.paillier_modulus_bits);
        let paillier_sk = PaillierPrivateKey::generate(config.paillier_modulus_bits)?;
        info!("Generating range proof parameters with a {} bit modulus", config.ntilde_modulus_bits);
        let range_proof = RangeProofSecrets::generate(config.ntilde_modulus_bits, rng)?;
        Ok(Self { paillier_sk, range_proof })
    }

    /// Build pre-parameters out of the two Paillier primes and the two safe primes for the range proof modulus.
    pub fn from_safe_primes<R: RngCore + CryptoRng>(
        paillier_p: &BigNumber,
        paillier_q: &BigNumber,
        ntilde_p: &BigNumber,
        ntilde_q: &BigNumber,
        rng: &mut R,
    ) -> Result<Self, CryptoError> {
        let paillier_sk = PaillierPrivateKey::from_primes(paillier_p.clone(), paillier_q.clone())?;
        let range_proof = RangeProofSecrets::from_safe_primes(ntilde_p, ntilde_q, rng)?;
        Ok(Self { paillier_sk, range_proof })
    }

    /// Check that these parameters are internally consistent.
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.paillier_sk.public_key().n() == &self.range_proof.parameters.ntilde {
            return Err(CryptoError::InconsistentParameters("Paillier modulus and NTilde are equal"));
        }
        self.range_proof.validate()
    }

    /// The public range proof parameters.
    pub fn range_proof_parameters(&self) -> &RangeProofParameters {
        &self.range_proof.parameters
    }

    /// The size of the smallest of both moduli, in bits.
    pub fn min_modulus_bits(&self) -> usize {
        let paillier = self.paillier_sk.public_key().n().bit_length();
        let ntilde = self.range_proof.parameters.ntilde.bit_length();
        paillier.min(ntilde)
    }
}
