//! Range proof parameters and the discrete log proofs that show they are well formed.
//!
//! The parameters are a modulus `NTilde = P * Q`, where `P = 2p + 1` and `Q = 2q + 1` are safe primes, and two
//! generators `h1`, `h2` of the subgroup of quadratic residues modulo `NTilde`, such that `h2 = h1^alpha` and
//! `h1 = h2^beta`. Every party proves both relations so the range proofs built on top of them during signing are sound.

use crate::crypto::{
    math::{bit_at, hash_numbers, random_coprime, sophie_germain_prime, SAMPLING_RETRY_MAX},
    CryptoError,
};
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// The number of iterations in a DLN proof.
pub const DLN_PROOF_ITERATIONS: usize = 128;

/// The public range proof parameters of a party.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeProofParameters {
    /// The modulus.
    pub ntilde: BigNumber,

    /// The first generator.
    pub h1: BigNumber,

    /// The second generator.
    pub h2: BigNumber,
}

impl RangeProofParameters {
    /// Check that the parameters are in range: `h1 != h2` and both in `(1, NTilde)`.
    pub fn check(&self) -> Result<(), &'static str> {
        let one = BigNumber::one();
        if self.h1 == self.h2 {
            return Err("h1 and h2 are equal");
        }
        if self.h1 <= one || self.h1 >= self.ntilde {
            return Err("h1 out of range");
        }
        if self.h2 <= one || self.h2 >= self.ntilde {
            return Err("h2 out of range");
        }
        Ok(())
    }
}

/// The range proof parameters along with the trapdoor that was used to build them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RangeProofSecrets {
    /// The public parameters.
    pub parameters: RangeProofParameters,

    /// `h2 = h1^alpha mod NTilde`.
    pub alpha: BigNumber,

    /// `alpha^-1 mod pq`.
    pub beta: BigNumber,

    /// `(P - 1) / 2`.
    pub p: BigNumber,

    /// `(Q - 1) / 2`.
    pub q: BigNumber,
}

impl RangeProofSecrets {
    /// Generate parameters with a modulus of the given size.
    pub fn generate<R: RngCore + CryptoRng>(modulus_bits: usize, rng: &mut R) -> Result<Self, CryptoError> {
        let prime_bits = modulus_bits / 2;
        for _ in 0..SAMPLING_RETRY_MAX {
            let p = BigNumber::safe_prime(prime_bits);
            let q = BigNumber::safe_prime(prime_bits);
            if p != q {
                return Self::from_safe_primes(&p, &q, rng);
            }
        }
        Err(CryptoError::SamplingFailed("range proof primes"))
    }

    /// Build parameters out of two distinct safe primes.
    pub fn from_safe_primes<R: RngCore + CryptoRng>(
        safe_p: &BigNumber,
        safe_q: &BigNumber,
        rng: &mut R,
    ) -> Result<Self, CryptoError> {
        if safe_p == safe_q {
            return Err(CryptoError::InvalidPrimes("P and Q are equal"));
        }
        let p = sophie_germain_prime(safe_p);
        let q = sophie_germain_prime(safe_q);
        if !safe_p.is_prime() || !safe_q.is_prime() || !p.is_prime() || !q.is_prime() {
            return Err(CryptoError::InvalidPrimes("P and Q must be safe primes"));
        }
        let ntilde = safe_p * safe_q;
        let pq = &p * &q;

        let f1 = random_coprime(&ntilde, rng)?;
        let h1 = f1.modmul(&f1, &ntilde);
        let (alpha, beta) = std::iter::repeat_with(|| random_coprime(&ntilde, rng))
            .take(SAMPLING_RETRY_MAX)
            .filter_map(Result::ok)
            .find_map(|alpha| alpha.invert(&pq).map(|beta| (alpha, beta)))
            .ok_or(CryptoError::SamplingFailed("alpha"))?;
        let h2 = h1.modpow(&alpha, &ntilde);

        let secrets = Self { parameters: RangeProofParameters { ntilde, h1, h2 }, alpha, beta, p, q };
        secrets.validate()?;
        Ok(secrets)
    }

    /// Check that these parameters are internally consistent.
    pub fn validate(&self) -> Result<(), CryptoError> {
        let RangeProofParameters { ntilde, h1, h2 } = &self.parameters;
        let two = BigNumber::from(2u64);
        let safe_p = &(&self.p * &two) + &BigNumber::one();
        let safe_q = &(&self.q * &two) + &BigNumber::one();
        if &(&safe_p * &safe_q) != ntilde {
            return Err(CryptoError::InconsistentParameters("NTilde != PQ"));
        }
        if &h1.modpow(&self.alpha, ntilde) != h2 {
            return Err(CryptoError::InconsistentParameters("h2 != h1^alpha"));
        }
        if self.alpha.modmul(&self.beta, &(&self.p * &self.q)) != BigNumber::one() {
            return Err(CryptoError::InconsistentParameters("alpha * beta != 1 mod pq"));
        }
        self.parameters.check().map_err(CryptoError::InconsistentParameters)
    }

    /// Build the proofs that `h2 = h1^alpha` and `h1 = h2^beta`, in that order.
    pub fn prove<R: RngCore + CryptoRng>(&self, rng: &mut R) -> (DlnProof, DlnProof) {
        let RangeProofParameters { ntilde, h1, h2 } = &self.parameters;
        let first = DlnProof::prove(h1, h2, &self.alpha, &self.p, &self.q, ntilde, rng);
        let second = DlnProof::prove(h2, h1, &self.beta, &self.p, &self.q, ntilde, rng);
        (first, second)
    }
}

/// A non interactive proof of knowledge of `x` such that `h2 = h1^x mod N`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DlnProof {
    alpha: Vec<BigNumber>,
    t: Vec<BigNumber>,
}

impl DlnProof {
    /// Prove knowledge of `x` such that `h2 = h1^x mod n`, where `n = (2p + 1)(2q + 1)`.
    pub fn prove<R: RngCore + CryptoRng>(
        h1: &BigNumber,
        h2: &BigNumber,
        x: &BigNumber,
        p: &BigNumber,
        q: &BigNumber,
        n: &BigNumber,
        rng: &mut R,
    ) -> Self {
        let pq = p * q;
        let a: Vec<BigNumber> = (0..DLN_PROOF_ITERATIONS).map(|_| BigNumber::from_rng(&pq, rng)).collect();
        let alpha: Vec<BigNumber> = a.iter().map(|a| h1.modpow(a, n)).collect();
        let challenge = challenge(h1, h2, n, &alpha);
        let t = a
            .iter()
            .enumerate()
            .map(|(i, a)| if bit_at(&challenge, i) { a.modadd(x, &pq) } else { a.nmod(&pq) })
            .collect();
        Self { alpha, t }
    }

    /// Verify this proof.
    pub fn verify(&self, h1: &BigNumber, h2: &BigNumber, n: &BigNumber) -> bool {
        let zero = BigNumber::zero();
        let one = BigNumber::one();
        if n <= &zero || h1 == h2 || h1 <= &one || h1 >= n || h2 <= &one || h2 >= n {
            return false;
        }
        if self.alpha.len() != DLN_PROOF_ITERATIONS || self.t.len() != DLN_PROOF_ITERATIONS {
            return false;
        }
        let in_range = |value: &BigNumber| value >= &zero && value < n;
        if !self.alpha.iter().all(|alpha| alpha > &one && in_range(alpha)) || !self.t.iter().all(in_range) {
            return false;
        }
        let challenge = challenge(h1, h2, n, &self.alpha);
        self.alpha.iter().zip(&self.t).enumerate().all(|(i, (alpha, t))| {
            let left = h1.modpow(t, n);
            let right = if bit_at(&challenge, i) { alpha.modmul(h2, n) } else { alpha.clone() };
            left == right
        })
    }
}

fn challenge(h1: &BigNumber, h2: &BigNumber, n: &BigNumber, alpha: &[BigNumber]) -> [u8; 32] {
    hash_numbers([h1, h2, n].into_iter().chain(alpha))
}
