//! Paillier keys and the proof that a Paillier modulus is well formed.

use crate::crypto::{
    math::{has_small_factor, hash_parts, is_in_multiplicative_group, random_coprime, SAMPLING_RETRY_MAX},
    CryptoError,
};
use generic_ec::{Curve, Point, Scalar};
use libpaillier::{unknown_order::BigNumber, DecryptionKey, EncryptionKey};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The number of iterations in a Paillier correctness proof.
pub const PAILLIER_PROOF_ITERATIONS: usize = 13;

/// A Paillier public key.
///
/// This is encoded as its modulus.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "BigNumber", into = "BigNumber")]
pub struct PaillierPublicKey(EncryptionKey);

impl PaillierPublicKey {
    /// Construct a public key out of its modulus.
    pub fn from_modulus(n: &BigNumber) -> Result<Self, CryptoError> {
        if n <= &BigNumber::one() {
            return Err(CryptoError::InvalidModulus("modulus must be greater than one".into()));
        }
        EncryptionKey::from_bytes(n.to_bytes()).map(Self).map_err(CryptoError::InvalidModulus)
    }

    /// The modulus `N`.
    pub fn n(&self) -> &BigNumber {
        self.0.n()
    }

    /// `N^2`.
    pub fn nn(&self) -> &BigNumber {
        self.0.nn()
    }

    /// Encrypt a plaintext in `[0, N)`, returning the ciphertext and the nonce used.
    pub fn encrypt<R: RngCore + CryptoRng>(
        &self,
        plaintext: &BigNumber,
        rng: &mut R,
    ) -> Result<(BigNumber, BigNumber), CryptoError> {
        if plaintext < &BigNumber::zero() || plaintext >= self.n() {
            return Err(CryptoError::PlaintextOutOfRange);
        }
        let nonce = random_coprime(self.n(), rng)?;
        self.0.encrypt(plaintext.to_bytes(), Some(nonce)).ok_or(CryptoError::PlaintextOutOfRange)
    }
}

impl TryFrom<BigNumber> for PaillierPublicKey {
    type Error = CryptoError;

    fn try_from(n: BigNumber) -> Result<Self, Self::Error> {
        Self::from_modulus(&n)
    }
}

impl From<PaillierPublicKey> for BigNumber {
    fn from(key: PaillierPublicKey) -> Self {
        key.n().clone()
    }
}

impl PartialEq for PaillierPublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.n() == other.n()
    }
}

impl Eq for PaillierPublicKey {}

impl fmt::Debug for PaillierPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PaillierPublicKey").field(self.n()).finish()
    }
}

/// A Paillier private key.
///
/// This is encoded as the two primes the modulus is made of.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "PaillierPrimes", into = "PaillierPrimes")]
pub struct PaillierPrivateKey {
    public_key: PaillierPublicKey,
    key: DecryptionKey,
    p: BigNumber,
    q: BigNumber,
    phi: BigNumber,
}

#[derive(Serialize, Deserialize)]
struct PaillierPrimes {
    p: BigNumber,
    q: BigNumber,
}

impl PaillierPrivateKey {
    /// Build a private key out of two distinct primes of the same size.
    pub fn from_primes(p: BigNumber, q: BigNumber) -> Result<Self, CryptoError> {
        if p == q {
            return Err(CryptoError::InvalidPrimes("p and q are equal"));
        }
        if p.bit_length() != q.bit_length() {
            return Err(CryptoError::InvalidPrimes("p and q have different sizes"));
        }
        // This checks that both are prime.
        let key = DecryptionKey::with_primes(&p, &q).ok_or(CryptoError::InvalidPrimes("p and q must be prime"))?;
        let public_key = PaillierPublicKey(EncryptionKey::from(&key));
        let phi = (&p - &BigNumber::one()) * (&q - &BigNumber::one());
        if public_key.n().gcd(&phi) != BigNumber::one() {
            return Err(CryptoError::InvalidPrimes("N and phi(N) are not coprime"));
        }
        Ok(Self { public_key, key, p, q, phi })
    }

    /// Generate a private key with a modulus of the given size.
    pub fn generate(modulus_bits: usize) -> Result<Self, CryptoError> {
        let prime_bits = modulus_bits / 2;
        for _ in 0..SAMPLING_RETRY_MAX {
            let p = BigNumber::safe_prime(prime_bits);
            let q = BigNumber::safe_prime(prime_bits);
            if p != q {
                return Self::from_primes(p, q);
            }
        }
        Err(CryptoError::SamplingFailed("paillier primes"))
    }

    /// The public key.
    pub fn public_key(&self) -> &PaillierPublicKey {
        &self.public_key
    }

    /// Decrypt a ciphertext.
    pub fn decrypt(&self, ciphertext: &BigNumber) -> Result<BigNumber, CryptoError> {
        if !is_in_multiplicative_group(self.public_key.nn(), ciphertext) {
            return Err(CryptoError::DecryptionFailed);
        }
        let plaintext = self.key.decrypt(ciphertext).ok_or(CryptoError::DecryptionFailed)?;
        Ok(BigNumber::from_slice(plaintext))
    }

    /// Prove that the modulus is well formed, binding the proof to a party's share index and the public key.
    ///
    /// Every `x_i` is derived from the inputs and `y_i = x_i^(N^-1 mod phi(N)) mod N` is revealed. Only someone who
    /// knows `phi(N)` and for which `gcd(N, phi(N)) = 1` can produce every `y_i`.
    pub fn prove_correctness<E: Curve>(&self, k: &Scalar<E>, public_key: &Point<E>) -> Result<PaillierProof, CryptoError> {
        let n = self.public_key.n();
        let exponent = n.invert(&self.phi).ok_or(CryptoError::NotInvertible)?;
        let xs = generate_xs(k, public_key, n).ok_or(CryptoError::SamplingFailed("proof challenges"))?;
        Ok(PaillierProof(xs.iter().map(|x| x.modpow(&exponent, n)).collect()))
    }
}

impl TryFrom<PaillierPrimes> for PaillierPrivateKey {
    type Error = CryptoError;

    fn try_from(primes: PaillierPrimes) -> Result<Self, Self::Error> {
        Self::from_primes(primes.p, primes.q)
    }
}

impl From<PaillierPrivateKey> for PaillierPrimes {
    fn from(key: PaillierPrivateKey) -> Self {
        Self { p: key.p, q: key.q }
    }
}

impl fmt::Debug for PaillierPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaillierPrivateKey").field("public_key", &self.public_key).finish_non_exhaustive()
    }
}

/// A proof that a Paillier modulus `N` is well formed, meaning that `gcd(N, phi(N)) = 1`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaillierProof(Vec<BigNumber>);

impl PaillierProof {
    /// Verify this proof against a public key and the share index and public key it is bound to.
    pub fn verify<E: Curve>(&self, key: &PaillierPublicKey, k: &Scalar<E>, public_key: &Point<E>) -> bool {
        let n = key.n();
        if self.0.len() != PAILLIER_PROOF_ITERATIONS || has_small_factor(n) {
            return false;
        }
        let Some(xs) = generate_xs(k, public_key, n) else {
            return false;
        };
        xs.iter().zip(&self.0).all(|(x, y)| is_in_multiplicative_group(n, y) && &y.modpow(n, n) == x)
    }

    /// The proof elements.
    pub fn elements(&self) -> &[BigNumber] {
        &self.0
    }
}

// Deterministically derive the proof challenges, each of them a member of Z*_N.
fn generate_xs<E: Curve>(k: &Scalar<E>, public_key: &Point<E>, n: &BigNumber) -> Option<Vec<BigNumber>> {
    let k = k.to_be_bytes();
    let public_key = public_key.to_bytes(true);
    let modulus = n.to_bytes();
    let blocks = n.bit_length().div_ceil(256);

    let mut xs = Vec::with_capacity(PAILLIER_PROOF_ITERATIONS);
    let mut attempt: u64 = 0;
    let max_attempts = PAILLIER_PROOF_ITERATIONS.saturating_mul(SAMPLING_RETRY_MAX) as u64;
    while xs.len() < PAILLIER_PROOF_ITERATIONS {
        if attempt >= max_attempts {
            return None;
        }
        let iteration = (xs.len() as u64).to_be_bytes();
        let attempt_bytes = attempt.to_be_bytes();
        let mut x = Vec::with_capacity(blocks.saturating_mul(32));
        for block in 0..blocks as u64 {
            let block = block.to_be_bytes();
            let parts = [
                iteration.as_slice(),
                block.as_slice(),
                attempt_bytes.as_slice(),
                k.as_ref(),
                public_key.as_ref(),
                modulus.as_slice(),
            ];
            x.extend_from_slice(&hash_parts(parts));
        }
        let x = BigNumber::from_slice(x);
        if is_in_multiplicative_group(n, &x) {
            xs.push(x);
        }
        attempt = attempt.saturating_add(1);
    }
    Some(xs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod test {
    use super::*;
    use crate::keygen::fixtures::safe_prime;
    use generic_ec::curves::Secp256k1;
    use rand::rngs::OsRng;

    type E = Secp256k1;

    fn private_key() -> PaillierPrivateKey {
        PaillierPrivateKey::from_primes(safe_prime(0), safe_prime(1)).unwrap()
    }

    fn bindings() -> (Scalar<E>, Point<E>) {
        let k = Scalar::<E>::from(7u64);
        let public_key = Point::<E>::generator() * Scalar::<E>::random(&mut OsRng);
        (k, public_key)
    }

    #[test]
    fn encryption_round_trip() {
        let key = private_key();
        let plaintext = BigNumber::from(1337u64);
        let (ciphertext, _) = key.public_key().encrypt(&plaintext, &mut OsRng).unwrap();
        assert_eq!(key.decrypt(&ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn ciphertext_format() {
        let key = private_key();
        let public_key = key.public_key();
        let plaintext = BigNumber::from(42u64);
        let (ciphertext, nonce) = public_key.encrypt(&plaintext, &mut OsRng).unwrap();
        let nn = public_key.nn();
        let gm = (BigNumber::one() + &plaintext * public_key.n()).nmod(nn);
        assert_eq!(ciphertext, gm.modmul(&nonce.modpow(public_key.n(), nn), nn));
    }

    #[test]
    fn private_key_encoding() {
        let key = private_key();
        let (ciphertext, _) = key.public_key().encrypt(&BigNumber::from(99u64), &mut OsRng).unwrap();
        let encoded = serde_json::to_string(&key).unwrap();
        let decoded: PaillierPrivateKey = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.public_key(), key.public_key());
        assert_eq!(decoded.decrypt(&ciphertext).unwrap(), BigNumber::from(99u64));

        let encoded = serde_json::to_string(key.public_key()).unwrap();
        let decoded: PaillierPublicKey = serde_json::from_str(&encoded).unwrap();
        assert_eq!(&decoded, key.public_key());
    }

    #[test]
    fn invalid_modulus() {
        assert!(PaillierPublicKey::from_modulus(&BigNumber::one()).is_err());
        assert!(PaillierPublicKey::from_modulus(&BigNumber::zero()).is_err());
    }

    #[test]
    fn plaintext_out_of_range() {
        let key = private_key();
        let plaintext = key.public_key().n().clone();
        assert_eq!(key.public_key().encrypt(&plaintext, &mut OsRng).err(), Some(CryptoError::PlaintextOutOfRange));
    }

    #[test]
    fn invalid_primes() {
        assert!(PaillierPrivateKey::from_primes(safe_prime(0), safe_prime(0)).is_err());
        let not_prime = &safe_prime(0) + &BigNumber::one();
        assert!(PaillierPrivateKey::from_primes(not_prime, safe_prime(1)).is_err());
    }

    #[test]
    fn proof_verifies() {
        let key = private_key();
        let (k, public_key) = bindings();
        let proof = key.prove_correctness(&k, &public_key).unwrap();
        assert_eq!(proof.elements().len(), PAILLIER_PROOF_ITERATIONS);
        assert!(proof.verify(key.public_key(), &k, &public_key));
    }

    #[test]
    fn proof_bound_to_share_index() {
        let key = private_key();
        let (k, public_key) = bindings();
        let proof = key.prove_correctness(&k, &public_key).unwrap();
        assert!(!proof.verify(key.public_key(), &Scalar::<E>::from(8u64), &public_key));
    }

    #[test]
    fn proof_bound_to_public_key() {
        let key = private_key();
        let (k, public_key) = bindings();
        let proof = key.prove_correctness(&k, &public_key).unwrap();
        let other_public_key = public_key + Point::<E>::generator() * Scalar::<E>::one();
        assert!(!proof.verify(key.public_key(), &k, &other_public_key));
    }

    #[test]
    fn proof_for_other_key() {
        let key = private_key();
        let other = PaillierPrivateKey::from_primes(safe_prime(2), safe_prime(3)).unwrap();
        let (k, public_key) = bindings();
        let proof = key.prove_correctness(&k, &public_key).unwrap();
        assert!(!proof.verify(other.public_key(), &k, &public_key));
    }

    #[test]
    fn tampered_proof() {
        let key = private_key();
        let (k, public_key) = bindings();
        let mut proof = key.prove_correctness(&k, &public_key).unwrap();
        if let Some(element) = proof.0.last_mut() {
            *element = element.modadd(&BigNumber::one(), key.public_key().n());
        }
        assert!(!proof.verify(key.public_key(), &k, &public_key));

        proof.0.pop();
        assert!(!proof.verify(key.public_key(), &k, &public_key));
    }

    #[test]
    fn small_factor_modulus() {
        let (k, public_key) = bindings();
        let key = PaillierPublicKey::from_modulus(&(&safe_prime(0) * &BigNumber::from(3u64))).unwrap();
        let proof = PaillierProof(vec![BigNumber::one(); PAILLIER_PROOF_ITERATIONS]);
        assert!(!proof.verify(&key, &k, &public_key));
    }
}
