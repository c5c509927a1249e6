//! Big number helpers.

use crate::crypto::CryptoError;
use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha512_256};

/// The maximum number of attempts when sampling values that must satisfy some property.
pub(crate) const SAMPLING_RETRY_MAX: usize = 500;

/// The primes below 1000, used to screen moduli for small factors.
pub(crate) const SMALL_PRIMES: [u64; 168] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97, 101, 103, 107, 109,
    113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223, 227, 229, 233, 239,
    241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307, 311, 313, 317, 331, 337, 347, 349, 353, 359, 367, 373, 379,
    383, 389, 397, 401, 409, 419, 421, 431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503, 509, 521,
    523, 541, 547, 557, 563, 569, 571, 577, 587, 593, 599, 601, 607, 613, 617, 619, 631, 641, 643, 647, 653, 659, 661,
    673, 677, 683, 691, 701, 709, 719, 727, 733, 739, 743, 751, 757, 761, 769, 773, 787, 797, 809, 811, 821, 823, 827,
    829, 839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911, 919, 929, 937, 941, 947, 953, 967, 971, 977, 983, 991,
    997,
];

/// Returns `true` if `n` is divisible by any prime below 1000.
pub fn has_small_factor(n: &BigNumber) -> bool {
    SMALL_PRIMES.iter().any(|prime| n.nmod(&BigNumber::from(*prime)) == BigNumber::zero())
}

/// Returns `true` if `x` is a member of the multiplicative group of integers modulo `n`.
pub fn is_in_multiplicative_group(n: &BigNumber, x: &BigNumber) -> bool {
    x > &BigNumber::zero() && x < n && x.gcd(n) == BigNumber::one()
}

/// Sample a number uniformly at random from the multiplicative group of integers modulo `n`.
pub fn random_coprime<R: RngCore + CryptoRng>(n: &BigNumber, rng: &mut R) -> Result<BigNumber, CryptoError> {
    std::iter::repeat_with(|| BigNumber::from_rng(n, rng))
        .take(SAMPLING_RETRY_MAX)
        .find(|candidate| is_in_multiplicative_group(n, candidate))
        .ok_or(CryptoError::SamplingFailed("coprime"))
}

/// Get the (p - 1) / 2 prime out of a safe prime p.
pub fn sophie_germain_prime(safe_prime: &BigNumber) -> BigNumber {
    (safe_prime - &BigNumber::one()) / BigNumber::from(2u64)
}

/// SHA-512/256 over a list of byte strings.
///
/// Every part is prefixed by its length so the encoding of the list is unambiguous.
pub fn hash_parts<'a, I>(parts: I) -> [u8; 32]
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut hasher = Sha512_256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// SHA-512/256 over a list of big numbers, interpreted as a big number.
pub fn hash_numbers<'a, I>(numbers: I) -> [u8; 32]
where
    I: IntoIterator<Item = &'a BigNumber>,
{
    let encoded: Vec<Vec<u8>> = numbers.into_iter().map(BigNumber::to_bytes).collect();
    hash_parts(encoded.iter().map(Vec::as_slice))
}

/// Get the bit at the given position of a big-endian encoded number, where bit 0 is the least significant one.
pub fn bit_at(bytes: &[u8], position: usize) -> bool {
    let byte_position = bytes.len().checked_sub(1 + position / 8);
    match byte_position.and_then(|index| bytes.get(index)) {
        Some(byte) => (byte >> (position % 8)) & 1 == 1,
        None => false,
    }
}
