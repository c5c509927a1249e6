//! The cryptographic building blocks used during key generation.

pub mod commitment;
pub mod math;
pub mod paillier;
pub mod range_proof;
pub mod vss;

use thiserror::Error;

/// An error produced by one of the cryptographic primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The sharing threshold is not lower than the number of shares.
    #[error("threshold {threshold} must be lower than the share count {share_count}")]
    InvalidThreshold {
        /// The threshold.
        threshold: usize,

        /// The number of shares.
        share_count: usize,
    },

    /// A share evaluation point is zero.
    #[error("share index is zero")]
    ZeroShareIndex,

    /// Two share evaluation points are the same.
    #[error("duplicate share index")]
    DuplicateShareIndex,

    /// Not enough shares were provided to reconstruct a secret.
    #[error("need {needed} shares, got {provided}")]
    NotEnoughShares {
        /// The number of shares needed.
        needed: usize,

        /// The number of shares provided.
        provided: usize,
    },

    /// The provided primes can't be used to build a key.
    #[error("invalid primes: {0}")]
    InvalidPrimes(&'static str),

    /// A Paillier modulus can't be used to build a key.
    #[error("invalid modulus: {0}")]
    InvalidModulus(String),

    /// A value that must be invertible is not.
    #[error("value is not invertible")]
    NotInvertible,

    /// A plaintext is out of the range supported by a key.
    #[error("plaintext out of range")]
    PlaintextOutOfRange,

    /// A ciphertext could not be decrypted.
    #[error("decryption failed")]
    DecryptionFailed,

    /// Pre-generated parameters are inconsistent.
    #[error("inconsistent parameters: {0}")]
    InconsistentParameters(&'static str),

    /// Sampling a value took too many attempts.
    #[error("too many attempts sampling {0}")]
    SamplingFailed(&'static str),
}
