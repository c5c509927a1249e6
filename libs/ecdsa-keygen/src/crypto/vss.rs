//! Feldman verifiable secret sharing.
//!
//! A secret `s` is shared by sampling a random polynomial `f` of degree `threshold` such that `f(0) = s` and handing
//! `f(k_j)` to every party `j`. The commitments to the polynomial's coefficients, `vs[c] = G * a_c`, are published so
//! any party can verify its share without learning anything about the secret. Any `threshold + 1` shares reconstruct
//! the secret.

use crate::crypto::CryptoError;
use generic_ec::{Curve, Point, Scalar};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A share of a secret.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Share<E: Curve> {
    /// The point the polynomial was evaluated at.
    pub id: Scalar<E>,

    /// The polynomial evaluated at `id`.
    pub value: Scalar<E>,
}

impl<E: Curve> Share<E> {
    /// Verify this share against the polynomial coefficient commitments.
    pub fn verify(&self, threshold: usize, vs: &[Point<E>]) -> bool {
        if vs.len() != threshold.saturating_add(1) {
            return false;
        }
        Point::<E>::generator() * self.value == evaluate_commitments(vs, &self.id)
    }
}

/// The output of sharing a secret.
pub struct VerifiableShares<E: Curve> {
    /// The commitments to the polynomial coefficients, the constant term being first.
    pub vs: Vec<Point<E>>,

    /// One share per evaluation point, in the same order they were provided.
    pub shares: Vec<Share<E>>,
}

/// Share a secret among the given evaluation points using a random polynomial of degree `threshold`.
pub fn create<E: Curve, R: RngCore + CryptoRng>(
    threshold: usize,
    secret: &Scalar<E>,
    indexes: &[Scalar<E>],
    rng: &mut R,
) -> Result<VerifiableShares<E>, CryptoError> {
    if threshold >= indexes.len() {
        return Err(CryptoError::InvalidThreshold { threshold, share_count: indexes.len() });
    }
    check_indexes(indexes)?;

    let mut coefficients = Vec::with_capacity(threshold.saturating_add(1));
    coefficients.push(*secret);
    coefficients.extend(std::iter::repeat_with(|| Scalar::<E>::random(rng)).take(threshold));

    let vs = coefficients.iter().map(|coefficient| Point::<E>::generator() * coefficient).collect();
    let shares = indexes.iter().map(|id| Share { id: *id, value: evaluate_polynomial(&coefficients, id) }).collect();
    Ok(VerifiableShares { vs, shares })
}

/// Evaluate the committed polynomial "in the exponent", getting `G * f(x)`.
pub fn evaluate_commitments<E: Curve>(vs: &[Point<E>], x: &Scalar<E>) -> Point<E> {
    vs.iter().rev().fold(Point::zero(), |accumulator, coefficient| accumulator * x + coefficient)
}

/// Reconstruct the secret out of at least `threshold + 1` shares via Lagrange interpolation at zero.
pub fn reconstruct<E: Curve>(threshold: usize, shares: &[Share<E>]) -> Result<Scalar<E>, CryptoError> {
    let needed = threshold.saturating_add(1);
    if shares.len() < needed {
        return Err(CryptoError::NotEnoughShares { needed, provided: shares.len() });
    }
    let indexes: Vec<_> = shares.iter().map(|share| share.id).collect();
    check_indexes(&indexes)?;

    let mut secret = Scalar::zero();
    for share in shares {
        let mut numerator = Scalar::<E>::one();
        let mut denominator = Scalar::<E>::one();
        for other in shares.iter().filter(|other| other.id != share.id) {
            numerator = numerator * other.id;
            denominator = denominator * (other.id - share.id);
        }
        let inverse = denominator.invert().ok_or(CryptoError::NotInvertible)?;
        secret = secret + share.value * numerator * inverse;
    }
    Ok(secret)
}

fn evaluate_polynomial<E: Curve>(coefficients: &[Scalar<E>], x: &Scalar<E>) -> Scalar<E> {
    coefficients.iter().rev().fold(Scalar::zero(), |accumulator, coefficient| accumulator * x + coefficient)
}

fn check_indexes<E: Curve>(indexes: &[Scalar<E>]) -> Result<(), CryptoError> {
    let mut seen = HashSet::new();
    for index in indexes {
        if *index == Scalar::zero() {
            return Err(CryptoError::ZeroShareIndex);
        }
        if !seen.insert(index.to_be_bytes().as_ref().to_vec()) {
            return Err(CryptoError::DuplicateShareIndex);
        }
    }
    Ok(())
}
