//! Threshold ECDSA distributed key generation.
//!
//! This crate implements the role of a single party in a three round distributed key generation protocol. Every
//! party ends up with a Feldman share of a private key that no coalition of `threshold` or fewer parties can
//! reconstruct, along with the auxiliary Paillier key and range proof parameters the signing protocol needs.
//!
//! The entry point is [LocalParty][crate::keygen::LocalParty].

#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::iterator_step_by_zero,
    clippy::invalid_regex,
    clippy::string_slice,
    clippy::unimplemented,
    clippy::todo
)]

pub mod config;
pub mod crypto;
pub mod errors;
pub mod keygen;

pub use config::KeygenConfig;
pub use errors::{KeygenError, ProofKind};
pub use generic_ec::{self, Curve};
pub use keygen::{KeygenMessage, KeygenMessageContent, LocalParty, LocalPartySaveData, LocalPreParams};
pub use libpaillier::unknown_order::BigNumber;
