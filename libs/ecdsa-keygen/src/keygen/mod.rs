//! The key generation protocol.
//!
//! The protocol runs in three rounds:
//!
//! 1. Every party shares a random secret using a degree `threshold` polynomial and broadcasts a commitment to the
//!    polynomial's coefficient commitments, along with its Paillier public key and range proof parameters.
//! 2. Every party sends each other party its share and broadcasts the opening of its commitment. Shares are verified
//!    against the opened coefficient commitments and added up into our share of the private key.
//! 3. Every party proves its Paillier modulus is well formed, binding the proof to the public key.

pub mod messages;
pub mod party;
pub mod pre_params;
pub mod save_data;
mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod fixtures;
#[cfg(test)]
pub(crate) mod simulator;

pub use messages::{KeygenMessage, KeygenMessageContent};
pub use party::LocalParty;
pub use pre_params::LocalPreParams;
pub use save_data::LocalPartySaveData;
