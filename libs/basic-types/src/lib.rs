//! Basic types shared by the key generation crates.

#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::iterator_step_by_zero,
    clippy::invalid_regex,
    clippy::string_slice,
    clippy::unimplemented,
    clippy::todo
)]

pub mod jar;
pub mod parameters;
pub mod party;

pub use jar::{PartyJar, SlotError};
pub use parameters::{Parameters, ParametersError};
pub use party::{PartyId, PartyMessage, SortedPartyIds};
