//! Implementation of errors that occur during the execution of a state machine.

use thiserror::Error;

/// A general purpose error for states that don't need their own error type.
#[derive(Error, Debug)]
pub enum StateMachineError {
    /// The state is no longer available.
    #[error(transparent)]
    StateUnavailable(#[from] StateUnavailableError),

    /// This error occurs when any unexpected error is caught
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

/// Error used when an output doesn't have the expected shape.
#[derive(Debug, Error)]
#[error("invalid state")]
pub struct InvalidStateError;

/// A state machine's state is unavailable.
///
/// This can be triggered by different reasons such as:
/// * A state transition failed, which consumes the state for good.
/// * The state machine reached a terminal state and therefore the state is gone.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("state unavailable: {0}")]
pub struct StateUnavailableError(pub &'static str);
