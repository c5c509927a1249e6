//! State machine definitions.

use crate::{
    errors::{InvalidStateError, StateUnavailableError},
    state::{RecipientMessage, StateMachineMessage, StateMachineState, StateMachineStateOutput},
};
use std::fmt::Formatter;

// A thin wrapper of the state. This lets us have visibility into why the state was taken to
// provide better error messages.
enum StateMachineInner<S> {
    Taken,
    State(S),
    Finalized,
}

impl<S> StateMachineInner<S> {
    fn state(&self) -> Result<&S, StateUnavailableError> {
        if let Self::State(state) = self { Ok(state) } else { Err(self.as_error()) }
    }

    fn state_mut(&mut self) -> Result<&mut S, StateUnavailableError> {
        if let Self::State(state) = self { Ok(state) } else { Err(self.as_error()) }
    }

    fn into_state(self) -> Result<S, StateUnavailableError> {
        if let Self::State(state) = self { Ok(state) } else { Err(self.as_error()) }
    }

    fn take_state(&mut self) -> Result<S, StateUnavailableError> {
        let state = std::mem::replace(self, StateMachineInner::Taken);
        if let Self::State(state) = state { Ok(state) } else { Err(state.as_error()) }
    }

    fn as_error(&self) -> StateUnavailableError {
        let detail = match self {
            Self::Taken => "state is taken",
            Self::Finalized => "state machine reached terminal state",
            // This shouldn't happen but we don't want to make this fallible for this dummy error.
            Self::State(_) => "internal error",
        };
        StateUnavailableError(detail)
    }
}

/// Implementation of a state machine.
///
/// This is the single driver for a [StateMachineState]: every call hands the state a message (or starts it) and
/// then keeps advancing it for as long as the current round is completed. This makes the protocol purely message
/// driven: a single message can move the state forward several rounds if the messages those rounds need were
/// already stored.
///
/// If any call fails the state is dropped and every subsequent call returns a [StateUnavailableError].
pub struct StateMachine<S: StateMachineState> {
    inner: StateMachineInner<S>,
}

impl<S: StateMachineState> StateMachine<S> {
    /// Create a new state machine.
    pub fn new(initial_state: S) -> Self {
        StateMachine { inner: StateMachineInner::State(initial_state) }
    }

    /// Try to get an immutable reference to the current state.
    ///
    /// This will return an error if the state machine reached a terminal state or an unrecoverable error
    /// occurred during a previous call.
    pub fn state(&self) -> Result<&S, StateUnavailableError> {
        self.inner.state()
    }

    /// Try to get a mutable reference to the current state. See [state][StateMachine::state].
    pub fn state_mut(&mut self) -> Result<&mut S, StateUnavailableError> {
        self.inner.state_mut()
    }

    /// Consumes the state machine and returns the underlying state.
    pub fn into_state(self) -> Result<S, StateUnavailableError> {
        self.inner.into_state()
    }

    /// Checks whether the current state in this state machine is completed.
    pub fn is_state_completed(&self) -> bool {
        match self.inner.state() {
            Ok(state) => state.is_completed(),
            // An empty state is always automatically completed, any attempt to use it will fail anyway.
            Err(_) => true,
        }
    }

    /// Checks whether the state machine is finished.
    pub fn is_finished(&self) -> bool {
        matches!(&self.inner, StateMachineInner::Finalized)
    }

    /// Start the underlying state, returning the messages it and any round it advanced into produced.
    pub fn start(&mut self) -> Result<HandleOutput<S>, S::Error> {
        let state = self.inner.take_state()?;
        let output = state.start()?;
        self.drive(output)
    }

    /// Let the underlying state handle the provided message, returning whatever output it produced.
    ///
    /// This returns a [StateMachineOutput], which is very similar to a [StateMachineStateOutput], except it doesn't
    /// have the [StateMachineState] as part of it.
    pub fn handle_message(&mut self, message: S::InputMessage) -> Result<HandleOutput<S>, S::Error> {
        let state = self.inner.take_state()?;
        let output = state.handle_message(message)?;
        self.drive(output)
    }

    // Keeps advancing the state while it's completed, accumulating every message produced along the way.
    fn drive(&mut self, output: StateMachineStateOutput<S>) -> Result<HandleOutput<S>, S::Error> {
        let mut output = output;
        let mut output_messages: Vec<StateMachineMessage<S>> = Vec::new();
        loop {
            let state = match output {
                StateMachineStateOutput::Ignored(state) => {
                    self.inner = StateMachineInner::State(state);
                    return Ok(StateMachineOutput::Ignored);
                }
                StateMachineStateOutput::Final(result, messages) => {
                    self.inner = StateMachineInner::Finalized;
                    output_messages.extend(messages);
                    return Ok(StateMachineOutput::Final(result, output_messages));
                }
                StateMachineStateOutput::Empty(state) => state,
                StateMachineStateOutput::Messages(state, messages) => {
                    output_messages.extend(messages);
                    state
                }
            };
            if !state.is_completed() {
                self.inner = StateMachineInner::State(state);
                break;
            }

            // This is behind a feature flag as it's otherwise very CPU intensive.
            #[cfg(feature = "log-transitions")]
            let current_state_str = state.to_string();

            output = state.try_next()?;

            #[cfg(feature = "log-transitions")]
            if let Ok(next_state) = output.as_state() {
                tracing::debug!("State transition: {current_state_str} -> {next_state}");
            }
        }
        if output_messages.is_empty() {
            Ok(StateMachineOutput::Empty)
        } else {
            Ok(StateMachineOutput::Messages(output_messages))
        }
    }
}

#[cfg(feature = "log-transitions")]
impl<S: StateMachineState> StateMachineStateOutput<S> {
    fn as_state(&self) -> Result<&S, InvalidStateError> {
        match self {
            Self::Empty(state) | Self::Messages(state, _) | Self::Ignored(state) => Ok(state),
            Self::Final(..) => Err(InvalidStateError),
        }
    }
}

impl<S: StateMachineState> std::fmt::Display for StateMachine<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "StateMachine(")?;
        match &self.inner {
            StateMachineInner::Taken => write!(f, "Taken")?,
            StateMachineInner::State(state) => write!(f, "{}", state)?,
            StateMachineInner::Finalized => write!(f, "Finalized")?,
        }
        write!(f, ")")
    }
}

/// The output of a state machine. See the documentation on [StateMachineStateOutput] as these are basically
/// the same enum variants except they don't contain the state machine state itself.
#[derive(Debug)]
pub enum StateMachineOutput<R, O, F> {
    /// A state machine's output messages, typically something that needs to be communicated
    /// to other participants' state machines.
    Messages(Vec<RecipientMessage<R, O>>),

    /// The final output of a state machine, along with the messages the last rounds produced. These still need
    /// to be delivered: other parties may not have finished yet.
    Final(F, Vec<RecipientMessage<R, O>>),

    /// The input was accepted but no output was produced.
    Empty,

    /// The input was not accepted.
    Ignored,
}

impl<R, O, F> StateMachineOutput<R, O, F> {
    /// Convert into a final output, error otherwise.
    pub fn into_final(self) -> Result<F, InvalidStateError> {
        match self {
            Self::Final(output, _) => Ok(output),
            _ => Err(InvalidStateError),
        }
    }

    /// Convert into output messages, error otherwise.
    pub fn into_messages(self) -> Result<Vec<RecipientMessage<R, O>>, InvalidStateError> {
        match self {
            Self::Messages(messages) => Ok(messages),
            _ => Err(InvalidStateError),
        }
    }

    /// Convert into an empty output, error otherwise.
    pub fn into_empty(self) -> Result<(), InvalidStateError> {
        match self {
            Self::Empty => Ok(()),
            _ => Err(InvalidStateError),
        }
    }

    /// Whether the input that produced this output was accepted.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// An alias for `StateMachineOutput` based on a `StateMachineState`.
#[allow(type_alias_bounds)]
pub type HandleOutput<S: StateMachineState> = StateMachineOutput<S::RecipientId, S::OutputMessage, S::FinalResult>;
