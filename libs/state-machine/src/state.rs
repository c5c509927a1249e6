//! A state machine's state.

use crate::errors::{InvalidStateError, StateUnavailableError};

/// Implementation of the state machine's state.
///
/// This trait should be implemented for an enum where every variant represents a round of a protocol and
/// carries only the data that round needs. It allows defining:
///
/// * The first round's outbound messages via [start][StateMachineState::start].
/// * Whether the current round has everything it needs via [is_completed][StateMachineState::is_completed].
/// * The transition into the next round via [try_next][StateMachineState::try_next].
/// * How inbound messages are stored via [handle_message][StateMachineState::handle_message].
///
/// Message handling is expected to only *store* messages. A [StateMachine][crate::StateMachine] checks
/// whether the round is completed after every message and advances it as many times as possible, so a state
/// never needs to advance itself.
pub trait StateMachineState
where
    Self: Sized + std::fmt::Display,
{
    /// The type that this state machine uses to address recipients in its output messages.
    type RecipientId;

    /// The input message for this state machine.
    ///
    /// This will typically be an enum where each variant is handled by a specific round. Because inbound
    /// messages are stored rather than consumed on arrival, a message for a later round can be handled at
    /// any point: the round that needs it will find it once it's reached.
    type InputMessage;

    /// The output message this state machine produces.
    ///
    /// Every round transition may generate 0+ output messages, addressed either to a single party or to every
    /// other party.
    type OutputMessage;

    /// The type that represents the final output in this state machine.
    type FinalResult;

    /// The error produced by this state. Any error is fatal: the state is consumed and can't be recovered.
    type Error: From<StateUnavailableError>;

    /// Run the first round.
    ///
    /// States that don't need an explicit start don't need to implement this.
    fn start(self) -> StateMachineStateResult<Self> {
        Ok(StateMachineStateOutput::Empty(self))
    }

    /// Check if the current round is completed.
    ///
    /// In this context, a round is completed if it has received all of the information it needs for it to
    /// transition into the next one.
    fn is_completed(&self) -> bool;

    /// Try to advance the state machine.
    ///
    /// This takes the current state by value, which allows moving any members in the current round into the
    /// next one, or into the [StateMachineState::FinalResult] if this is the last round.
    fn try_next(self) -> StateMachineStateResult<Self>;

    /// Handle a message.
    ///
    /// Implementations should store the message and return either [StateMachineStateOutput::Empty] if it was
    /// stored or [StateMachineStateOutput::Ignored] if it wasn't.
    fn handle_message(self, message: Self::InputMessage) -> StateMachineStateResult<Self>;
}

/// Represents the types of outputs a state can produce.
///
/// Because [StateMachineState] functions take the state by value, they always return the state (unless the
/// output is [Final][StateMachineStateOutput::Final]) along with optionally more information.
pub enum StateMachineStateOutput<S: StateMachineState> {
    /// The action updated the underlying state and produced no output.
    Empty(S),

    /// The state transitioned and produced some output messages which should be forwarded to the
    /// message recipients.
    Messages(S, Vec<StateMachineMessage<S>>),

    /// The message wasn't accepted and the state is unchanged.
    Ignored(S),

    /// The state machine finished and yielded this output along with any messages produced by the last
    /// transition.
    Final(S::FinalResult, Vec<StateMachineMessage<S>>),
}

impl<S: StateMachineState> StateMachineStateOutput<S> {
    /// Consume this output and keep only the state, returning an error if there's no state.
    pub fn into_state(self) -> Result<S, InvalidStateError> {
        use StateMachineStateOutput::*;
        match self {
            Empty(state) | Messages(state, _) | Ignored(state) => Ok(state),
            Final(..) => Err(InvalidStateError),
        }
    }

    /// Consume this output and keep only the final output, returning an error if this is not a `Final`.
    pub fn into_final(self) -> Result<S::FinalResult, InvalidStateError> {
        use StateMachineStateOutput::*;
        match self {
            Final(output, _) => Ok(output),
            Empty(_) | Messages(..) | Ignored(_) => Err(InvalidStateError),
        }
    }

    /// Consume this output and keep the inner state and messages, returning an error if this is not a `Messages`.
    pub fn into_messages(self) -> Result<(S, Vec<StateMachineMessage<S>>), InvalidStateError> {
        use StateMachineStateOutput::*;
        match self {
            Messages(state, messages) => Ok((state, messages)),
            Empty(_) | Final(..) | Ignored(_) => Err(InvalidStateError),
        }
    }
}

impl<S: StateMachineState> From<S> for StateMachineStateOutput<S> {
    fn from(state: S) -> Self {
        Self::Empty(state)
    }
}

/// An alias for what the [StateMachineState] functions return to simplify user code.
pub type StateMachineStateResult<S> = Result<StateMachineStateOutput<S>, <S as StateMachineState>::Error>;

/// A recipient for a message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Recipient<T> {
    /// A single recipient.
    Single(T),

    /// Every party other than the sender.
    Broadcast,
}

/// A message for a state machine. This is a simple wrapper over both:
///
/// * An output message that was produced by a state machine during a round transition.
/// * A recipient that the message is addressed to. A router component will know how to map a recipient to
///   a party in the network.
#[derive(Clone, Debug)]
pub struct RecipientMessage<I, O> {
    recipient: Recipient<I>,
    contents: O,
}

impl<I, O> RecipientMessage<I, O> {
    /// Construct a new state machine message.
    pub fn new(recipient: Recipient<I>, contents: O) -> Self {
        Self { recipient, contents }
    }

    /// Construct a message for every other party.
    pub fn broadcast(contents: O) -> Self {
        Self { recipient: Recipient::Broadcast, contents }
    }

    /// The recipient of this message.
    pub fn recipient(&self) -> &Recipient<I> {
        &self.recipient
    }

    /// The contents of this message, AKA the message itself.
    pub fn contents(&self) -> &O {
        &self.contents
    }

    /// Consumes this message and returns the recipient and contents.
    pub fn into_parts(self) -> (Recipient<I>, O) {
        (self.recipient, self.contents)
    }
}

/// An alias that allows deriving the recipient and output message out of a state machine state.
#[allow(type_alias_bounds)]
pub type StateMachineMessage<S: StateMachineState> = RecipientMessage<S::RecipientId, S::OutputMessage>;
