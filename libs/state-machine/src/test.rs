//! Tests for state machines.

#![allow(clippy::indexing_slicing)]

use crate::{
    errors::StateMachineError,
    state::{Recipient, RecipientMessage, StateMachineStateOutput, StateMachineStateResult},
    StateMachine, StateMachineState,
};
use anyhow::Result;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Hash, Eq)]
struct PartyId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Round {
    A,
    B,
    C,
}

// Every message for every round is kept here, regardless of which round we're in.
struct Messages {
    party_count: usize,
    party_messages: HashMap<(Round, PartyId), u32>,
}

impl Messages {
    fn new(party_count: usize) -> Self {
        Self { party_count, party_messages: HashMap::new() }
    }

    fn count(&self, round: Round) -> usize {
        self.party_messages.keys().filter(|(message_round, _)| *message_round == round).count()
    }
}

// This a testing state that transitions:
//
// * `WaitingA` -> `WaitingB` when every party sent an `A` message.
// * `WaitingB` -> `WaitingC` when every party sent a `B` message.
// * `WaitingC` -> completion when every party sent a `C` message.
//
// Messages for later rounds are stored right away so a single message can cascade through several rounds.
enum WaiterState {
    WaitingA(Messages),
    WaitingB(Messages),
    WaitingC(Messages),
}

impl std::fmt::Display for WaiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitingA(_) => write!(f, "WaitingA"),
            WaitingB(_) => write!(f, "WaitingB"),
            WaitingC(_) => write!(f, "WaitingC"),
        }
    }
}

use WaiterState::*;

impl WaiterState {
    fn new(party_count: usize) -> Self {
        WaitingA(Messages::new(party_count))
    }
}

impl StateMachineState for WaiterState {
    type RecipientId = PartyId;
    type InputMessage = StoreMessage;
    type OutputMessage = StoreMessage;
    type FinalResult = CompletedMessage;
    type Error = StateMachineError;

    fn start(self) -> StateMachineStateResult<Self> {
        let message = RecipientMessage::broadcast(StoreMessage(Round::A, PartyId(1), 1));
        Ok(StateMachineStateOutput::Messages(self, vec![message]))
    }

    fn is_completed(&self) -> bool {
        match self {
            WaitingA(state) => state.count(Round::A) == state.party_count,
            WaitingB(state) => state.count(Round::B) == state.party_count,
            WaitingC(state) => state.count(Round::C) == state.party_count,
        }
    }

    fn try_next(self) -> StateMachineStateResult<Self> {
        match self {
            WaitingA(state) => {
                // Let's pretend like we're sending an output message to party id 42, from us (party id 1)
                let message = RecipientMessage::new(Recipient::Single(PartyId(42)), StoreMessage(Round::B, PartyId(1), 1));
                Ok(StateMachineStateOutput::Messages(WaitingB(state), vec![message]))
            }
            WaitingB(state) => {
                let message = RecipientMessage::broadcast(StoreMessage(Round::C, PartyId(1), 1));
                Ok(StateMachineStateOutput::Messages(WaitingC(state), vec![message]))
            }
            WaitingC(state) => {
                let total = state.party_messages.values().sum();
                Ok(StateMachineStateOutput::Final(CompletedMessage(total), vec![]))
            }
        }
    }

    fn handle_message(mut self, message: Self::InputMessage) -> StateMachineStateResult<Self> {
        let StoreMessage(round, party_id, value) = message;
        let inner = match &mut self {
            WaitingA(inner) | WaitingB(inner) | WaitingC(inner) => inner,
        };
        if value == 0 {
            return Err(anyhow::anyhow!("zero is not a valid value").into());
        }
        if inner.party_messages.contains_key(&(round, party_id)) {
            return Ok(StateMachineStateOutput::Ignored(self));
        }
        inner.party_messages.insert((round, party_id), value);
        Ok(StateMachineStateOutput::Empty(self))
    }
}

#[derive(Clone, Debug)]
struct StoreMessage(Round, PartyId, u32);

#[derive(Debug, PartialEq)]
struct CompletedMessage(u32);

#[test]
fn linear_state_transitions() -> Result<()> {
    let mut sm = StateMachine::new(WaiterState::new(2));
    let messages = sm.start()?.into_messages()?;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].recipient(), &Recipient::Broadcast);

    // Two messages should take us to the B state.
    assert!(sm.handle_message(StoreMessage(Round::A, PartyId(1), 10))?.into_empty().is_ok());
    let messages = sm.handle_message(StoreMessage(Round::A, PartyId(2), 20))?.into_messages()?;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].recipient(), &Recipient::Single(PartyId(42)));
    assert_eq!(sm.state()?.to_string(), "WaitingB");

    // Two more should take us to C.
    assert!(sm.handle_message(StoreMessage(Round::B, PartyId(1), 10))?.into_empty().is_ok());
    assert!(sm.handle_message(StoreMessage(Round::B, PartyId(2), 20))?.into_messages().is_ok());

    // And two more should produce the final output.
    assert!(sm.handle_message(StoreMessage(Round::C, PartyId(1), 10))?.into_empty().is_ok());
    let output = sm.handle_message(StoreMessage(Round::C, PartyId(2), 20))?;
    assert_eq!(output.into_final()?, CompletedMessage(90));
    assert!(sm.is_finished());
    Ok(())
}

#[test]
fn cascading_transitions() -> Result<()> {
    let mut sm = StateMachine::new(WaiterState::new(2));

    // Store everything for rounds B and C before A is done.
    for round in [Round::C, Round::B] {
        for party in 1..=2 {
            assert!(sm.handle_message(StoreMessage(round, PartyId(party), 1))?.into_empty().is_ok());
        }
    }
    sm.handle_message(StoreMessage(Round::A, PartyId(1), 1))?;
    assert_eq!(sm.state()?.to_string(), "WaitingA");

    // The last A message runs every round and the messages produced along the way come out with the result.
    let output = sm.handle_message(StoreMessage(Round::A, PartyId(2), 1))?;
    let crate::StateMachineOutput::Final(result, messages) = output else {
        anyhow::bail!("state machine did not finish");
    };
    assert_eq!(result, CompletedMessage(6));
    assert_eq!(messages.len(), 2);
    assert!(matches!(messages[1].contents(), StoreMessage(Round::C, ..)));
    Ok(())
}

#[test]
fn duplicate_messages_are_ignored() -> Result<()> {
    let mut sm = StateMachine::new(WaiterState::new(2));
    assert!(sm.handle_message(StoreMessage(Round::A, PartyId(1), 10))?.is_accepted());
    assert!(!sm.handle_message(StoreMessage(Round::A, PartyId(1), 11))?.is_accepted());
    assert!(!sm.is_state_completed());
    Ok(())
}

#[test]
fn failure_consumes_state() -> Result<()> {
    let mut sm = StateMachine::new(WaiterState::new(2));
    assert!(sm.handle_message(StoreMessage(Round::A, PartyId(1), 0)).is_err());
    assert!(sm.state().is_err());
    assert!(matches!(
        sm.handle_message(StoreMessage(Round::A, PartyId(1), 1)),
        Err(StateMachineError::StateUnavailable(_))
    ));
    Ok(())
}

#[test]
fn finished_machine_is_unavailable() -> Result<()> {
    let mut sm = StateMachine::new(WaiterState::new(1));
    for round in [Round::A, Round::B, Round::C] {
        sm.handle_message(StoreMessage(round, PartyId(1), 1))?;
    }
    assert!(sm.is_finished());
    assert!(sm.start().is_err());
    assert_eq!(sm.to_string(), "StateMachine(Finalized)");
    Ok(())
}
