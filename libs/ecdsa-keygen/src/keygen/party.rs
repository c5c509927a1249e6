//! The local party in a key generation run.

use crate::{
    config::KeygenConfig,
    errors::KeygenError,
    keygen::{
        messages::KeygenMessage,
        pre_params::LocalPreParams,
        save_data::LocalPartySaveData,
        state::{KeygenContext, KeygenState},
    },
};
use basic_types::{Parameters, PartyId, PartyMessage};
use generic_ec::Curve;
use state_machine::{
    sm::HandleOutput,
    state::{Recipient, StateMachineMessage},
    StateMachine, StateMachineOutput,
};
use std::{
    fmt,
    sync::{mpsc::Sender, Arc, Mutex, MutexGuard},
};
use tracing::{debug, error, info, warn};

/// A single party in a key generation run.
///
/// Outbound messages are sent on the `out` channel as they are produced and the key material is sent on the `end`
/// channel once the protocol finishes. Every operation takes an exclusive lock over the party's state so a party can
/// be shared between threads.
pub struct LocalParty<E: Curve> {
    context: Arc<KeygenContext<E>>,
    machine: Mutex<StateMachine<KeygenState<E>>>,
    out: Sender<KeygenMessage<E>>,
    end: Sender<LocalPartySaveData<E>>,
}

impl<E: Curve> LocalParty<E> {
    /// Construct a new party.
    ///
    /// If `pre_params` is `None`, the Paillier key and range proof parameters are generated when the party is
    /// started, which can take a long time.
    pub fn new(
        parameters: Parameters,
        config: KeygenConfig,
        pre_params: Option<LocalPreParams>,
        out: Sender<KeygenMessage<E>>,
        end: Sender<LocalPartySaveData<E>>,
    ) -> Result<Self, KeygenError> {
        if let Some(pre_params) = &pre_params {
            pre_params.validate().map_err(|e| KeygenError::Construction(format!("invalid pre-params: {e}")))?;
            let bits = pre_params.min_modulus_bits();
            if bits < config.min_modulus_bits {
                return Err(KeygenError::Construction(format!(
                    "pre-params modulus is too small: {bits} < {}",
                    config.min_modulus_bits
                )));
            }
        }
        let context = Arc::new(KeygenContext::new(parameters, config)?);
        let machine = Mutex::new(StateMachine::new(KeygenState::new(context.clone(), pre_params)));
        Ok(Self { context, machine, out, end })
    }

    /// Start the key generation run.
    ///
    /// This generates and sends our round 1 messages. Any message received before this call is consumed as part of
    /// it.
    pub fn start(&self) -> Result<(), KeygenError> {
        let mut machine = self.lock()?;
        // A finished or failed party no longer has a state.
        if machine.state().map_or(true, KeygenState::is_started) {
            return Err(KeygenError::InvalidState("party already started or corrupted"));
        }
        info!("Party {} starting key generation", self.party_id());
        let output = machine.start().inspect_err(|e| error!("Key generation failed: {e}"))?;
        self.dispatch(output)
    }

    /// Handle a message sent by another party.
    ///
    /// The message is stored and every round that is completed as a result is run. Returns whether the message was
    /// accepted: a message of an unknown kind or a second message of the same kind from the same sender is not.
    ///
    /// The caller is responsible for authenticating the sender and for rejecting replayed messages: this only checks
    /// that the envelope is consistent with the party set.
    pub fn update(&self, message: KeygenMessage<E>) -> Result<bool, KeygenError> {
        self.validate_envelope(&message)?;
        let mut machine = self.lock()?;
        let output = machine.handle_message(message).inspect_err(|e| error!("Key generation failed: {e}"))?;
        let accepted = output.is_accepted();
        self.dispatch(output)?;
        Ok(accepted)
    }

    /// Store a message without running any round.
    ///
    /// Returns whether the message was stored. Messages sent by ourselves are rejected since our own slots are
    /// filled in by the rounds.
    pub fn store_message(&self, message: KeygenMessage<E>) -> Result<bool, KeygenError> {
        if message.sender.index() == self.party_id().index() {
            return Err(KeygenError::InvalidMessage("message sent by ourselves".into()));
        }
        let mut machine = self.lock()?;
        let (sender, _, content) = message.into_parts();
        machine.state_mut()?.store_mut().store(sender.index(), content)
    }

    /// Our party id.
    pub fn party_id(&self) -> &PartyId {
        self.context.parameters().party_id()
    }

    /// The round we're in, or `None` if the run finished or failed.
    pub fn round_number(&self) -> Option<u8> {
        let machine = self.lock().ok()?;
        machine.state().ok().map(KeygenState::round_number)
    }

    /// The number of messages stored so far, or `None` if the run finished or failed.
    pub fn stored_message_count(&self) -> Option<usize> {
        let machine = self.lock().ok()?;
        machine.state().ok().map(|state| state.store().stored_message_count())
    }

    fn lock(&self) -> Result<MutexGuard<'_, StateMachine<KeygenState<E>>>, KeygenError> {
        self.machine.lock().map_err(|_| KeygenError::InvalidState("party lock poisoned"))
    }

    fn validate_envelope(&self, message: &KeygenMessage<E>) -> Result<(), KeygenError> {
        let parties = self.context.parameters().parties();
        let sender = &message.sender;
        let known_sender = parties.get(sender.index()).is_some_and(|party| party.same_party(sender));
        if !known_sender {
            return Err(KeygenError::InvalidMessage(format!("unknown sender {sender}")));
        }
        if sender.index() == self.party_id().index() {
            return Err(KeygenError::InvalidMessage("message sent by ourselves".into()));
        }
        match &message.recipient {
            Some(recipient) if !recipient.same_party(self.party_id()) => {
                Err(KeygenError::InvalidMessage(format!("message addressed to {recipient}")))
            }
            None if message.message.is_point_to_point() => {
                Err(KeygenError::InvalidMessage(format!("{} must be sent point to point", message.message.kind())))
            }
            _ => Ok(()),
        }
    }

    fn dispatch(&self, output: HandleOutput<KeygenState<E>>) -> Result<(), KeygenError> {
        match output {
            StateMachineOutput::Messages(messages) => self.send_messages(messages),
            StateMachineOutput::Final(save_data, messages) => {
                self.send_messages(messages)?;
                self.finish(save_data)
            }
            StateMachineOutput::Empty => Ok(()),
            StateMachineOutput::Ignored => {
                warn!("Message was not accepted");
                Ok(())
            }
        }
    }

    fn send_messages(&self, messages: Vec<StateMachineMessage<KeygenState<E>>>) -> Result<(), KeygenError> {
        for message in messages {
            let (recipient, content) = message.into_parts();
            debug!("Sending {} message", content.kind());
            let message = match recipient {
                Recipient::Single(recipient) => PartyMessage::point_to_point(self.party_id().clone(), recipient, content),
                Recipient::Broadcast => PartyMessage::broadcast(self.party_id().clone(), content),
            };
            self.out.send(message).map_err(|_| KeygenError::ChannelDropped("outbound"))?;
        }
        Ok(())
    }

    // The state machine only yields the final result once so this runs at most once.
    fn finish(&self, save_data: LocalPartySaveData<E>) -> Result<(), KeygenError> {
        info!("Party {} finished key generation", self.party_id());
        self.end.send(save_data).map_err(|_| KeygenError::ChannelDropped("result"))
    }
}

impl<E: Curve> fmt::Display for LocalParty<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.round_number() {
            Some(round) => write!(f, "id: {}, round: {round}", self.party_id()),
            None => write!(f, "id: {}, round: done", self.party_id()),
        }
    }
}
