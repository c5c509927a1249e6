//! Key generation simulator.
//!
//! There is no networking involved: the simulator acts as a basic router that takes every party's outbound messages
//! and hands them to their recipients until no messages are left.

#![allow(clippy::indexing_slicing, clippy::expect_used, clippy::panic, clippy::arithmetic_side_effects)]

use crate::{
    errors::KeygenError,
    keygen::{
        fixtures::{pre_params, test_config},
        KeygenMessage, LocalParty, LocalPartySaveData,
    },
};
use basic_types::{Parameters, PartyId, SortedPartyIds};
use generic_ec::curves::Secp256k1;
use std::{
    collections::VecDeque,
    sync::mpsc::{channel, Receiver},
};

type E = Secp256k1;

/// The order messages are delivered in.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Delivery {
    /// In the order they were sent.
    Fifo,

    /// Most recently sent first, which causes messages for later rounds to arrive early.
    Lifo,
}

/// A function that can modify a message sent by the party at the given index before it's delivered.
pub(crate) type Tamper = Box<dyn FnMut(usize, &mut KeygenMessage<E>)>;

/// The outcome of a simulation for a single party.
pub(crate) struct PartyOutcome {
    pub(crate) result: Option<LocalPartySaveData<E>>,
    pub(crate) error: Option<KeygenError>,
}

pub(crate) struct KeygenSimulator {
    pub(crate) parties: Vec<LocalParty<E>>,
    pub(crate) outbound: Vec<Receiver<KeygenMessage<E>>>,
    results: Vec<Receiver<LocalPartySaveData<E>>>,
    delivery: Delivery,
    tamper: Option<Tamper>,
    late_party: Option<usize>,
}

impl KeygenSimulator {
    pub(crate) fn new(party_count: usize, threshold: usize) -> Self {
        let party_ids = SortedPartyIds::new((1..=party_count).map(PartyId::from).collect());
        let mut parties = Vec::new();
        let mut outbound = Vec::new();
        let mut results = Vec::new();
        for (index, party_id) in party_ids.iter().enumerate() {
            let parameters = Parameters::new(party_ids.clone(), party_id.clone(), threshold).expect("invalid parameters");
            let (out_sender, out_receiver) = channel();
            let (end_sender, end_receiver) = channel();
            let party = LocalParty::new(parameters, test_config(), Some(pre_params(index)), out_sender, end_sender)
                .expect("failed to create party");
            parties.push(party);
            outbound.push(out_receiver);
            results.push(end_receiver);
        }
        Self { parties, outbound, results, delivery: Delivery::Fifo, tamper: None, late_party: None }
    }

    pub(crate) fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    pub(crate) fn with_tamper(mut self, tamper: impl FnMut(usize, &mut KeygenMessage<E>) + 'static) -> Self {
        self.tamper = Some(Box::new(tamper));
        self
    }

    /// Only start the party at the given index once no more messages can be delivered without it.
    pub(crate) fn with_late_party(mut self, index: usize) -> Self {
        self.late_party = Some(index);
        self
    }

    /// Start every party and route messages until there's none left.
    pub(crate) fn run(&mut self) -> Vec<PartyOutcome> {
        let mut errors: Vec<Option<KeygenError>> = self.parties.iter().map(|_| None).collect();
        for (index, party) in self.parties.iter().enumerate() {
            if self.late_party == Some(index) {
                continue;
            }
            if let Err(e) = party.start() {
                errors[index] = Some(e);
            }
        }
        self.route(&mut errors);
        if let Some(index) = self.late_party {
            if let Err(e) = self.parties[index].start() {
                errors[index] = Some(e);
            }
            self.route(&mut errors);
        }

        self.results
            .iter()
            .zip(errors)
            .map(|(results, error)| PartyOutcome { result: results.try_recv().ok(), error })
            .collect()
    }

    fn route(&mut self, errors: &mut [Option<KeygenError>]) {
        let mut queue = VecDeque::new();
        loop {
            self.collect_outbound(&mut queue);
            let next = match self.delivery {
                Delivery::Fifo => queue.pop_front(),
                Delivery::Lifo => queue.pop_back(),
            };
            let Some(message) = next else {
                break;
            };
            for index in self.recipients(&message) {
                if errors[index].is_some() {
                    continue;
                }
                if let Err(e) = self.parties[index].update(message.clone()) {
                    errors[index] = Some(e);
                }
            }
        }
    }

    fn collect_outbound(&mut self, queue: &mut VecDeque<KeygenMessage<E>>) {
        for (index, outbound) in self.outbound.iter().enumerate() {
            while let Ok(mut message) = outbound.try_recv() {
                if let Some(tamper) = &mut self.tamper {
                    tamper(index, &mut message);
                }
                queue.push_back(message);
            }
        }
    }

    fn recipients(&self, message: &KeygenMessage<E>) -> Vec<usize> {
        match &message.recipient {
            Some(recipient) => vec![recipient.index()],
            None => (0..self.parties.len()).filter(|index| *index != message.sender.index()).collect(),
        }
    }
}

impl PartyOutcome {
    pub(crate) fn save_data(self) -> LocalPartySaveData<E> {
        if let Some(error) = self.error {
            panic!("party failed: {error}");
        }
        self.result.expect("party did not finish")
    }
}
