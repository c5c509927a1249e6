//! The key generation state machine.

use crate::{
    config::KeygenConfig,
    crypto::{
        commitment::{HashCommitment, HashDecommitment},
        paillier::{PaillierPrivateKey, PaillierPublicKey},
        range_proof::RangeProofParameters,
        vss::{self, VerifiableShares},
    },
    errors::{KeygenError, ProofKind},
    keygen::{
        messages::{KeygenMessage, KeygenMessageContent, Round1Commit, Round2DeCommit, Round2Vss, Round3PaillierProof},
        pre_params::LocalPreParams,
        save_data::LocalPartySaveData,
        store::MessageStore,
    },
};
use anyhow::anyhow;
use basic_types::{Parameters, PartyId};
use generic_ec::{Curve, Point, Scalar};
use rand::rngs::OsRng;
use state_machine::{
    state::{Recipient, StateMachineMessage},
    StateMachineState, StateMachineStateOutput, StateMachineStateResult,
};
use std::{collections::HashSet, fmt, sync::Arc};
use tracing::{debug, info};

/// The immutable data every round needs.
pub struct KeygenContext<E: Curve> {
    parameters: Parameters,
    config: KeygenConfig,
    ks: Vec<Scalar<E>>,
}

impl<E: Curve> KeygenContext<E> {
    /// Build a context, deriving every party's share id out of its key.
    pub fn new(parameters: Parameters, config: KeygenConfig) -> Result<Self, KeygenError> {
        let ks: Vec<_> =
            parameters.parties().iter().map(|party| Scalar::<E>::from_be_bytes_mod_order(party.key())).collect();
        if ks.iter().any(|k| k == &Scalar::zero()) {
            return Err(KeygenError::Construction("party key maps to a zero share id".into()));
        }
        if has_duplicates(&ks) {
            return Err(KeygenError::Construction("party keys map to duplicate share ids".into()));
        }
        Ok(Self { parameters, config, ks })
    }

    /// The session parameters.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Every party's share id, in party index order.
    pub fn ks(&self) -> &[Scalar<E>] {
        &self.ks
    }

    fn party_index(&self) -> usize {
        self.parameters.party_index()
    }

    fn party_count(&self) -> usize {
        self.parameters.party_count()
    }

    fn threshold(&self) -> usize {
        self.parameters.threshold()
    }

    fn own_share_id(&self) -> Result<Scalar<E>, KeygenError> {
        self.ks.get(self.party_index()).copied().ok_or(KeygenError::InvalidState("own share id not found"))
    }
}

fn has_duplicates<E: Curve>(ks: &[Scalar<E>]) -> bool {
    let mut seen = HashSet::new();
    !ks.iter().all(|k| seen.insert(k.to_be_bytes().as_ref().to_vec()))
}

/// The secrets we produce when round 1 starts and reveal or consume during round 2.
pub struct LocalPartyTempData<E: Curve> {
    shares: Vec<vss::Share<E>>,
    decommit_poly_g: HashDecommitment,
    pre_params: LocalPreParams,
}

/// The public parameters every party published in round 1, in party index order.
pub struct AuxiliaryData {
    kgcs: Vec<HashCommitment>,
    paillier_pks: Vec<PaillierPublicKey>,
    range_proof: Vec<RangeProofParameters>,
}

/// The running sums of every verified contribution.
pub struct ShareAccumulator<E: Curve> {
    xi: Scalar<E>,
    vc: Vec<Point<E>>,
    verified: Vec<bool>,
}

impl<E: Curve> ShareAccumulator<E> {
    fn new(threshold: usize, party_count: usize) -> Self {
        let vc = vec![Point::zero(); threshold.saturating_add(1)];
        Self { xi: Scalar::zero(), vc, verified: vec![false; party_count] }
    }

    fn is_verified(&self, sender: usize) -> bool {
        self.verified.get(sender).copied().unwrap_or(true)
    }

    fn is_complete(&self) -> bool {
        self.verified.iter().all(|verified| *verified)
    }

    fn add(&mut self, sender: usize, share: Scalar<E>, vs: &[Point<E>]) {
        self.xi = self.xi + share;
        for (sum, point) in self.vc.iter_mut().zip(vs) {
            *sum = *sum + *point;
        }
        if let Some(verified) = self.verified.get_mut(sender) {
            *verified = true;
        }
    }
}

/// The key generation round definitions.
pub mod states {
    use super::*;

    /// We commit to our polynomial and wait for every other party's commitment.
    pub struct Round1<E: Curve> {
        pub(crate) context: Arc<KeygenContext<E>>,
        pub(crate) store: MessageStore<E>,
        pub(crate) pre_params: Option<LocalPreParams>,

        // Only set once the round is started.
        pub(crate) temp: Option<LocalPartyTempData<E>>,
    }

    /// We wait for every party's share and decommitment.
    pub struct Round2<E: Curve> {
        pub(crate) context: Arc<KeygenContext<E>>,
        pub(crate) store: MessageStore<E>,
        pub(crate) paillier_sk: PaillierPrivateKey,
        pub(crate) aux: AuxiliaryData,
        pub(crate) accumulator: ShareAccumulator<E>,
    }

    /// We wait for every party's Paillier proof.
    pub struct Round3<E: Curve> {
        pub(crate) context: Arc<KeygenContext<E>>,
        pub(crate) store: MessageStore<E>,
        pub(crate) paillier_sk: PaillierPrivateKey,
        pub(crate) paillier_pks: Vec<PaillierPublicKey>,
        pub(crate) range_proof: Vec<RangeProofParameters>,
        pub(crate) xi: Scalar<E>,
        pub(crate) big_xj: Vec<Point<E>>,
        pub(crate) ecdsa_pub: Point<E>,
    }
}

/// The state of a key generation run.
pub enum KeygenState<E: Curve> {
    /// Commit to our polynomial and publish our auxiliary parameters.
    Round1(states::Round1<E>),

    /// Distribute shares and open commitments.
    Round2(states::Round2<E>),

    /// Prove our Paillier key is well formed.
    Round3(states::Round3<E>),
}

use KeygenState::*;

impl<E: Curve> KeygenState<E> {
    /// Construct a new, not yet started, state.
    pub fn new(context: Arc<KeygenContext<E>>, pre_params: Option<LocalPreParams>) -> Self {
        let store = MessageStore::new(context.party_count());
        Round1(states::Round1 { context, store, pre_params, temp: None })
    }

    /// The number of the current round, starting at 1.
    pub fn round_number(&self) -> u8 {
        match self {
            Round1(_) => 1,
            Round2(_) => 2,
            Round3(_) => 3,
        }
    }

    /// Whether the first round was started.
    pub fn is_started(&self) -> bool {
        !matches!(self, Round1(states::Round1 { temp: None, .. }))
    }

    /// The messages stored so far.
    pub fn store(&self) -> &MessageStore<E> {
        match self {
            Round1(state) => &state.store,
            Round2(state) => &state.store,
            Round3(state) => &state.store,
        }
    }

    /// The messages stored so far, mutably.
    pub fn store_mut(&mut self) -> &mut MessageStore<E> {
        match self {
            Round1(state) => &mut state.store,
            Round2(state) => &mut state.store,
            Round3(state) => &mut state.store,
        }
    }

    fn start_round_1(mut state: states::Round1<E>) -> StateMachineStateResult<Self> {
        if state.temp.is_some() {
            return Err(KeygenError::InvalidState("party already started or corrupted"));
        }
        let context = state.context.clone();
        info!("Starting key generation round 1");
        let pre_params = match state.pre_params.take() {
            Some(pre_params) => pre_params,
            None => LocalPreParams::generate(&context.config, &mut OsRng)?,
        };

        let ui = Scalar::<E>::random(&mut OsRng);
        let VerifiableShares { vs, shares } = vss::create(context.threshold(), &ui, &context.ks, &mut OsRng)?;
        let secrets = vs.iter().map(|point| point.to_bytes(true).as_ref().to_vec()).collect();
        let (commitment, decommit_poly_g) = HashCommitment::commit(secrets, &mut OsRng);
        let (dln_proof_1, dln_proof_2) = pre_params.range_proof.prove(&mut OsRng);
        let RangeProofParameters { ntilde, h1, h2 } = pre_params.range_proof_parameters().clone();
        let message = KeygenMessageContent::Round1Commit(Round1Commit {
            commitment,
            paillier_pk: pre_params.paillier_sk.public_key().clone(),
            ntilde,
            h1,
            h2,
            dln_proof_1,
            dln_proof_2,
            share_id: context.own_share_id()?,
        });
        store_own(&mut state.store, context.party_index(), message.clone())?;
        state.temp = Some(LocalPartyTempData { shares, decommit_poly_g, pre_params });

        let messages = vec![StateMachineMessage::<Self>::broadcast(message)];
        Ok(StateMachineStateOutput::Messages(Round1(state), messages))
    }

    fn transition_round_1(state: states::Round1<E>) -> StateMachineStateResult<Self> {
        let states::Round1 { context, mut store, temp, .. } = state;
        let temp = temp.ok_or(KeygenError::InvalidState("round 1 was not started"))?;
        let own_index = context.party_index();
        let party_count = context.party_count();

        let mut aux = AuxiliaryData {
            kgcs: Vec::with_capacity(party_count),
            paillier_pks: Vec::with_capacity(party_count),
            range_proof: Vec::with_capacity(party_count),
        };
        for (sender, commit) in store.commits.elements() {
            let range_proof =
                RangeProofParameters { ntilde: commit.ntilde.clone(), h1: commit.h1.clone(), h2: commit.h2.clone() };
            if sender != own_index {
                validate_commit(&context, sender, commit, &range_proof)?;
            }
            aux.kgcs.push(commit.commitment.clone());
            aux.paillier_pks.push(commit.paillier_pk.clone());
            aux.range_proof.push(range_proof);
        }
        if aux.kgcs.len() != party_count {
            return Err(KeygenError::InvalidState("missing round 1 commitments"));
        }

        info!("Starting key generation round 2");
        let mut messages = Vec::with_capacity(party_count);
        let mut own_share = None;
        for (party, share) in context.parameters.parties().iter().zip(temp.shares) {
            let content = KeygenMessageContent::Round2Vss(Round2Vss { share });
            if party.index() == own_index {
                own_share = Some(content);
            } else {
                messages.push(StateMachineMessage::<Self>::new(Recipient::Single(party.clone()), content));
            }
        }
        let own_share = own_share.ok_or(KeygenError::InvalidState("own share not found"))?;
        let decommit = KeygenMessageContent::Round2DeCommit(Round2DeCommit { decommitment: temp.decommit_poly_g });
        messages.push(StateMachineMessage::<Self>::broadcast(decommit.clone()));
        store_own(&mut store, own_index, own_share)?;
        store_own(&mut store, own_index, decommit)?;

        let accumulator = ShareAccumulator::new(context.threshold(), party_count);
        let mut state =
            states::Round2 { context, store, paillier_sk: temp.pre_params.paillier_sk, aux, accumulator };
        // Any round 2 messages that arrived early can be verified right away.
        state.verify_ready()?;
        Ok(StateMachineStateOutput::Messages(Round2(state), messages))
    }

    fn transition_round_2(mut state: states::Round2<E>) -> StateMachineStateResult<Self> {
        state.verify_ready()?;
        if !state.accumulator.is_complete() {
            return Err(KeygenError::InvalidState("round 2 contributions are not verified"));
        }
        let states::Round2 { context, mut store, paillier_sk, aux, accumulator } = state;
        let ShareAccumulator { xi, vc, .. } = accumulator;

        let ecdsa_pub = vc.first().copied().ok_or(KeygenError::InvalidState("no coefficient commitments"))?;
        if ecdsa_pub == Point::zero() {
            return Err(anyhow!("public key is the point at infinity").into());
        }
        let big_xj: Vec<_> = context.ks.iter().map(|k| vss::evaluate_commitments(&vc, k)).collect();
        let own_index = context.party_index();
        if big_xj.get(own_index) != Some(&(Point::<E>::generator() * xi)) {
            return Err(anyhow!("own share does not match the public share commitments").into());
        }

        info!("Starting key generation round 3");
        let proof = paillier_sk.prove_correctness(&context.own_share_id()?, &ecdsa_pub)?;
        let message = KeygenMessageContent::Round3PaillierProof(Round3PaillierProof { proof });
        store_own(&mut store, own_index, message.clone())?;

        let state = states::Round3 {
            context,
            store,
            paillier_sk,
            paillier_pks: aux.paillier_pks,
            range_proof: aux.range_proof,
            xi,
            big_xj,
            ecdsa_pub,
        };
        let messages = vec![StateMachineMessage::<Self>::broadcast(message)];
        Ok(StateMachineStateOutput::Messages(Round3(state), messages))
    }

    fn transition_round_3(state: states::Round3<E>) -> StateMachineStateResult<Self> {
        let states::Round3 { context, store, paillier_sk, paillier_pks, range_proof, xi, big_xj, ecdsa_pub } = state;
        let own_index = context.party_index();
        for (sender, message) in store.proofs.elements() {
            if sender == own_index {
                continue;
            }
            let (Some(paillier_pk), Some(k)) = (paillier_pks.get(sender), context.ks.get(sender)) else {
                return Err(KeygenError::InvalidState("proof from unknown party"));
            };
            if !message.proof.verify(paillier_pk, k, &ecdsa_pub) {
                return Err(KeygenError::InvalidProof { round: 3, culprit: sender, kind: ProofKind::Paillier });
            }
        }
        if has_duplicates(&context.ks) {
            return Err(KeygenError::DuplicateShareId);
        }

        let save_data = LocalPartySaveData {
            xi,
            share_id: context.own_share_id()?,
            paillier_sk,
            big_xj,
            paillier_pks,
            ntilde_j: range_proof.iter().map(|parameters| parameters.ntilde.clone()).collect(),
            h1_j: range_proof.iter().map(|parameters| parameters.h1.clone()).collect(),
            h2_j: range_proof.iter().map(|parameters| parameters.h2.clone()).collect(),
            ks: context.ks.clone(),
            ecdsa_pub,
        };
        info!("Key generation finished");
        Ok(StateMachineStateOutput::Final(save_data, Vec::new()))
    }
}

impl<E: Curve> states::Round2<E> {
    // Verify every sender whose share and decommitment we have, folding its contribution into our running sums.
    fn verify_ready(&mut self) -> Result<(), KeygenError> {
        let threshold = self.context.threshold();
        let own_share_id = self.context.own_share_id()?;
        for sender in 0..self.context.party_count() {
            if self.accumulator.is_verified(sender) {
                continue;
            }
            let (Some(vss), Some(decommit)) = (self.store.shares.get(sender), self.store.decommits.get(sender)) else {
                continue;
            };
            let commitment = self.aux.kgcs.get(sender).ok_or(KeygenError::InvalidState("commitment not found"))?;
            let vs = open_commitment::<E>(commitment, &decommit.decommitment, threshold)
                .ok_or(KeygenError::CommitmentMismatch { round: 2, culprit: sender })?;
            if vss.share.id != own_share_id || !vss.share.verify(threshold, &vs) {
                return Err(KeygenError::InvalidShare { round: 2, culprit: sender });
            }
            debug!("Verified round 2 contribution from party {sender}");
            self.accumulator.add(sender, vss.share.value, &vs);
        }
        Ok(())
    }
}

fn validate_commit<E: Curve>(
    context: &KeygenContext<E>,
    sender: usize,
    commit: &Round1Commit<E>,
    range_proof: &RangeProofParameters,
) -> Result<(), KeygenError> {
    if context.ks.get(sender) != Some(&commit.share_id) {
        return Err(KeygenError::ShareIdMismatch { round: 1, culprit: sender });
    }
    let bits = commit.paillier_pk.n().bit_length().min(commit.ntilde.bit_length());
    if bits < context.config.min_modulus_bits {
        return Err(KeygenError::WeakModulus { round: 1, culprit: sender, bits });
    }
    range_proof
        .check()
        .map_err(|reason| KeygenError::InvalidRangeProofParams { round: 1, culprit: sender, reason })?;
    let RangeProofParameters { ntilde, h1, h2 } = range_proof;
    if !commit.dln_proof_1.verify(h1, h2, ntilde) || !commit.dln_proof_2.verify(h2, h1, ntilde) {
        return Err(KeygenError::InvalidProof { round: 1, culprit: sender, kind: ProofKind::Dln });
    }
    Ok(())
}

// Open a commitment to a list of compressed points, expecting exactly `threshold + 1` of them.
fn open_commitment<E: Curve>(
    commitment: &HashCommitment,
    decommitment: &HashDecommitment,
    threshold: usize,
) -> Option<Vec<Point<E>>> {
    if !commitment.verify(decommitment) || decommitment.secrets().len() != threshold.saturating_add(1) {
        return None;
    }
    decommitment.secrets().iter().map(|bytes| Point::<E>::from_bytes(bytes).ok()).collect()
}

fn store_own<E: Curve>(
    store: &mut MessageStore<E>,
    own_index: usize,
    message: KeygenMessageContent<E>,
) -> Result<(), KeygenError> {
    if store.store(own_index, message)? { Ok(()) } else { Err(KeygenError::InvalidState("own message slot is occupied")) }
}

impl<E: Curve> StateMachineState for KeygenState<E> {
    type RecipientId = PartyId;
    type InputMessage = KeygenMessage<E>;
    type OutputMessage = KeygenMessageContent<E>;
    type FinalResult = LocalPartySaveData<E>;
    type Error = KeygenError;

    fn start(self) -> StateMachineStateResult<Self> {
        match self {
            Round1(state) => Self::start_round_1(state),
            Round2(_) | Round3(_) => Err(KeygenError::InvalidState("party already started or corrupted")),
        }
    }

    fn is_completed(&self) -> bool {
        match self {
            Round1(state) => state.temp.is_some() && state.store.commits.is_full(),
            Round2(state) => state.store.shares.is_full() && state.store.decommits.is_full(),
            Round3(state) => state.store.proofs.is_full(),
        }
    }

    fn try_next(self) -> StateMachineStateResult<Self> {
        match self {
            Round1(state) => Self::transition_round_1(state),
            Round2(state) => Self::transition_round_2(state),
            Round3(state) => Self::transition_round_3(state),
        }
    }

    fn handle_message(mut self, message: Self::InputMessage) -> StateMachineStateResult<Self> {
        let (sender, _, content) = message.into_parts();
        if !self.store_mut().store(sender.index(), content)? {
            return Ok(StateMachineStateOutput::Ignored(self));
        }
        if let Round2(state) = &mut self {
            state.verify_ready()?;
        }
        Ok(StateMachineStateOutput::Empty(self))
    }
}

impl<E: Curve> fmt::Display for KeygenState<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Round1(_) => write!(f, "Round1"),
            Round2(_) => write!(f, "Round2"),
            Round3(_) => write!(f, "Round3"),
        }
    }
}
