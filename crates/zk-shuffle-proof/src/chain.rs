//! sequential shuffle chain
//!
//! every player shuffles once, in a fixed order, under the table key. each
//! step is verified against the previous deck with a context derived from
//! the game transcript, so a proof cannot be replayed at another position
//! or in another game. the first rejected step aborts the chain for good.

use rand_core::{CryptoRng, RngCore};

use crate::curve::CurveParams;
use crate::elgamal::Deck;
use crate::error::{Result, ShuffleError};
use crate::keys::{AggregatePublicKey, PlayerId};
use crate::permutation::ShuffleSecrets;
use crate::shuffle::{shuffle_encrypt, verify_shuffle_proof, ShuffleProof};
use crate::transcript::ShuffleTranscript;
use crate::ShuffleConfig;

/// one accepted shuffle
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShuffleStep {
    pub player: PlayerId,
    pub deck: Deck,
    pub proof: ShuffleProof,
}

#[derive(Clone, Debug)]
pub struct ShuffleChain {
    params: CurveParams,
    config: ShuffleConfig,
    aggregate: AggregatePublicKey,
    transcript: ShuffleTranscript,
    order: Vec<PlayerId>,
    initial: Deck,
    history: Vec<ShuffleStep>,
    aborted: Option<PlayerId>,
}

impl ShuffleChain {
    /// start a chain over `initial` with shufflers in `order`
    ///
    /// `order` must name every registered key holder exactly once. the
    /// aggregate key and the initial deck are bound into `transcript` here.
    pub fn new(
        params: CurveParams,
        config: ShuffleConfig,
        aggregate: AggregatePublicKey,
        mut transcript: ShuffleTranscript,
        order: Vec<PlayerId>,
        initial: Deck,
    ) -> Result<Self> {
        if initial.len() != config.deck_size {
            return Err(ShuffleError::DeckSizeMismatch {
                expected: config.deck_size,
                got: initial.len(),
            });
        }
        if order.is_empty() {
            return Err(ShuffleError::InvalidConfig("no shufflers".into()));
        }
        for (i, player) in order.iter().enumerate() {
            if aggregate.holder_key(*player).is_none() {
                return Err(ShuffleError::UnknownPlayer(*player));
            }
            if order[..i].contains(player) {
                return Err(ShuffleError::DuplicatePlayer(*player));
            }
        }
        let missing: Vec<PlayerId> = aggregate
            .holders()
            .iter()
            .map(|(player, _)| *player)
            .filter(|player| !order.contains(player))
            .collect();
        if !missing.is_empty() {
            return Err(ShuffleError::MissingShufflers { players: missing });
        }

        aggregate.bind(&mut transcript);
        transcript.bind_initial_deck(&initial.commitment());

        Ok(Self {
            params,
            config,
            aggregate,
            transcript,
            order,
            initial,
            history: Vec::new(),
            aborted: None,
        })
    }

    pub fn initial_deck(&self) -> &Deck {
        &self.initial
    }

    /// deck after the last accepted shuffle
    pub fn current_deck(&self) -> &Deck {
        self.history.last().map_or(&self.initial, |step| &step.deck)
    }

    pub fn next_shuffler(&self) -> Option<PlayerId> {
        if self.aborted.is_some() {
            return None;
        }
        self.order.get(self.history.len()).copied()
    }

    /// proof context for `player` at the current position
    pub fn context_for(&self, player: PlayerId) -> [u8; 32] {
        self.transcript.shuffle_context(player)
    }

    fn ensure_live(&self) -> Result<()> {
        match self.aborted {
            Some(player) => Err(ShuffleError::ChainAborted { player }),
            None => Ok(()),
        }
    }

    fn expect_turn(&self, player: PlayerId) -> Result<()> {
        let expected = self.next_shuffler();
        if expected != Some(player) {
            return Err(ShuffleError::UnexpectedShuffler {
                expected,
                got: player,
            });
        }
        Ok(())
    }

    /// shuffle the current deck as the next player; does not advance the chain
    pub fn prove_next<R: RngCore + CryptoRng>(
        &self,
        player: PlayerId,
        secrets: &ShuffleSecrets,
        rng: &mut R,
    ) -> Result<(Deck, ShuffleProof)> {
        self.ensure_live()?;
        self.expect_turn(player)?;
        let context = self.context_for(player);
        shuffle_encrypt(
            &self.params,
            &self.config,
            self.current_deck(),
            secrets,
            self.aggregate.point(),
            &context,
            rng,
        )
    }

    /// verify and accept `player`'s shuffle
    ///
    /// out-of-turn submissions are refused without affecting the chain; a
    /// proof that fails verification aborts it.
    pub fn apply(&mut self, player: PlayerId, deck: Deck, proof: ShuffleProof) -> Result<()> {
        self.ensure_live()?;
        self.expect_turn(player)?;

        let context = self.context_for(player);
        let position = self.history.len();
        if !verify_shuffle_proof(
            &self.params,
            self.current_deck(),
            &deck,
            self.aggregate.point(),
            &proof,
            &context,
        ) {
            tracing::warn!(player, position, "shuffle proof rejected, aborting chain");
            self.aborted = Some(player);
            return Err(ShuffleError::ShuffleRejected { player });
        }

        self.transcript.bind_shuffle(player, &deck.commitment());
        self.history.push(ShuffleStep {
            player,
            deck,
            proof,
        });
        tracing::info!(player, position, remaining = self.remaining(), "shuffle accepted");
        Ok(())
    }

    pub fn remaining(&self) -> usize {
        self.order.len() - self.history.len()
    }

    pub fn is_complete(&self) -> bool {
        self.aborted.is_none() && self.remaining() == 0
    }

    /// the player whose shuffle aborted the chain
    pub fn aborted_by(&self) -> Option<PlayerId> {
        self.aborted
    }

    pub fn history(&self) -> &[ShuffleStep] {
        &self.history
    }

    pub fn transcript(&self) -> &ShuffleTranscript {
        &self.transcript
    }

    pub fn aggregate(&self) -> &AggregatePublicKey {
        &self.aggregate
    }

    /// final deck plus the transcript to continue with reveals
    pub fn finalize(self) -> Result<(Deck, ShuffleTranscript)> {
        self.ensure_live()?;
        let remaining = self.remaining();
        if remaining > 0 {
            return Err(ShuffleError::ChainIncomplete { remaining });
        }
        let deck = self.current_deck().clone();
        Ok((deck, self.transcript))
    }
}

/// replay a published chain from scratch, returning the final deck
///
/// for observers who did not follow the game live. every key holder must
/// appear among the steps.
pub fn verify_chain(
    params: CurveParams,
    config: ShuffleConfig,
    aggregate: AggregatePublicKey,
    transcript: ShuffleTranscript,
    initial: Deck,
    steps: &[ShuffleStep],
) -> Result<Deck> {
    let order = steps.iter().map(|step| step.player).collect();
    let mut chain = ShuffleChain::new(params, config, aggregate, transcript, order, initial)?;
    for step in steps {
        chain.apply(step.player, step.deck.clone(), step.proof.clone())?;
    }
    chain.finalize().map(|(deck, _)| deck)
}
