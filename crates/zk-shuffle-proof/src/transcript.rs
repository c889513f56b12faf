//! blake2-based transcript with merlin-like api
//!
//! running hash accumulates appended data, challenges derived from cloned state

use blake2::{Blake2s256, Digest};

use crate::curve::EcPoint;
use crate::field::{scalar_from_wide, to_le_bytes, Fr, FIELD_BYTES};
use crate::keys::PlayerId;
use crate::wire;

/// blake2-based transcript (merlin-like api)
///
/// internally maintains a running hash that accumulates all appended data.
/// challenges are derived by cloning the state and finalizing.
#[derive(Clone)]
pub struct Blake2Transcript {
    state: Blake2s256,
    /// counter for challenge derivation (prevents reuse)
    challenge_counter: u64,
}

impl Blake2Transcript {
    pub fn new(domain_sep: &[u8]) -> Self {
        let mut state = Blake2s256::new();
        state.update(b"blake2-transcript-v1");
        state.update((domain_sep.len() as u32).to_le_bytes());
        state.update(domain_sep);
        Self {
            state,
            challenge_counter: 0,
        }
    }

    /// label length + label + message length + message
    pub fn append_message(&mut self, label: &[u8], message: &[u8]) {
        self.state.update((label.len() as u32).to_le_bytes());
        self.state.update(label);
        self.state.update((message.len() as u32).to_le_bytes());
        self.state.update(message);
    }

    pub fn append_u64(&mut self, label: &[u8], value: u64) {
        self.append_message(label, &value.to_le_bytes());
    }

    /// affine x || y, so every projective form of a point hashes alike
    pub fn append_point(&mut self, label: &[u8], point: &EcPoint) {
        match point.to_affine() {
            Ok(p) => {
                let mut bytes = [0u8; 2 * FIELD_BYTES];
                bytes[..FIELD_BYTES].copy_from_slice(&to_le_bytes(&p.x));
                bytes[FIELD_BYTES..].copy_from_slice(&to_le_bytes(&p.y));
                self.append_message(label, &bytes);
            }
            // Z = 0 is never a valid point; hash it raw so it still binds
            Err(_) => self.append_message(label, &wire::point_to_bytes(point)),
        }
    }

    pub fn append_points(&mut self, label: &[u8], points: &[EcPoint]) {
        self.append_u64(label, points.len() as u64);
        for p in points {
            self.append_point(label, p);
        }
    }

    pub fn append_scalar(&mut self, label: &[u8], scalar: &Fr) {
        self.append_message(label, &wire::scalar_to_bytes(scalar));
    }

    /// derive challenge bytes from current transcript state
    ///
    /// uses counter to ensure unique challenges even with same label
    pub fn challenge_bytes(&mut self, label: &[u8], dest: &mut [u8]) {
        let mut challenge_state = self.state.clone();
        challenge_state.update(b"challenge");
        challenge_state.update((label.len() as u32).to_le_bytes());
        challenge_state.update(label);
        challenge_state.update(self.challenge_counter.to_le_bytes());
        self.challenge_counter += 1;

        let hash = challenge_state.finalize();

        // chain hashes past 32 bytes
        if dest.len() <= 32 {
            dest.copy_from_slice(&hash[..dest.len()]);
        } else {
            let mut offset = 0;
            let mut seed = hash.to_vec();
            while offset < dest.len() {
                let take = (dest.len() - offset).min(32);
                dest[offset..offset + take].copy_from_slice(&seed[..take]);
                offset += take;
                if offset < dest.len() {
                    let mut h = Blake2s256::new();
                    h.update(&seed);
                    h.update(b"extend");
                    seed = h.finalize().to_vec();
                }
            }
        }

        // fold challenge back into state for forward secrecy
        self.state.update(b"challenge_out");
        self.state.update(&*dest);
    }

    /// 64 bytes reduced into the scalar field
    pub fn challenge_scalar(&mut self, label: &[u8]) -> Fr {
        let mut bytes = [0u8; 64];
        self.challenge_bytes(label, &mut bytes);
        scalar_from_wide(&bytes)
    }

    pub fn challenge_scalars(&mut self, label: &[u8], n: usize) -> Vec<Fr> {
        (0..n).map(|_| self.challenge_scalar(label)).collect()
    }
}

/// game-level transcript binding keys, decks, shuffles and reveals in order
#[derive(Clone)]
pub struct ShuffleTranscript {
    inner: Blake2Transcript,
}

impl ShuffleTranscript {
    pub fn new(game_id: &[u8], round: u32) -> Self {
        let mut t = Blake2Transcript::new(b"zk-shuffle-proof.game.v1");
        t.append_message(b"game_id", game_id);
        t.append_u64(b"round", round as u64);
        Self { inner: t }
    }

    pub fn bind_aggregate_key(&mut self, key_bytes: &[u8]) {
        self.inner.append_message(b"aggregate_pk", key_bytes);
    }

    /// bind a player's public key and key ownership proof
    pub fn bind_player_key(&mut self, player_id: PlayerId, pk_bytes: &[u8], proof_bytes: &[u8]) {
        self.inner.append_u64(b"player_id", player_id as u64);
        self.inner.append_message(b"player_pk", pk_bytes);
        self.inner.append_message(b"key_proof", proof_bytes);
    }

    pub fn bind_initial_deck(&mut self, deck_commitment: &[u8]) {
        self.inner.append_message(b"initial_deck", deck_commitment);
    }

    pub fn bind_shuffle(&mut self, player_id: PlayerId, shuffled_deck_commitment: &[u8]) {
        self.inner.append_u64(b"shuffler", player_id as u64);
        self.inner.append_message(b"shuffled_deck", shuffled_deck_commitment);
    }

    /// bind a verified decryption share for a deck position
    pub fn bind_reveal_token(&mut self, card_index: usize, player_id: PlayerId, token_bytes: &[u8]) {
        self.inner.append_u64(b"card_idx", card_index as u64);
        self.inner.append_u64(b"revealer", player_id as u64);
        self.inner.append_message(b"reveal_token", token_bytes);
    }

    pub fn challenge(&mut self, label: &'static [u8]) -> [u8; 32] {
        let mut challenge = [0u8; 32];
        self.inner.challenge_bytes(label, &mut challenge);
        challenge
    }

    /// fork transcript for a sub-protocol
    pub fn fork(&self, label: &'static [u8]) -> Self {
        let mut forked = self.inner.clone();
        forked.append_message(b"fork", label);
        Self { inner: forked }
    }

    /// proof context for the next shuffle, without advancing this transcript
    ///
    /// prover and verifiers derive the same bytes from the same history
    pub fn shuffle_context(&self, player_id: PlayerId) -> [u8; 32] {
        let mut forked = self.fork(b"shuffle");
        forked.inner.append_u64(b"shuffler", player_id as u64);
        forked.challenge(b"shuffle_context")
    }
}

impl core::fmt::Debug for ShuffleTranscript {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShuffleTranscript").finish_non_exhaustive()
    }
}
