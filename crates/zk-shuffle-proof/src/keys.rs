//! player keys and the table's aggregate encryption key
//!
//! registration requires a schnorr proof of knowledge of the secret key so
//! no player can choose pk = x·G - Σ others and decrypt alone. once closed,
//! the aggregate is fixed for the session.

use std::collections::BTreeMap;

use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::curve::{CurveParams, EcPoint};
use crate::error::{Result, ShuffleError};
use crate::field::{random_scalar, Fr};
use crate::transcript::{Blake2Transcript, ShuffleTranscript};
use crate::wire::{self, ByteReader, POINT_BYTES, SCALAR_BYTES};

pub type PlayerId = u8;

/// (sk, pk = sk·G); sk is wiped on drop
#[derive(Clone)]
pub struct KeyPair {
    sk: Fr,
    pk: EcPoint,
}

impl KeyPair {
    pub fn generate<R: RngCore + CryptoRng>(params: &CurveParams, rng: &mut R) -> Self {
        let sk = random_scalar(rng);
        Self {
            sk,
            pk: params.mul_generator(&sk),
        }
    }

    pub fn from_secret(params: &CurveParams, sk: Fr) -> Self {
        Self {
            sk,
            pk: params.mul_generator(&sk),
        }
    }

    pub fn public(&self) -> &EcPoint {
        &self.pk
    }

    pub fn secret(&self) -> &Fr {
        &self.sk
    }

    /// proof of knowledge of sk bound to a player id and session context
    pub fn prove_ownership<R: RngCore + CryptoRng>(
        &self,
        params: &CurveParams,
        player: PlayerId,
        context: &[u8],
        rng: &mut R,
    ) -> KeyOwnershipProof {
        let mut k = random_scalar(rng);
        let commitment = params.mul_generator(&k);
        let c = ownership_challenge(params, player, context, &self.pk, &commitment);
        let response = k + c * self.sk;
        k.zeroize();
        KeyOwnershipProof {
            commitment,
            response,
        }
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.sk.zeroize();
    }
}

impl core::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeyPair").field("pk", &self.pk).finish_non_exhaustive()
    }
}

/// Σ pks
pub fn aggregate_public_keys(params: &CurveParams, pks: &[EcPoint]) -> EcPoint {
    params.sum(pks)
}

/// schnorr proof: R = k·G, s = k + c·sk
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyOwnershipProof {
    pub commitment: EcPoint,
    pub response: Fr,
}

pub const KEY_PROOF_BYTES: usize = POINT_BYTES + SCALAR_BYTES;

impl KeyOwnershipProof {
    /// s·G == R + c·pk
    pub fn verify(&self, params: &CurveParams, player: PlayerId, context: &[u8], pk: &EcPoint) -> bool {
        if !params.is_on_curve(pk) || !params.is_on_curve(&self.commitment) {
            return false;
        }
        let c = ownership_challenge(params, player, context, pk, &self.commitment);
        params.mul_generator(&self.response) == params.add(&self.commitment, &params.mul(pk, &c))
    }

    pub fn to_bytes(&self) -> [u8; KEY_PROOF_BYTES] {
        let mut bytes = [0u8; KEY_PROOF_BYTES];
        bytes[..POINT_BYTES].copy_from_slice(&wire::point_to_bytes(&self.commitment));
        bytes[POINT_BYTES..].copy_from_slice(&wire::scalar_to_bytes(&self.response));
        bytes
    }

    pub fn from_bytes(params: &CurveParams, bytes: &[u8; KEY_PROOF_BYTES]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let proof = Self {
            commitment: reader.read_point(params)?,
            response: reader.read_scalar()?,
        };
        reader.finish()?;
        Ok(proof)
    }
}

fn ownership_challenge(
    params: &CurveParams,
    player: PlayerId,
    context: &[u8],
    pk: &EcPoint,
    commitment: &EcPoint,
) -> Fr {
    let mut t = Blake2Transcript::new(b"zk-shuffle-proof.key-ownership");
    t.append_message(b"context", context);
    t.append_u64(b"player", player as u64);
    t.append_point(b"G", &params.generator);
    t.append_point(b"pk", pk);
    t.append_point(b"R", commitment);
    t.challenge_scalar(b"c")
}

/// aggregate key plus the registered holders, frozen at close
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregatePublicKey {
    key: EcPoint,
    holders: Vec<(PlayerId, EcPoint)>,
    proofs: Vec<KeyOwnershipProof>,
}

impl AggregatePublicKey {
    pub fn point(&self) -> &EcPoint {
        &self.key
    }

    /// (player, pk) in ascending player order
    pub fn holders(&self) -> &[(PlayerId, EcPoint)] {
        &self.holders
    }

    pub fn holder_key(&self, player: PlayerId) -> Option<&EcPoint> {
        self.holders
            .iter()
            .find(|(id, _)| *id == player)
            .map(|(_, pk)| pk)
    }

    /// bind every holder key and the aggregate into the game transcript
    pub fn bind(&self, transcript: &mut ShuffleTranscript) {
        for ((player, pk), proof) in self.holders.iter().zip(&self.proofs) {
            transcript.bind_player_key(*player, &wire::point_to_bytes(pk), &proof.to_bytes());
        }
        transcript.bind_aggregate_key(&wire::point_to_bytes(&self.key));
    }
}

/// table key registration; mutable until [`KeyRegistry::close`]
#[derive(Clone, Debug)]
pub struct KeyRegistry {
    params: CurveParams,
    context: Vec<u8>,
    keys: BTreeMap<PlayerId, (EcPoint, KeyOwnershipProof)>,
    aggregate: EcPoint,
    closed: bool,
}

impl KeyRegistry {
    /// `context` is bound into every ownership proof (e.g. the game id)
    pub fn new(params: CurveParams, context: &[u8]) -> Self {
        Self {
            params,
            context: context.to_vec(),
            keys: BTreeMap::new(),
            aggregate: EcPoint::identity(),
            closed: false,
        }
    }

    pub fn context(&self) -> &[u8] {
        &self.context
    }

    pub fn register(&mut self, player: PlayerId, pk: EcPoint, proof: &KeyOwnershipProof) -> Result<()> {
        if self.closed {
            return Err(ShuffleError::RegistrationClosed);
        }
        if self.keys.contains_key(&player) {
            return Err(ShuffleError::DuplicatePlayer(player));
        }
        if !self.params.is_in_prime_subgroup(&pk) || pk.is_identity() {
            return Err(ShuffleError::InvalidPoint("public key outside prime subgroup"));
        }
        if !proof.verify(&self.params, player, &self.context, &pk) {
            tracing::warn!(player, "rejected key registration: bad ownership proof");
            return Err(ShuffleError::InvalidKeyProof(player));
        }
        self.aggregate = self.params.add(&self.aggregate, &pk);
        self.keys.insert(player, (pk, *proof));
        tracing::debug!(player, players = self.keys.len(), "registered key");
        Ok(())
    }

    /// leave the table before registration closes
    pub fn remove(&mut self, player: PlayerId) -> Result<()> {
        if self.closed {
            return Err(ShuffleError::RegistrationClosed);
        }
        let (pk, _) = self
            .keys
            .remove(&player)
            .ok_or(ShuffleError::UnknownPlayer(player))?;
        self.aggregate = self.params.sub(&self.aggregate, &pk);
        tracing::debug!(player, players = self.keys.len(), "removed key");
        Ok(())
    }

    /// running sum of registered keys
    pub fn current_aggregate(&self) -> &EcPoint {
        &self.aggregate
    }

    pub fn players(&self) -> Vec<PlayerId> {
        self.keys.keys().copied().collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// freeze the key set; later registrations or removals fail
    pub fn close(&mut self) -> Result<AggregatePublicKey> {
        if self.closed {
            return Err(ShuffleError::RegistrationClosed);
        }
        if self.keys.is_empty() {
            return Err(ShuffleError::NoKeys);
        }
        self.closed = true;
        tracing::info!(players = self.keys.len(), "key registration closed");
        Ok(AggregatePublicKey {
            key: self.aggregate,
            holders: self.keys.iter().map(|(id, (pk, _))| (*id, *pk)).collect(),
            proofs: self.keys.values().map(|(_, proof)| *proof).collect(),
        })
    }
}
