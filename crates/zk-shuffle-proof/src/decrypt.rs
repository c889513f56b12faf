//! verifiable partial decryption
//!
//! each key holder publishes share = sk·c0 with a chaum-pedersen proof that
//! log_G(pk) = log_c0(share). a card opens only once every holder of the
//! aggregate key has contributed a valid share: m = c1 - Σ shares.

use std::collections::BTreeMap;

use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::batch_chaum_pedersen::BatchVerifier;
use crate::curve::{CurveParams, EcPoint};
use crate::elgamal::CipherCard;
use crate::encoding::{Card, CardTable};
use crate::error::{Result, ShuffleError};
use crate::field::{random_scalar, Fr};
use crate::keys::{AggregatePublicKey, KeyPair, PlayerId};
use crate::transcript::{Blake2Transcript, ShuffleTranscript};
use crate::wire::{self, ByteReader, POINT_BYTES, SCALAR_BYTES};

pub const CP_PROOF_BYTES: usize = 2 * POINT_BYTES + SCALAR_BYTES;

/// proof of discrete log equality
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChaumPedersenProof {
    /// a = k·G
    pub a: EcPoint,
    /// b = k·c0
    pub b: EcPoint,
    /// z = k + c·sk
    pub z: Fr,
}

impl ChaumPedersenProof {
    pub fn to_bytes(&self) -> [u8; CP_PROOF_BYTES] {
        let mut bytes = [0u8; CP_PROOF_BYTES];
        bytes[..POINT_BYTES].copy_from_slice(&wire::point_to_bytes(&self.a));
        bytes[POINT_BYTES..2 * POINT_BYTES].copy_from_slice(&wire::point_to_bytes(&self.b));
        bytes[2 * POINT_BYTES..].copy_from_slice(&wire::scalar_to_bytes(&self.z));
        bytes
    }

    pub fn from_bytes(params: &CurveParams, bytes: &[u8; CP_PROOF_BYTES]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let a = reader.read_point(params)?;
        let b = reader.read_point(params)?;
        let z = reader.read_scalar()?;
        reader.finish()?;
        Ok(Self { a, b, z })
    }
}

/// fiat-shamir challenge over (G, pk, c0, share, a, b)
pub(crate) fn cp_challenge(
    params: &CurveParams,
    pk: &EcPoint,
    c0: &EcPoint,
    share: &EcPoint,
    a: &EcPoint,
    b: &EcPoint,
) -> Fr {
    let mut t = Blake2Transcript::new(b"zk-shuffle-proof.chaum-pedersen.v1");
    t.append_point(b"G", &params.generator);
    t.append_point(b"pk", pk);
    t.append_point(b"c0", c0);
    t.append_point(b"share", share);
    t.append_point(b"a", a);
    t.append_point(b"b", b);
    t.challenge_scalar(b"c")
}

/// prove share = sk·c0 for pk = sk·G
///
/// refuses to prove a false statement
pub fn cp_prove<R: RngCore + CryptoRng>(
    params: &CurveParams,
    sk: &Fr,
    pk: &EcPoint,
    c0: &EcPoint,
    share: &EcPoint,
    rng: &mut R,
) -> Result<ChaumPedersenProof> {
    if params.mul_generator(sk) != *pk {
        return Err(ShuffleError::ProofGeneration("public key does not match secret".into()));
    }
    if params.mul(c0, sk) != *share {
        return Err(ShuffleError::ProofGeneration("share is not sk·c0".into()));
    }

    let mut k = random_scalar(rng);
    let a = params.mul_generator(&k);
    let b = params.mul(c0, &k);
    let c = cp_challenge(params, pk, c0, share, &a, &b);
    let z = k + c * sk;
    k.zeroize();
    Ok(ChaumPedersenProof { a, b, z })
}

/// z·G = a + c·pk and z·c0 = b + c·share, all points in the prime subgroup
pub fn cp_verify(
    params: &CurveParams,
    pk: &EcPoint,
    c0: &EcPoint,
    share: &EcPoint,
    proof: &ChaumPedersenProof,
) -> bool {
    if !params.all_in_prime_subgroup(&[*pk, *c0, *share, proof.a, proof.b]) {
        return false;
    }
    let c = cp_challenge(params, pk, c0, share, &proof.a, &proof.b);
    params.mul_generator(&proof.z) == params.add(&proof.a, &params.mul(pk, &c))
        && params.mul(c0, &proof.z) == params.add(&proof.b, &params.mul(share, &c))
}

/// one player's contribution to opening a card
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecryptionShare {
    pub player: PlayerId,
    /// sk·c0
    pub share: EcPoint,
    pub proof: ChaumPedersenProof,
}

pub const DECRYPTION_SHARE_BYTES: usize = 1 + POINT_BYTES + CP_PROOF_BYTES;

impl DecryptionShare {
    pub fn to_bytes(&self) -> [u8; DECRYPTION_SHARE_BYTES] {
        let mut bytes = [0u8; DECRYPTION_SHARE_BYTES];
        bytes[0] = self.player;
        bytes[1..1 + POINT_BYTES].copy_from_slice(&wire::point_to_bytes(&self.share));
        bytes[1 + POINT_BYTES..].copy_from_slice(&self.proof.to_bytes());
        bytes
    }

    pub fn from_bytes(params: &CurveParams, bytes: &[u8; DECRYPTION_SHARE_BYTES]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let player = reader.read_u8()?;
        let share = reader.read_point(params)?;
        let a = reader.read_point(params)?;
        let b = reader.read_point(params)?;
        let z = reader.read_scalar()?;
        reader.finish()?;
        Ok(Self {
            player,
            share,
            proof: ChaumPedersenProof { a, b, z },
        })
    }

    /// check against the holder's public key and the card being opened
    pub fn verify(&self, params: &CurveParams, pk: &EcPoint, card: &CipherCard) -> bool {
        cp_verify(params, pk, &card.c0, &self.share, &self.proof)
    }
}

/// compute and prove this player's share for `card`
pub fn generate_decrypt_proof<R: RngCore + CryptoRng>(
    params: &CurveParams,
    keypair: &KeyPair,
    player: PlayerId,
    card: &CipherCard,
    rng: &mut R,
) -> Result<DecryptionShare> {
    params.check_on_curve(&card.c0)?;
    let share = params.mul(&card.c0, keypair.secret());
    let proof = cp_prove(params, keypair.secret(), keypair.public(), &card.c0, &share, rng)?;
    Ok(DecryptionShare {
        player,
        share,
        proof,
    })
}

/// collects shares for one card until every key holder has contributed
#[derive(Clone, Debug)]
pub struct CardReveal {
    params: CurveParams,
    card: CipherCard,
    holders: Vec<(PlayerId, EcPoint)>,
    shares: BTreeMap<PlayerId, DecryptionShare>,
}

impl CardReveal {
    pub fn new(params: CurveParams, aggregate: &AggregatePublicKey, card: CipherCard) -> Self {
        Self {
            params,
            card,
            holders: aggregate.holders().to_vec(),
            shares: BTreeMap::new(),
        }
    }

    pub fn card(&self) -> &CipherCard {
        &self.card
    }

    fn holder_key(&self, player: PlayerId) -> Result<EcPoint> {
        self.holders
            .iter()
            .find(|(id, _)| *id == player)
            .map(|(_, pk)| *pk)
            .ok_or(ShuffleError::UnknownPlayer(player))
    }

    /// verify and record one share
    pub fn add_share(&mut self, share: DecryptionShare) -> Result<()> {
        let pk = self.holder_key(share.player)?;
        if self.shares.contains_key(&share.player) {
            return Err(ShuffleError::DuplicateShare(share.player));
        }
        if !share.verify(&self.params, &pk, &self.card) {
            tracing::warn!(player = share.player, "rejected decryption share");
            return Err(ShuffleError::InvalidDecryptionShare {
                player: share.player,
            });
        }
        self.shares.insert(share.player, share);
        Ok(())
    }

    /// verify several shares in one batch; nothing is recorded unless all pass
    pub fn add_shares(&mut self, shares: &[DecryptionShare]) -> Result<()> {
        let mut batch = BatchVerifier::new(b"zk-shuffle-proof.card-reveal");
        for (i, share) in shares.iter().enumerate() {
            let pk = self.holder_key(share.player)?;
            if self.shares.contains_key(&share.player)
                || shares[..i].iter().any(|s| s.player == share.player)
            {
                return Err(ShuffleError::DuplicateShare(share.player));
            }
            batch.add(pk, self.card.c0, share.share, share.proof);
        }

        let result = batch.verify(&self.params);
        if let Some(&first) = result.invalid_indices.first() {
            let player = shares[first].player;
            tracing::warn!(player, invalid = result.invalid_indices.len(), "rejected decryption share batch");
            return Err(ShuffleError::InvalidDecryptionShare { player });
        }
        for share in shares {
            self.shares.insert(share.player, *share);
        }
        Ok(())
    }

    /// holders that have not contributed yet, ascending
    pub fn missing(&self) -> Vec<PlayerId> {
        self.holders
            .iter()
            .map(|(id, _)| *id)
            .filter(|id| !self.shares.contains_key(id))
            .collect()
    }

    pub fn is_ready(&self) -> bool {
        self.missing().is_empty()
    }

    /// bind every accepted share for deck position `index`
    pub fn bind(&self, transcript: &mut ShuffleTranscript, index: usize) {
        for share in self.shares.values() {
            transcript.bind_reveal_token(index, share.player, &wire::point_to_bytes(&share.share));
        }
    }

    /// c1 - Σ shares, once every holder has contributed
    pub fn recover_point(&self) -> Result<EcPoint> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(ShuffleError::MissingShares { players: missing });
        }
        let total = self.params.sum(self.shares.values().map(|s| &s.share));
        Ok(self.params.sub(&self.card.c1, &total))
    }

    pub fn open(&self, table: &CardTable) -> Result<Card> {
        let point = self.recover_point()?;
        let card = table
            .lookup(&self.params, &point)
            .ok_or(ShuffleError::UnknownCard)?;
        tracing::info!(%card, shares = self.shares.len(), "card opened");
        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::BANDERSNATCH;
    use crate::elgamal::encrypt;
    use crate::encoding::{card_points, Rank, Suit};
    use crate::keys::KeyRegistry;
    use rand::rngs::OsRng;

    const P: CurveParams = BANDERSNATCH;

    fn table(n: u8) -> (Vec<KeyPair>, AggregatePublicKey) {
        let mut reg = KeyRegistry::new(P, b"decrypt-test");
        let kps = (0..n)
            .map(|id| {
                let kp = KeyPair::generate(&P, &mut OsRng);
                let proof = kp.prove_ownership(&P, id, reg.context(), &mut OsRng);
                reg.register(id, *kp.public(), &proof).unwrap();
                kp
            })
            .collect();
        (kps, reg.close().unwrap())
    }

    fn encrypted_card(agg: &AggregatePublicKey, index: usize) -> CipherCard {
        let m = card_points(&P)[index];
        encrypt(&P, &m, agg.point(), &random_scalar(&mut OsRng))
    }

    #[test]
    fn test_cp_completeness() {
        let kp = KeyPair::generate(&P, &mut OsRng);
        let c0 = P.mul_generator(&random_scalar(&mut OsRng));
        let share = P.mul(&c0, kp.secret());

        let proof = cp_prove(&P, kp.secret(), kp.public(), &c0, &share, &mut OsRng).unwrap();
        assert!(cp_verify(&P, kp.public(), &c0, &share, &proof));
    }

    #[test]
    fn test_cp_wrong_share_rejected() {
        let kp = KeyPair::generate(&P, &mut OsRng);
        let c0 = P.mul_generator(&random_scalar(&mut OsRng));
        let share = P.mul(&c0, kp.secret());
        let proof = cp_prove(&P, kp.secret(), kp.public(), &c0, &share, &mut OsRng).unwrap();

        let shifted = P.add(&share, &P.generator);
        assert!(!cp_verify(&P, kp.public(), &c0, &shifted, &proof));

        let other = KeyPair::generate(&P, &mut OsRng);
        assert!(!cp_verify(&P, other.public(), &c0, &share, &proof));
    }

    #[test]
    fn test_cp_refuses_false_statement() {
        let kp = KeyPair::generate(&P, &mut OsRng);
        let c0 = P.mul_generator(&random_scalar(&mut OsRng));
        let wrong = P.add(&P.mul(&c0, kp.secret()), &P.generator);
        assert!(matches!(
            cp_prove(&P, kp.secret(), kp.public(), &c0, &wrong, &mut OsRng),
            Err(ShuffleError::ProofGeneration(_))
        ));
    }

    #[test]
    fn test_cp_proof_bytes() {
        let kp = KeyPair::generate(&P, &mut OsRng);
        let card = encrypted_card(&table(1).1, 0);
        let share = generate_decrypt_proof(&P, &kp, 0, &card, &mut OsRng).unwrap();

        let bytes = share.proof.to_bytes();
        assert_eq!(ChaumPedersenProof::from_bytes(&P, &bytes).unwrap(), share.proof);
        let bytes = share.to_bytes();
        assert_eq!(DecryptionShare::from_bytes(&P, &bytes).unwrap(), share);
    }

    #[test]
    fn test_reveal_requires_every_holder() {
        let (kps, agg) = table(3);
        let card = encrypted_card(&agg, 12);
        let cards = CardTable::new(&P).unwrap();
        let mut reveal = CardReveal::new(P, &agg, card);

        for (id, kp) in kps.iter().enumerate().take(2) {
            let share = generate_decrypt_proof(&P, kp, id as u8, &card, &mut OsRng).unwrap();
            reveal.add_share(share).unwrap();
        }
        assert_eq!(reveal.open(&cards), Err(ShuffleError::MissingShares { players: vec![2] }));

        let share = generate_decrypt_proof(&P, &kps[2], 2, &card, &mut OsRng).unwrap();
        reveal.add_share(share).unwrap();
        assert!(reveal.is_ready());
        assert_eq!(reveal.open(&cards).unwrap(), Card::new(Rank::Ace, Suit::Hearts));
    }

    #[test]
    fn test_reveal_rejects_bad_shares() {
        let (kps, agg) = table(2);
        let card = encrypted_card(&agg, 0);
        let mut reveal = CardReveal::new(P, &agg, card);

        let good = generate_decrypt_proof(&P, &kps[0], 0, &card, &mut OsRng).unwrap();
        let stranger = KeyPair::generate(&P, &mut OsRng);
        let foreign = generate_decrypt_proof(&P, &stranger, 7, &card, &mut OsRng).unwrap();
        assert_eq!(reveal.add_share(foreign), Err(ShuffleError::UnknownPlayer(7)));

        // player 1 claims player 0's share
        let mut stolen = good;
        stolen.player = 1;
        assert_eq!(
            reveal.add_share(stolen),
            Err(ShuffleError::InvalidDecryptionShare { player: 1 })
        );

        let mut bumped = generate_decrypt_proof(&P, &kps[1], 1, &card, &mut OsRng).unwrap();
        bumped.share = P.add(&bumped.share, &P.generator);
        assert_eq!(
            reveal.add_share(bumped),
            Err(ShuffleError::InvalidDecryptionShare { player: 1 })
        );

        reveal.add_share(good).unwrap();
        assert_eq!(reveal.add_share(good), Err(ShuffleError::DuplicateShare(0)));
        assert_eq!(reveal.missing(), vec![1]);
    }

    #[test]
    fn test_batch_add_attributes_fault() {
        let (kps, agg) = table(3);
        let card = encrypted_card(&agg, 40);
        let mut shares: Vec<DecryptionShare> = kps
            .iter()
            .enumerate()
            .map(|(id, kp)| generate_decrypt_proof(&P, kp, id as u8, &card, &mut OsRng).unwrap())
            .collect();

        let mut reveal = CardReveal::new(P, &agg, card);
        let honest = shares[2];
        shares[2].share = P.add(&shares[2].share, &P.generator);
        assert_eq!(
            reveal.add_shares(&shares),
            Err(ShuffleError::InvalidDecryptionShare { player: 2 })
        );
        assert_eq!(reveal.missing(), vec![0, 1, 2]);

        shares[2] = honest;
        reveal.add_shares(&shares).unwrap();
        let table = CardTable::new(&P).unwrap();
        assert_eq!(reveal.open(&table).unwrap().to_index(), 40);
    }

    #[test]
    fn test_non_card_point_is_unknown() {
        let (kps, agg) = table(1);
        let off_table = P.mul_u64(&P.generator, 1000);
        let card = encrypt(&P, &off_table, agg.point(), &random_scalar(&mut OsRng));
        let mut reveal = CardReveal::new(P, &agg, card);
        reveal
            .add_share(generate_decrypt_proof(&P, &kps[0], 0, &card, &mut OsRng).unwrap())
            .unwrap();
        assert_eq!(reveal.recover_point().unwrap(), off_table);
        assert_eq!(reveal.open(&CardTable::new(&P).unwrap()), Err(ShuffleError::UnknownCard));
    }
}
