//! verifiable shuffle: permute + re-encrypt with a terelius-wikström proof
//!
//! statement: output[i] = input[ψ(i)] + (r̃ᵢ·G, r̃ᵢ·Y) for a secret
//! permutation ψ and secret r̃, under the table key Y.
//!
//! the prover commits to ψ column-wise (C_ψ(i) = r_ψ(i)·G + Hᵢ), derives
//! challenges u from the statement and commitments, and proves in one
//! sigma protocol that
//!   - the commitments open to a matrix whose rows sum to one
//!   - Π ũ = Π u for the committed reordering ũ of u (commitment chain Ĉ)
//!   - Σ ũᵢ·outputᵢ = Σ uⱼ·inputⱼ + re-encryption of zero
//!
//! soundness holds in the prime-order subgroup; the verifier rejects any
//! point outside it. proof size is linear in the deck size and fixed for a
//! given deck size.

use ark_ff::{One, Zero};
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::curve::{CurveParams, EcPoint};
use crate::elgamal::{rerandomize_deck, Deck};
use crate::error::{Result, ShuffleError};
use crate::field::{random_scalar, Fr};
use crate::generators::shuffle_generators;
use crate::permutation::ShuffleSecrets;
use crate::transcript::Blake2Transcript;
use crate::wire::{self, ByteReader, POINT_BYTES, SCALAR_BYTES};
use crate::{map_indexed, ShuffleConfig};

/// non-interactive proof of shuffle
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShuffleProof {
    /// permutation commitments C, indexed by input position
    pub permutation_commitments: Vec<EcPoint>,
    /// Ĉ₁..Ĉₙ, with Ĉ₀ = H₀ implicit
    pub chain_commitments: Vec<EcPoint>,
    pub t1: EcPoint,
    pub t2: EcPoint,
    pub t3: EcPoint,
    pub t4_c0: EcPoint,
    pub t4_c1: EcPoint,
    pub t_hat: Vec<EcPoint>,
    pub s1: Fr,
    pub s2: Fr,
    pub s3: Fr,
    pub s4: Fr,
    pub s_hat: Vec<Fr>,
    pub s_prime: Vec<Fr>,
}

impl ShuffleProof {
    /// number of cards the proof covers
    pub fn deck_size(&self) -> usize {
        self.permutation_commitments.len()
    }

    fn well_formed(&self) -> bool {
        let n = self.deck_size();
        n > 0
            && self.chain_commitments.len() == n
            && self.t_hat.len() == n
            && self.s_hat.len() == n
            && self.s_prime.len() == n
    }

    fn points(&self) -> Vec<EcPoint> {
        let mut points = Vec::with_capacity(3 * self.deck_size() + 5);
        points.extend_from_slice(&self.permutation_commitments);
        points.extend_from_slice(&self.chain_commitments);
        points.extend_from_slice(&self.t_hat);
        points.extend([self.t1, self.t2, self.t3, self.t4_c0, self.t4_c1]);
        points
    }

    /// serialized size for a deck of n cards
    pub fn byte_len(n: usize) -> usize {
        4 + (3 * n + 5) * POINT_BYTES + (2 * n + 4) * SCALAR_BYTES
    }

    /// layout: n (u32) || C || Ĉ || t1..t4 || t̂ || s1..s4 || ŝ || s'
    pub fn to_bytes(&self) -> Vec<u8> {
        let n = self.deck_size();
        let mut bytes = Vec::with_capacity(Self::byte_len(n));
        bytes.extend_from_slice(&(n as u32).to_le_bytes());
        for p in self
            .permutation_commitments
            .iter()
            .chain(&self.chain_commitments)
            .chain([&self.t1, &self.t2, &self.t3, &self.t4_c0, &self.t4_c1])
            .chain(&self.t_hat)
        {
            bytes.extend_from_slice(&wire::point_to_bytes(p));
        }
        for s in [&self.s1, &self.s2, &self.s3, &self.s4]
            .into_iter()
            .chain(&self.s_hat)
            .chain(&self.s_prime)
        {
            bytes.extend_from_slice(&wire::scalar_to_bytes(s));
        }
        bytes
    }

    pub fn from_bytes(params: &CurveParams, bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let n = reader.read_len(3 * POINT_BYTES + 2 * SCALAR_BYTES)?;
        let permutation_commitments = reader.read_points(params, n)?;
        let chain_commitments = reader.read_points(params, n)?;
        let t1 = reader.read_point(params)?;
        let t2 = reader.read_point(params)?;
        let t3 = reader.read_point(params)?;
        let t4_c0 = reader.read_point(params)?;
        let t4_c1 = reader.read_point(params)?;
        let t_hat = reader.read_points(params, n)?;
        let s1 = reader.read_scalar()?;
        let s2 = reader.read_scalar()?;
        let s3 = reader.read_scalar()?;
        let s4 = reader.read_scalar()?;
        let s_hat = (0..n).map(|_| reader.read_scalar()).collect::<Result<Vec<_>>>()?;
        let s_prime = (0..n).map(|_| reader.read_scalar()).collect::<Result<Vec<_>>>()?;
        reader.finish()?;
        Ok(Self {
            permutation_commitments,
            chain_commitments,
            t1,
            t2,
            t3,
            t4_c0,
            t4_c1,
            t_hat,
            s1,
            s2,
            s3,
            s4,
            s_hat,
            s_prime,
        })
    }
}

/// transcript over the statement and permutation commitments
fn statement_transcript(
    params: &CurveParams,
    pk: &EcPoint,
    before: &Deck,
    after: &Deck,
    commitments: &[EcPoint],
    context: &[u8],
) -> Blake2Transcript {
    let mut t = Blake2Transcript::new(b"zk-shuffle-proof.shuffle.v1");
    t.append_message(b"context", context);
    t.append_point(b"G", &params.generator);
    t.append_point(b"pk", pk);
    t.append_u64(b"n", before.len() as u64);
    for card in before {
        t.append_point(b"in.c0", &card.c0);
        t.append_point(b"in.c1", &card.c1);
    }
    for card in after {
        t.append_point(b"out.c0", &card.c0);
        t.append_point(b"out.c1", &card.c1);
    }
    t.append_points(b"C", commitments);
    t
}

fn bind_proof_commitments(t: &mut Blake2Transcript, proof: &ShuffleProof) -> Fr {
    t.append_points(b"C_hat", &proof.chain_commitments);
    t.append_point(b"t1", &proof.t1);
    t.append_point(b"t2", &proof.t2);
    t.append_point(b"t3", &proof.t3);
    t.append_point(b"t4_c0", &proof.t4_c0);
    t.append_point(b"t4_c1", &proof.t4_c1);
    t.append_points(b"t_hat", &proof.t_hat);
    t.challenge_scalar(b"c")
}

fn sum_scalars<'a>(it: impl IntoIterator<Item = &'a Fr>) -> Fr {
    it.into_iter().fold(Fr::zero(), |acc, s| acc + s)
}

fn inner_product(a: &[Fr], b: &[Fr]) -> Fr {
    a.iter().zip(b).fold(Fr::zero(), |acc, (x, y)| acc + *x * y)
}

/// permute and re-encrypt `deck`, returning the new deck and its proof
///
/// `context` binds the proof to the game position (see
/// [`crate::ShuffleTranscript::shuffle_context`]). the secrets must not be
/// reused for another shuffle.
pub fn shuffle_encrypt<R: RngCore + CryptoRng>(
    params: &CurveParams,
    config: &ShuffleConfig,
    deck: &Deck,
    secrets: &ShuffleSecrets,
    pk: &EcPoint,
    context: &[u8],
    rng: &mut R,
) -> Result<(Deck, ShuffleProof)> {
    let n = deck.len();
    if n == 0 {
        return Err(ShuffleError::ProofGeneration("empty deck".into()));
    }
    if n != config.deck_size {
        return Err(ShuffleError::ProofGeneration(format!(
            "deck has {} cards, config expects {}",
            n, config.deck_size
        )));
    }
    if secrets.permutation.len() != n || secrets.randomness.len() != n {
        return Err(ShuffleError::ProofGeneration(format!(
            "witness sized for {} cards, deck has {}",
            secrets.permutation.len().max(secrets.randomness.len()),
            n
        )));
    }
    if !params.is_on_curve(pk) || !deck.iter().all(|c| params.is_on_curve(&c.c0) && params.is_on_curve(&c.c1)) {
        return Err(ShuffleError::ProofGeneration("input contains a point off the curve".into()));
    }

    let g = params.generator;
    let psi = secrets.permutation.mapping();

    // output[i] = input[ψ(i)] + (r̃ᵢ·G, r̃ᵢ·Y)
    let permuted = Deck::new(secrets.permutation.apply(deck.cards())?);
    let output = rerandomize_deck(params, &permuted, pk, &secrets.randomness)?;

    let gens = shuffle_generators(params, n)?;
    let (h0, h) = (gens[0], &gens[1..]);

    // C_ψ(i) = r_ψ(i)·G + Hᵢ
    let mut r: Vec<Fr> = (0..n).map(|_| random_scalar(rng)).collect();
    let by_output = map_indexed(n, |i| params.add(&params.mul(&g, &r[psi[i]]), &h[i]));
    let mut commitments = vec![EcPoint::identity(); n];
    for (i, c) in by_output.into_iter().enumerate() {
        commitments[psi[i]] = c;
    }

    let mut t = statement_transcript(params, pk, deck, &output, &commitments, context);
    let u = t.challenge_scalars(b"u", n);
    let mut u_tilde: Vec<Fr> = psi.iter().map(|&j| u[j]).collect();

    // Ĉᵢ = r̂ᵢ·G + ũᵢ·Ĉᵢ₋₁, Ĉ₀ = H₀
    let mut r_hat: Vec<Fr> = (0..n).map(|_| random_scalar(rng)).collect();
    let mut chain = Vec::with_capacity(n);
    let mut prev = h0;
    for i in 0..n {
        let c = params.add(&params.mul(&g, &r_hat[i]), &params.mul(&prev, &u_tilde[i]));
        chain.push(c);
        prev = c;
    }

    let mut w = [
        random_scalar(rng),
        random_scalar(rng),
        random_scalar(rng),
        random_scalar(rng),
    ];
    let mut w_hat: Vec<Fr> = (0..n).map(|_| random_scalar(rng)).collect();
    let mut w_prime: Vec<Fr> = (0..n).map(|_| random_scalar(rng)).collect();

    let out_c0: Vec<EcPoint> = output.iter().map(|c| c.c0).collect();
    let out_c1: Vec<EcPoint> = output.iter().map(|c| c.c1).collect();

    let t3 = params.add(&params.mul(&g, &w[2]), &params.msm(h, &w_prime));
    let t4_c0 = params.sub(&params.msm(&out_c0, &w_prime), &params.mul(&g, &w[3]));
    let t4_c1 = params.sub(&params.msm(&out_c1, &w_prime), &params.mul(pk, &w[3]));
    let t_hat = map_indexed(n, |i| {
        let prev = if i == 0 { h0 } else { chain[i - 1] };
        params.add(&params.mul(&g, &w_hat[i]), &params.mul(&prev, &w_prime[i]))
    });

    let mut proof = ShuffleProof {
        permutation_commitments: commitments,
        chain_commitments: chain,
        t1: params.mul(&g, &w[0]),
        t2: params.mul(&g, &w[1]),
        t3,
        t4_c0,
        t4_c1,
        t_hat,
        s1: Fr::zero(),
        s2: Fr::zero(),
        s3: Fr::zero(),
        s4: Fr::zero(),
        s_hat: Vec::new(),
        s_prime: Vec::new(),
    };
    let c = bind_proof_commitments(&mut t, &proof);

    // vᵢ = Π_{k>i} ũₖ, so Ĉₙ = (Σ r̂ᵢ·vᵢ)·G + (Π ũ)·H₀
    let mut v = vec![Fr::one(); n];
    for i in (0..n - 1).rev() {
        v[i] = u_tilde[i + 1] * v[i + 1];
    }

    let r_bar = sum_scalars(&r);
    let r_chain = inner_product(&r_hat, &v);
    let r_commit = inner_product(&r, &u);
    let r_tilde = inner_product(&secrets.randomness, &u_tilde);

    proof.s1 = w[0] + c * r_bar;
    proof.s2 = w[1] + c * r_chain;
    proof.s3 = w[2] + c * r_commit;
    proof.s4 = w[3] + c * r_tilde;
    proof.s_hat = w_hat.iter().zip(&r_hat).map(|(w, r)| *w + c * r).collect();
    proof.s_prime = w_prime.iter().zip(&u_tilde).map(|(w, u)| *w + c * u).collect();

    r.zeroize();
    r_hat.zeroize();
    u_tilde.zeroize();
    v.zeroize();
    w.zeroize();
    w_hat.zeroize();
    w_prime.zeroize();

    tracing::debug!(cards = n, proof_bytes = ShuffleProof::byte_len(n), "generated shuffle proof");
    Ok((output, proof))
}

/// check that `after` is a permutation and re-encryption of `before` under `pk`
///
/// pure; any malformed input or size mismatch is a plain `false`
pub fn verify_shuffle_proof(
    params: &CurveParams,
    before: &Deck,
    after: &Deck,
    pk: &EcPoint,
    proof: &ShuffleProof,
    context: &[u8],
) -> bool {
    let n = before.len();
    if n == 0 || after.len() != n || proof.deck_size() != n || !proof.well_formed() {
        tracing::debug!(
            before = n,
            after = after.len(),
            proof = proof.deck_size(),
            "shuffle proof size mismatch"
        );
        return false;
    }

    let mut untrusted = before.points();
    untrusted.extend(after.points());
    untrusted.extend(proof.points());
    untrusted.push(*pk);
    if !params.all_in_prime_subgroup(&untrusted) {
        tracing::debug!("shuffle proof references a point outside the prime subgroup");
        return false;
    }

    let gens = match shuffle_generators(params, n) {
        Ok(gens) => gens,
        Err(_) => return false,
    };
    let (h0, h) = (gens[0], &gens[1..]);
    let g = params.generator;

    let mut t = statement_transcript(params, pk, before, after, &proof.permutation_commitments, context);
    let u = t.challenge_scalars(b"u", n);
    let c = bind_proof_commitments(&mut t, proof);

    let in_c0: Vec<EcPoint> = before.iter().map(|card| card.c0).collect();
    let in_c1: Vec<EcPoint> = before.iter().map(|card| card.c1).collect();
    let out_c0: Vec<EcPoint> = after.iter().map(|card| card.c0).collect();
    let out_c1: Vec<EcPoint> = after.iter().map(|card| card.c1).collect();

    // ΣC - ΣH = r̄·G
    let c_bar = params.sub(&params.sum(&proof.permutation_commitments), &params.sum(h));
    let eq1 = params.mul(&g, &proof.s1) == params.add(&proof.t1, &params.mul(&c_bar, &c));

    // Ĉₙ - (Π u)·H₀ = r̂·G
    let u_prod = u.iter().fold(Fr::one(), |acc, x| acc * x);
    let c_hat = params.sub(&proof.chain_commitments[n - 1], &params.mul(&h0, &u_prod));
    let eq2 = params.mul(&g, &proof.s2) == params.add(&proof.t2, &params.mul(&c_hat, &c));

    // Σ uⱼ·Cⱼ = r'·G + Σ ũᵢ·Hᵢ
    let c_tilde = params.msm(&proof.permutation_commitments, &u);
    let eq3 = params.add(&params.mul(&g, &proof.s3), &params.msm(h, &proof.s_prime))
        == params.add(&proof.t3, &params.mul(&c_tilde, &c));

    // Σ ũᵢ·outputᵢ - r̃·(G, Y) = Σ uⱼ·inputⱼ
    let b_tilde = params.msm(&in_c0, &u);
    let a_tilde = params.msm(&in_c1, &u);
    let eq4_c0 = params.sub(&params.msm(&out_c0, &proof.s_prime), &params.mul(&g, &proof.s4))
        == params.add(&proof.t4_c0, &params.mul(&b_tilde, &c));
    let eq4_c1 = params.sub(&params.msm(&out_c1, &proof.s_prime), &params.mul(pk, &proof.s4))
        == params.add(&proof.t4_c1, &params.mul(&a_tilde, &c));

    // Ĉᵢ = r̂ᵢ·G + ũᵢ·Ĉᵢ₋₁
    let chain_ok = map_indexed(n, |i| {
        let prev = if i == 0 { h0 } else { proof.chain_commitments[i - 1] };
        params.add(&params.mul(&g, &proof.s_hat[i]), &params.mul(&prev, &proof.s_prime[i]))
            == params.add(&proof.t_hat[i], &params.mul(&proof.chain_commitments[i], &c))
    });
    let eq5 = chain_ok.iter().all(|&ok| ok);

    let valid = eq1 && eq2 && eq3 && eq4_c0 && eq4_c1 && eq5;
    if !valid {
        tracing::debug!(eq1, eq2, eq3, eq4_c0, eq4_c1, eq5, "shuffle proof equations failed");
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::BANDERSNATCH;
    use crate::elgamal::{decrypt, encrypt_deck, CipherCard};
    use crate::encoding::{card_points, init_deck};
    use crate::field::Fq;
    use crate::permutation::Permutation;
    use rand::rngs::OsRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const P: CurveParams = BANDERSNATCH;

    struct Setup {
        sk: Fr,
        pk: EcPoint,
        deck: Deck,
        config: ShuffleConfig,
    }

    fn setup(n: usize, rng: &mut (impl RngCore + CryptoRng)) -> Setup {
        let sk = random_scalar(rng);
        let pk = P.mul_generator(&sk);
        let plain = Deck::new(
            card_points(&P)
                .into_iter()
                .take(n)
                .map(CipherCard::trivial)
                .collect(),
        );
        let (deck, _) = encrypt_deck(&P, &plain, &pk, rng);
        Setup {
            sk,
            pk,
            deck,
            config: ShuffleConfig::custom(n),
        }
    }

    #[test]
    fn test_shuffle_proof_completeness() {
        let mut rng = OsRng;
        let s = setup(8, &mut rng);
        let secrets = ShuffleSecrets::random(&mut rng, 8);

        let (after, proof) =
            shuffle_encrypt(&P, &s.config, &s.deck, &secrets, &s.pk, b"ctx", &mut rng).unwrap();
        assert_eq!(after.len(), 8);
        assert!(verify_shuffle_proof(&P, &s.deck, &after, &s.pk, &proof, b"ctx"));
    }

    #[test]
    fn test_output_is_permuted_reencryption() {
        let mut rng = OsRng;
        let s = setup(6, &mut rng);
        let perm = Permutation::new(vec![5, 3, 0, 1, 4, 2]).unwrap();
        let randomness = (0..6).map(|_| random_scalar(&mut rng)).collect();
        let secrets = ShuffleSecrets::new(perm.clone(), randomness);

        let (after, _) =
            shuffle_encrypt(&P, &s.config, &s.deck, &secrets, &s.pk, b"", &mut rng).unwrap();
        for i in 0..6 {
            assert_ne!(after[i], s.deck[perm.get(i)]);
            assert_eq!(
                decrypt(&P, &after[i], &s.sk),
                decrypt(&P, &s.deck[perm.get(i)], &s.sk)
            );
        }
    }

    #[test]
    fn test_deterministic_with_seeded_rng() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let s = setup(4, &mut rng);
        let secrets = ShuffleSecrets::random(&mut rng, 4);

        let a = shuffle_encrypt(&P, &s.config, &s.deck, &secrets, &s.pk, b"x", &mut ChaCha20Rng::seed_from_u64(9)).unwrap();
        let b = shuffle_encrypt(&P, &s.config, &s.deck, &secrets, &s.pk, b"x", &mut ChaCha20Rng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dropped_card_rejected() {
        let mut rng = OsRng;
        let s = setup(8, &mut rng);
        let secrets = ShuffleSecrets::random(&mut rng, 8);
        let (after, proof) =
            shuffle_encrypt(&P, &s.config, &s.deck, &secrets, &s.pk, b"ctx", &mut rng).unwrap();

        // replace one card with a copy of another (drop + duplicate)
        let mut cards = after.into_cards();
        cards[3] = cards[4].rerandomize(&P, &s.pk, &random_scalar(&mut rng));
        let forged = Deck::new(cards);
        assert!(!verify_shuffle_proof(&P, &s.deck, &forged, &s.pk, &proof, b"ctx"));

        // drop a card entirely
        let mut short = forged.into_cards();
        short.pop();
        assert!(!verify_shuffle_proof(&P, &s.deck, &Deck::new(short), &s.pk, &proof, b"ctx"));
    }

    #[test]
    fn test_cheating_prover_rejected() {
        let mut rng = OsRng;
        let s = setup(5, &mut rng);
        let secrets = ShuffleSecrets::random(&mut rng, 5);
        let (honest_after, _) =
            shuffle_encrypt(&P, &s.config, &s.deck, &secrets, &s.pk, b"ctx", &mut rng).unwrap();

        // prover swaps in a different plaintext for card 0 and re-proves
        // with its honest witness: the witness no longer matches
        let mut cards = honest_after.clone().into_cards();
        cards[0].c1 = P.add(&cards[0].c1, &P.generator);
        let tampered = Deck::new(cards);

        let (_, proof) =
            shuffle_encrypt(&P, &s.config, &s.deck, &secrets, &s.pk, b"ctx", &mut rng).unwrap();
        assert!(!verify_shuffle_proof(&P, &s.deck, &tampered, &s.pk, &proof, b"ctx"));
    }

    #[test]
    fn test_wrong_context_key_or_input() {
        let mut rng = OsRng;
        let s = setup(4, &mut rng);
        let secrets = ShuffleSecrets::random(&mut rng, 4);
        let (after, proof) =
            shuffle_encrypt(&P, &s.config, &s.deck, &secrets, &s.pk, b"round-1", &mut rng).unwrap();

        assert!(!verify_shuffle_proof(&P, &s.deck, &after, &s.pk, &proof, b"round-2"));
        let other_pk = P.mul_generator(&random_scalar(&mut rng));
        assert!(!verify_shuffle_proof(&P, &s.deck, &after, &other_pk, &proof, b"round-1"));
        let other = setup(4, &mut rng);
        assert!(!verify_shuffle_proof(&P, &other.deck, &after, &s.pk, &proof, b"round-1"));
    }

    #[test]
    fn test_tampered_proof_rejected() {
        let mut rng = OsRng;
        let s = setup(4, &mut rng);
        let secrets = ShuffleSecrets::random(&mut rng, 4);
        let (after, proof) =
            shuffle_encrypt(&P, &s.config, &s.deck, &secrets, &s.pk, b"", &mut rng).unwrap();

        let mut bad = proof.clone();
        bad.s4 += Fr::one();
        assert!(!verify_shuffle_proof(&P, &s.deck, &after, &s.pk, &bad, b""));

        let mut bad = proof.clone();
        bad.s_prime.swap(0, 1);
        assert!(!verify_shuffle_proof(&P, &s.deck, &after, &s.pk, &bad, b""));

        let mut bad = proof;
        bad.t_hat.pop();
        assert!(!verify_shuffle_proof(&P, &s.deck, &after, &s.pk, &bad, b""));
    }

    #[test]
    fn test_small_order_point_rejected() {
        let mut rng = OsRng;
        let s = setup(3, &mut rng);
        let secrets = ShuffleSecrets::random(&mut rng, 3);
        let (after, proof) =
            shuffle_encrypt(&P, &s.config, &s.deck, &secrets, &s.pk, b"", &mut rng).unwrap();

        // (0, -1) has order two
        let torsion = EcPoint::new(Fq::zero(), -Fq::one(), Fq::one());
        assert!(P.is_on_curve(&torsion));
        let mut cards = after.into_cards();
        cards[1].c1 = P.add(&cards[1].c1, &torsion);
        assert!(!verify_shuffle_proof(&P, &s.deck, &Deck::new(cards), &s.pk, &proof, b""));
    }

    #[test]
    fn test_invalid_witness_is_generation_error() {
        let mut rng = OsRng;
        let s = setup(4, &mut rng);

        let short = ShuffleSecrets::random(&mut rng, 3);
        assert!(matches!(
            shuffle_encrypt(&P, &s.config, &s.deck, &short, &s.pk, b"", &mut rng),
            Err(ShuffleError::ProofGeneration(_))
        ));

        let wrong_config = ShuffleConfig::standard_deck();
        let secrets = ShuffleSecrets::random(&mut rng, 4);
        assert!(matches!(
            shuffle_encrypt(&P, &wrong_config, &s.deck, &secrets, &s.pk, b"", &mut rng),
            Err(ShuffleError::ProofGeneration(_))
        ));
    }

    #[test]
    fn test_proof_bytes_roundtrip() {
        let mut rng = OsRng;
        let s = setup(5, &mut rng);
        let secrets = ShuffleSecrets::random(&mut rng, 5);
        let (after, proof) =
            shuffle_encrypt(&P, &s.config, &s.deck, &secrets, &s.pk, b"", &mut rng).unwrap();

        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), ShuffleProof::byte_len(5));
        let parsed = ShuffleProof::from_bytes(&P, &bytes).unwrap();
        assert_eq!(parsed, proof);
        assert!(verify_shuffle_proof(&P, &s.deck, &after, &s.pk, &parsed, b""));

        assert!(ShuffleProof::from_bytes(&P, &bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn test_full_deck_shuffle() {
        let mut rng = ChaCha20Rng::seed_from_u64(52);
        let sk = random_scalar(&mut rng);
        let pk = P.mul_generator(&sk);
        let (deck, _) = encrypt_deck(&P, &init_deck(&P), &pk, &mut rng);
        let secrets = ShuffleSecrets::random(&mut rng, 52);

        let (after, proof) = shuffle_encrypt(
            &P,
            &ShuffleConfig::standard_deck(),
            &deck,
            &secrets,
            &pk,
            b"full",
            &mut rng,
        )
        .unwrap();
        assert!(verify_shuffle_proof(&P, &deck, &after, &pk, &proof, b"full"));
    }
}
