//! batch chaum-pedersen verification
//!
//! verifies many decryption share proofs with one random linear combination
//! instead of checking for each i:
//!   z_i·G  = a_i + c_i·pk_i
//!   z_i·c0_i = b_i + c_i·share_i
//! we check with weights ρ_i, σ_i:
//!   Σ ρ_i(z_i·G - a_i - c_i·pk_i) + σ_i(z_i·c0_i - b_i - c_i·share_i) = O
//!
//! one msm of 5n+1 points. on failure every proof is checked on its own so
//! the fault can be attributed.

use ark_ff::Zero;

use crate::curve::{CurveParams, EcPoint};
use crate::decrypt::{cp_challenge, cp_verify, ChaumPedersenProof, DecryptionShare};
use crate::elgamal::CipherCard;
use crate::field::Fr;
use crate::transcript::Blake2Transcript;

/// domain separator for batch weights
const BATCH_DOMAIN_SEP: &[u8] = b"zk-shuffle-proof.batch-cp.v1";

/// public values (pk, c0, share) where we prove log_G(pk) = log_c0(share)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChaumPedersenStatement {
    pub pk: EcPoint,
    pub c0: EcPoint,
    pub share: EcPoint,
}

/// collects proofs for batch verification
#[derive(Clone, Debug)]
pub struct BatchVerifier {
    proofs: Vec<(ChaumPedersenStatement, ChaumPedersenProof)>,
    seed: Vec<u8>,
}

impl BatchVerifier {
    /// `seed` separates batches from different contexts
    pub fn new(seed: &[u8]) -> Self {
        Self {
            proofs: Vec::new(),
            seed: seed.to_vec(),
        }
    }

    pub fn add(&mut self, pk: EcPoint, c0: EcPoint, share: EcPoint, proof: ChaumPedersenProof) {
        self.proofs.push((ChaumPedersenStatement { pk, c0, share }, proof));
    }

    pub fn len(&self) -> usize {
        self.proofs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proofs.is_empty()
    }

    /// weights bound to every statement and proof in the batch
    fn weights(&self) -> Vec<Fr> {
        let mut t = Blake2Transcript::new(BATCH_DOMAIN_SEP);
        t.append_message(b"seed", &self.seed);
        t.append_u64(b"n", self.proofs.len() as u64);
        for (stmt, proof) in &self.proofs {
            t.append_point(b"pk", &stmt.pk);
            t.append_point(b"c0", &stmt.c0);
            t.append_point(b"share", &stmt.share);
            t.append_point(b"a", &proof.a);
            t.append_point(b"b", &proof.b);
            t.append_scalar(b"z", &proof.z);
        }
        t.challenge_scalars(b"weight", 2 * self.proofs.len())
    }

    fn verify_combined(&self, params: &CurveParams) -> bool {
        let points: Vec<EcPoint> = self
            .proofs
            .iter()
            .flat_map(|(s, p)| [s.pk, s.c0, s.share, p.a, p.b])
            .collect();
        if !params.all_in_prime_subgroup(&points) {
            return false;
        }

        let n = self.proofs.len();
        let weights = self.weights();
        let mut bases = Vec::with_capacity(5 * n + 1);
        let mut scalars = Vec::with_capacity(5 * n + 1);
        let mut g_scalar = Fr::zero();

        for (i, (stmt, proof)) in self.proofs.iter().enumerate() {
            let (rho, sigma) = (weights[2 * i], weights[2 * i + 1]);
            let c = cp_challenge(params, &stmt.pk, &stmt.c0, &stmt.share, &proof.a, &proof.b);

            g_scalar += rho * proof.z;
            bases.extend([proof.a, stmt.pk, stmt.c0, proof.b, stmt.share]);
            scalars.extend([-rho, -(rho * c), sigma * proof.z, -sigma, -(sigma * c)]);
        }
        bases.push(params.generator);
        scalars.push(g_scalar);

        params.msm(&bases, &scalars).is_identity()
    }

    /// verify all proofs, naming the bad ones if the batch fails
    pub fn verify(&self, params: &CurveParams) -> BatchVerificationResult {
        if self.proofs.is_empty() {
            return BatchVerificationResult::from_results(true, &[]);
        }
        if self.verify_combined(params) {
            tracing::debug!(proofs = self.proofs.len(), "batch chaum-pedersen verified");
            return BatchVerificationResult::from_results(true, &vec![true; self.proofs.len()]);
        }

        let individual: Vec<bool> = self
            .proofs
            .iter()
            .map(|(s, p)| cp_verify(params, &s.pk, &s.c0, &s.share, p))
            .collect();
        tracing::debug!(proofs = self.proofs.len(), "batch failed, checked proofs individually");
        BatchVerificationResult::from_results(false, &individual)
    }
}

/// batch verification result with detailed diagnostics
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchVerificationResult {
    /// overall batch validity
    pub valid: bool,
    /// number of proofs verified
    pub count: usize,
    /// indices of invalid proofs (if any)
    pub invalid_indices: Vec<usize>,
}

impl BatchVerificationResult {
    pub fn from_results(valid: bool, individual_checks: &[bool]) -> Self {
        let invalid_indices: Vec<usize> = individual_checks
            .iter()
            .enumerate()
            .filter_map(|(i, &v)| if !v { Some(i) } else { None })
            .collect();

        Self {
            valid,
            count: individual_checks.len(),
            invalid_indices,
        }
    }
}

/// verify shares for many cards at once, e.g. a whole board reveal
///
/// each entry is (holder pk, card, share)
pub fn batch_verify_shares(
    params: &CurveParams,
    entries: &[(EcPoint, CipherCard, DecryptionShare)],
    seed: &[u8],
) -> BatchVerificationResult {
    let mut verifier = BatchVerifier::new(seed);
    for (pk, card, share) in entries {
        verifier.add(*pk, card.c0, share.share, share.proof);
    }
    verifier.verify(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::BANDERSNATCH;
    use crate::decrypt::generate_decrypt_proof;
    use crate::elgamal::encrypt;
    use crate::field::random_scalar;
    use crate::keys::KeyPair;
    use rand::rngs::OsRng;

    const P: CurveParams = BANDERSNATCH;

    fn entry() -> (EcPoint, CipherCard, DecryptionShare) {
        let kp = KeyPair::generate(&P, &mut OsRng);
        let m = P.mul_u64(&P.generator, 3);
        let card = encrypt(&P, &m, kp.public(), &random_scalar(&mut OsRng));
        let share = generate_decrypt_proof(&P, &kp, 0, &card, &mut OsRng).unwrap();
        (*kp.public(), card, share)
    }

    #[test]
    fn test_batch_verifier_empty() {
        let verifier = BatchVerifier::new(b"test");
        assert!(verifier.is_empty());
        assert!(verifier.verify(&P).valid);
    }

    #[test]
    fn test_batch_verifier_multiple() {
        let entries: Vec<_> = (0..5).map(|_| entry()).collect();
        let result = batch_verify_shares(&P, &entries, b"multi_test");
        assert!(result.valid);
        assert_eq!(result.count, 5);
        assert!(result.invalid_indices.is_empty());
    }

    #[test]
    fn test_batch_verifier_invalid() {
        let mut entries: Vec<_> = (0..4).map(|_| entry()).collect();
        entries[1].2.proof.z += Fr::from(1u64);
        entries[3].2.share = P.add(&entries[3].2.share, &P.generator);

        let result = batch_verify_shares(&P, &entries, b"invalid_test");
        assert!(!result.valid);
        assert_eq!(result.invalid_indices, vec![1, 3]);
    }

    #[test]
    fn test_swapped_shares_rejected() {
        // two valid proofs with their shares exchanged must not cancel out
        let mut entries: Vec<_> = (0..2).map(|_| entry()).collect();
        let s0 = entries[0].2.share;
        entries[0].2.share = entries[1].2.share;
        entries[1].2.share = s0;

        let result = batch_verify_shares(&P, &entries, b"swap");
        assert_eq!(result.invalid_indices, vec![0, 1]);
    }

    #[test]
    fn test_batch_verification_result() {
        let checks = vec![true, true, false, true, false];
        let result = BatchVerificationResult::from_results(false, &checks);

        assert!(!result.valid);
        assert_eq!(result.count, 5);
        assert_eq!(result.invalid_indices, vec![2, 4]);
    }

    #[test]
    fn test_weights_depend_on_seed() {
        let (pk, card, share) = entry();
        let mut a = BatchVerifier::new(b"same_seed");
        let mut b = BatchVerifier::new(b"different_seed");
        a.add(pk, card.c0, share.share, share.proof);
        b.add(pk, card.c0, share.share, share.proof);
        assert_ne!(a.weights(), b.weights());
        assert_eq!(a.weights(), a.clone().weights());
    }
}
