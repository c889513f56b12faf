//! independent commitment generators
//!
//! try-and-increment hash to curve: hash (label, index, counter) to an x
//! coordinate, decompress, clear the cofactor. nobody knows a discrete log
//! between any two outputs or between an output and G.

use crate::compress::{decompress, CompressedPoint};
use crate::curve::{CurveParams, EcPoint};
use crate::error::{Result, ShuffleError};
use crate::field::Fq;
use crate::transcript::Blake2Transcript;

use ark_ff::PrimeField;

const MAX_ATTEMPTS: u64 = 256;

/// hash to a point of the prime-order subgroup
pub fn hash_to_point(params: &CurveParams, label: &[u8], index: u64) -> Result<EcPoint> {
    for counter in 0..MAX_ATTEMPTS {
        let mut t = Blake2Transcript::new(b"zk-shuffle-proof.hash-to-curve");
        t.append_message(b"label", label);
        t.append_u64(b"index", index);
        t.append_u64(b"counter", counter);

        let mut bytes = [0u8; 64];
        t.challenge_bytes(b"x", &mut bytes);
        let mut sign = [0u8; 1];
        t.challenge_bytes(b"sign", &mut sign);

        let candidate = CompressedPoint {
            x: Fq::from_le_bytes_mod_order(&bytes),
            sign: sign[0] & 1 == 1,
        };
        if let Ok(p) = decompress(params, &candidate) {
            let p = params.mul_by_cofactor(&p);
            if !p.is_identity() {
                return Ok(p);
            }
        }
    }
    Err(ShuffleError::InvalidConfig(
        "hash to curve found no point".into(),
    ))
}

/// H_0..=H_n for a shuffle of n cards
pub fn shuffle_generators(params: &CurveParams, n: usize) -> Result<Vec<EcPoint>> {
    let label = b"zk-shuffle-proof.shuffle-generators.v1";
    crate::map_indexed(n + 1, |i| hash_to_point(params, label, i as u64))
        .into_iter()
        .collect()
}
