//! base and scalar field helpers
//!
//! `Fq` is the bls12-381 scalar field and holds curve coordinates.
//! `Fr` has the order of the bandersnatch prime subgroup and holds secret
//! keys, randomness and fiat-shamir challenges.
//!
//! add/sub/mul/square/neg/eq are the arkworks operators; only the partial
//! operations are wrapped here.

pub use ark_ed_on_bls12_381_bandersnatch::{Fq, Fr};

use ark_ff::{BigInt, BigInteger, Field, PrimeField};
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::error::ArithmeticError;

/// curve coordinate
pub type FieldElement = Fq;

/// exponent for scalar multiplication
pub type Scalar = Fr;

/// serialized width of both fields
pub const FIELD_BYTES: usize = 32;

/// x⁻¹, failing on zero
pub fn inverse(x: &Fq) -> Result<Fq, ArithmeticError> {
    x.inverse().ok_or(ArithmeticError::InverseOfZero)
}

/// num / den, failing on a zero denominator
pub fn divide(num: &Fq, den: &Fq) -> Result<Fq, ArithmeticError> {
    den.inverse()
        .map(|inv| *num * inv)
        .ok_or(ArithmeticError::DivisionByZero)
}

/// true iff x is the larger of {x, -x}, i.e. x > (q-1)/2
pub fn is_larger_root(x: &Fq) -> bool {
    x.into_bigint() > Fq::MODULUS_MINUS_ONE_DIV_TWO
}

/// canonical little-endian encoding
pub fn to_le_bytes<F: PrimeField<BigInt = BigInt<4>>>(x: &F) -> [u8; FIELD_BYTES] {
    let mut out = [0u8; FIELD_BYTES];
    for (o, b) in out.iter_mut().zip(x.into_bigint().to_bytes_le()) {
        *o = b;
    }
    out
}

/// decode a canonical little-endian element, rejecting values >= modulus
pub fn from_le_bytes<F: PrimeField<BigInt = BigInt<4>>>(bytes: &[u8; FIELD_BYTES]) -> Option<F> {
    let mut limbs = [0u64; 4];
    for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(8)) {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        *limb = u64::from_le_bytes(word);
    }
    F::from_bigint(BigInt::new(limbs))
}

/// reduce 64 uniform bytes into a scalar (bias below 2^-250)
pub fn scalar_from_wide(bytes: &[u8; 64]) -> Fr {
    Fr::from_le_bytes_mod_order(bytes)
}

/// sample a uniform scalar from a secure rng
pub fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Fr {
    let mut bytes = [0u8; 64];
    rng.fill_bytes(&mut bytes);
    let s = scalar_from_wide(&bytes);
    bytes.zeroize();
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::{One, Zero};
    use rand::rngs::OsRng;

    #[test]
    fn test_inverse_of_zero_fails() {
        assert_eq!(inverse(&Fq::zero()), Err(ArithmeticError::InverseOfZero));
        assert_eq!(
            divide(&Fq::one(), &Fq::zero()),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn test_divide() {
        let a = Fq::from(84u64);
        let b = Fq::from(2u64);
        assert_eq!(divide(&a, &b).unwrap(), Fq::from(42u64));
        assert_eq!(inverse(&b).unwrap() * b, Fq::one());
    }

    #[test]
    fn test_larger_root_is_exclusive() {
        for v in [1u64, 2, 5, 1 << 40] {
            let x = Fq::from(v);
            assert_ne!(is_larger_root(&x), is_larger_root(&-x));
        }
        assert!(!is_larger_root(&Fq::zero()));
    }

    #[test]
    fn test_encoding_roundtrip_and_canonical() {
        let x = Fq::from(0xdead_beef_u64);
        let bytes = to_le_bytes(&x);
        assert_eq!(bytes[0], 0xef);
        assert_eq!(from_le_bytes::<Fq>(&bytes), Some(x));

        // the modulus itself is not a canonical encoding
        let modulus = Fq::MODULUS.to_bytes_le();
        let mut raw = [0u8; FIELD_BYTES];
        raw.copy_from_slice(&modulus);
        assert_eq!(from_le_bytes::<Fq>(&raw), None);
        assert_eq!(from_le_bytes::<Fq>(&[0xff; FIELD_BYTES]), None);
    }

    #[test]
    fn test_random_scalars_differ() {
        let mut rng = OsRng;
        assert_ne!(random_scalar(&mut rng), random_scalar(&mut rng));
    }
}
