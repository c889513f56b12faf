//! point and deck compression
//!
//! a point is stored as its affine x plus one selector bit choosing between
//! the two y roots of y² = (1 - a·x²) / (1 - d·x²). decompression checks the
//! curve equation eagerly and never returns a "nearest" point.

use ark_ff::{Field, One, Zero};

use crate::curve::{AffinePoint, CurveParams, EcPoint};
use crate::elgamal::{CipherCard, Deck};
use crate::error::{Result, ShuffleError};
use crate::field::{self, Fq, FIELD_BYTES};
use crate::wire::ByteReader;

/// affine x and the selector for y
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CompressedPoint {
    pub x: Fq,
    /// y is the larger root, i.e. y > (q-1)/2
    pub sign: bool,
}

impl CompressedPoint {
    /// x little-endian with the sign in the top bit (q < 2^255)
    pub fn to_bytes(&self) -> [u8; FIELD_BYTES] {
        let mut bytes = field::to_le_bytes(&self.x);
        if self.sign {
            bytes[FIELD_BYTES - 1] |= 0x80;
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8; FIELD_BYTES]) -> Result<Self> {
        let sign = bytes[FIELD_BYTES - 1] & 0x80 != 0;
        let mut raw = *bytes;
        raw[FIELD_BYTES - 1] &= 0x7f;
        let x = field::from_le_bytes(&raw)
            .ok_or_else(|| ShuffleError::InvalidEncoding("non-canonical x coordinate".into()))?;
        Ok(Self { x, sign })
    }
}

pub fn compress(params: &CurveParams, p: &EcPoint) -> Result<CompressedPoint> {
    if !params.is_on_curve(p) {
        return Err(ShuffleError::InvalidPoint("cannot compress point off the curve"));
    }
    let AffinePoint { x, y } = p.to_affine()?;
    Ok(CompressedPoint {
        x,
        sign: field::is_larger_root(&y),
    })
}

pub fn decompress(params: &CurveParams, c: &CompressedPoint) -> Result<EcPoint> {
    let x2 = c.x.square();
    let num = Fq::one() - params.a * x2;
    let den = Fq::one() - params.d * x2;
    let y2 = field::divide(&num, &den)
        .map_err(|_| ShuffleError::InvalidPoint("x coordinate has no curve point"))?;
    let root = y2
        .sqrt()
        .ok_or(ShuffleError::InvalidPoint("no square root for y²"))?;

    let y = if field::is_larger_root(&root) == c.sign { root } else { -root };
    // y = 0 has a single root, the sign bit must be clear
    if y.is_zero() && c.sign {
        return Err(ShuffleError::InvalidPoint("sign bit set for y = 0"));
    }
    Ok(EcPoint::from_affine(&AffinePoint { x: c.x, y }))
}

/// x-coordinates of both ciphertext halves plus packed selector bitmaps
/// (bit i of `selector0` belongs to card i's c0)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedDeck {
    pub c0: Vec<Fq>,
    pub c1: Vec<Fq>,
    pub selector0: Vec<u8>,
    pub selector1: Vec<u8>,
}

fn pack_bits(bits: impl Iterator<Item = bool>, n: usize) -> Vec<u8> {
    let mut packed = vec![0u8; n.div_ceil(8)];
    for (i, bit) in bits.enumerate() {
        if bit {
            packed[i / 8] |= 1 << (i % 8);
        }
    }
    packed
}

fn bit(packed: &[u8], i: usize) -> bool {
    packed.get(i / 8).is_some_and(|b| b >> (i % 8) & 1 == 1)
}

impl CompressedDeck {
    pub fn len(&self) -> usize {
        self.c0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.c0.is_empty()
    }

    /// layout: n (u32) || c0 x's || c1 x's || selector0 || selector1
    pub fn to_bytes(&self) -> Vec<u8> {
        let n = self.len();
        let mut bytes = Vec::with_capacity(4 + 2 * n * FIELD_BYTES + 2 * n.div_ceil(8));
        bytes.extend_from_slice(&(n as u32).to_le_bytes());
        for x in self.c0.iter().chain(&self.c1) {
            bytes.extend_from_slice(&field::to_le_bytes(x));
        }
        bytes.extend_from_slice(&self.selector0);
        bytes.extend_from_slice(&self.selector1);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let n = reader.read_len(2 * FIELD_BYTES)?;
        let c0 = (0..n).map(|_| reader.read_fq()).collect::<Result<Vec<_>>>()?;
        let c1 = (0..n).map(|_| reader.read_fq()).collect::<Result<Vec<_>>>()?;
        let selector0 = reader.read_bytes(n.div_ceil(8))?.to_vec();
        let selector1 = reader.read_bytes(n.div_ceil(8))?.to_vec();
        reader.finish()?;
        Ok(Self { c0, c1, selector0, selector1 })
    }
}

pub fn compress_deck(params: &CurveParams, deck: &Deck) -> Result<CompressedDeck> {
    let n = deck.len();
    let c0 = deck
        .iter()
        .map(|card| compress(params, &card.c0))
        .collect::<Result<Vec<_>>>()?;
    let c1 = deck
        .iter()
        .map(|card| compress(params, &card.c1))
        .collect::<Result<Vec<_>>>()?;
    Ok(CompressedDeck {
        selector0: pack_bits(c0.iter().map(|c| c.sign), n),
        selector1: pack_bits(c1.iter().map(|c| c.sign), n),
        c0: c0.into_iter().map(|c| c.x).collect(),
        c1: c1.into_iter().map(|c| c.x).collect(),
    })
}

pub fn decompress_deck(params: &CurveParams, compressed: &CompressedDeck) -> Result<Deck> {
    let n = compressed.c0.len();
    if compressed.c1.len() != n {
        return Err(ShuffleError::DeckSizeMismatch {
            expected: n,
            got: compressed.c1.len(),
        });
    }
    if compressed.selector0.len() != n.div_ceil(8) || compressed.selector1.len() != n.div_ceil(8) {
        return Err(ShuffleError::InvalidEncoding("selector bitmap length".into()));
    }
    let cards = (0..n)
        .map(|i| {
            let c0 = decompress(params, &CompressedPoint { x: compressed.c0[i], sign: bit(&compressed.selector0, i) })?;
            let c1 = decompress(params, &CompressedPoint { x: compressed.c1[i], sign: bit(&compressed.selector1, i) })?;
            Ok(CipherCard::new(c0, c1))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Deck::new(cards))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::BANDERSNATCH;
    use crate::elgamal::encrypt_deck;
    use crate::encoding::init_deck;
    use crate::field::random_scalar;
    use proptest::prelude::*;
    use rand::rngs::OsRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const P: CurveParams = BANDERSNATCH;

    #[test]
    fn test_roundtrip_identity_and_generator() {
        for p in [EcPoint::identity(), P.generator, -P.generator] {
            let c = compress(&P, &p).unwrap();
            assert_eq!(decompress(&P, &c).unwrap(), p);
        }
    }

    #[test]
    fn test_sign_selects_root() {
        let g = P.generator;
        let c = compress(&P, &g).unwrap();
        let flipped = CompressedPoint { x: c.x, sign: !c.sign };
        let other = decompress(&P, &flipped).unwrap().to_affine().unwrap();
        let g_aff = g.to_affine().unwrap();
        assert_eq!(other.x, g_aff.x);
        assert_eq!(other.y, -g_aff.y);
    }

    /// a small x with no curve point; about half of all x qualify
    fn off_curve_x() -> Fq {
        (2u64..200)
            .map(Fq::from)
            .find(|x| {
                let x2 = x.square();
                let y2 = (Fq::one() - P.a * x2) / (Fq::one() - P.d * x2);
                y2.sqrt().is_none()
            })
            .expect("some small x is off-curve")
    }

    #[test]
    fn test_invalid_x_rejected_eagerly() {
        let res = decompress(&P, &CompressedPoint { x: off_curve_x(), sign: false });
        assert!(matches!(res, Err(ShuffleError::InvalidPoint(_))));
    }

    #[test]
    fn test_byte_form_sign_bit() {
        let c = compress(&P, &P.mul_u64(&P.generator, 9)).unwrap();
        let bytes = c.to_bytes();
        assert_eq!(bytes[31] & 0x80 != 0, c.sign);
        assert_eq!(CompressedPoint::from_bytes(&bytes).unwrap(), c);
    }

    #[test]
    fn test_deck_roundtrip() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let pk = P.mul_generator(&random_scalar(&mut rng));
        let (deck, _) = encrypt_deck(&P, &init_deck(&P), &pk, &mut rng);

        let compressed = compress_deck(&P, &deck).unwrap();
        assert_eq!(compressed.len(), 52);
        assert_eq!(compressed.selector0.len(), 7);

        let bytes = compressed.to_bytes();
        let parsed = CompressedDeck::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, compressed);
        assert_eq!(decompress_deck(&P, &parsed).unwrap(), deck);
    }

    #[test]
    fn test_corrupted_deck_rejected() {
        let mut rng = OsRng;
        let pk = P.mul_generator(&random_scalar(&mut rng));
        let (deck, _) = encrypt_deck(&P, &init_deck(&P), &pk, &mut rng);
        let mut compressed = compress_deck(&P, &deck).unwrap();
        let mut short = compressed.clone();
        short.selector1.pop();
        assert!(decompress_deck(&P, &short).is_err());

        compressed.c1[17] = off_curve_x();
        assert!(matches!(
            decompress_deck(&P, &compressed),
            Err(ShuffleError::InvalidPoint(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_compress_roundtrip(seed in any::<u64>()) {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let p = P.mul_generator(&random_scalar(&mut rng));
            let c = compress(&P, &p).unwrap();
            let back = decompress(&P, &c).unwrap();
            prop_assert_eq!(back.to_affine().unwrap(), p.to_affine().unwrap());
        }
    }
}
