//! twisted edwards group law in projective coordinates
//!
//! curve: a·x² + y² = 1 + d·x²·y², parameters carried by an explicit
//! [`CurveParams`] value. the production instance is bandersnatch over the
//! bls12-381 scalar field (a = -5, cofactor 4).
//!
//! addition uses the unified formula (no branching on inputs). on
//! bandersnatch neither a nor d is a square, so the formula is
//! exception-free on the prime-order subgroup, which is where every point
//! this crate produces lives.

use core::ops::Neg;

use ark_ff::{BigInteger, Field, MontFp, PrimeField, Zero};

use crate::error::ArithmeticError;
use crate::field::{Fq, Fr};

/// projective point (X : Y : Z) representing (X/Z, Y/Z)
#[derive(Clone, Copy, Debug)]
pub struct EcPoint {
    pub x: Fq,
    pub y: Fq,
    pub z: Fq,
}

/// normalized point
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AffinePoint {
    pub x: Fq,
    pub y: Fq,
}

impl EcPoint {
    /// neutral element (0 : 1 : 1)
    pub const fn identity() -> Self {
        Self {
            x: MontFp!("0"),
            y: MontFp!("1"),
            z: MontFp!("1"),
        }
    }

    pub const fn new(x: Fq, y: Fq, z: Fq) -> Self {
        Self { x, y, z }
    }

    pub fn from_affine(p: &AffinePoint) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: MontFp!("1"),
        }
    }

    /// (X/Z, Y/Z)
    pub fn to_affine(&self) -> Result<AffinePoint, ArithmeticError> {
        let z_inv = self.z.inverse().ok_or(ArithmeticError::PointAtInfinity)?;
        Ok(AffinePoint {
            x: self.x * z_inv,
            y: self.y * z_inv,
        })
    }

    pub fn is_identity(&self) -> bool {
        self.x.is_zero() && self.y == self.z && !self.z.is_zero()
    }
}

impl PartialEq for EcPoint {
    fn eq(&self, other: &Self) -> bool {
        self.x * other.z == other.x * self.z && self.y * other.z == other.y * self.z
    }
}

impl Eq for EcPoint {}

impl Neg for EcPoint {
    type Output = EcPoint;

    fn neg(self) -> EcPoint {
        EcPoint {
            x: -self.x,
            y: self.y,
            z: self.z,
        }
    }
}

/// immutable curve description passed into every group operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurveParams {
    pub a: Fq,
    pub d: Fq,
    /// generator of the prime-order subgroup
    pub generator: EcPoint,
    /// #E / l
    pub cofactor: u64,
}

/// bandersnatch (masny / bowe-hopwood 2021)
pub const BANDERSNATCH: CurveParams = CurveParams {
    a: MontFp!("-5"),
    d: MontFp!("45022363124591815672509500913686876175488063829319466900776701791074614335719"),
    generator: EcPoint::new(
        MontFp!("18886178867200960497001835917649091219057080094937609519140440539760939937304"),
        MontFp!("19188667384257783945677642223292697773471335439753913231509108946878080696678"),
        MontFp!("1"),
    ),
    cofactor: 4,
};

impl Default for CurveParams {
    fn default() -> Self {
        BANDERSNATCH
    }
}

impl CurveParams {
    pub const fn bandersnatch() -> Self {
        BANDERSNATCH
    }

    /// unified projective addition
    pub fn add(&self, p: &EcPoint, q: &EcPoint) -> EcPoint {
        let a = p.z * q.z;
        let b = a.square();
        let c = p.x * q.x;
        let d = p.y * q.y;
        let e = self.d * c * d;
        let f = b - e;
        let g = b + e;
        EcPoint {
            x: a * f * ((p.x + p.y) * (q.x + q.y) - c - d),
            y: a * g * (d - self.a * c),
            z: f * g,
        }
    }

    pub fn double(&self, p: &EcPoint) -> EcPoint {
        self.add(p, p)
    }

    pub fn sub(&self, p: &EcPoint, q: &EcPoint) -> EcPoint {
        self.add(p, &-*q)
    }

    /// montgomery ladder over big-endian bits; one add and one double per bit
    ///
    /// not constant time: the register update branches on each bit of the
    /// scalar, and the field arithmetic is not constant time either.
    fn ladder(&self, p: &EcPoint, bits_be: impl IntoIterator<Item = bool>) -> EcPoint {
        let mut r0 = EcPoint::identity();
        let mut r1 = *p;
        for bit in bits_be {
            if bit {
                r0 = self.add(&r0, &r1);
                r1 = self.double(&r1);
            } else {
                r1 = self.add(&r0, &r1);
                r0 = self.double(&r0);
            }
        }
        r0
    }

    /// k·P
    pub fn mul(&self, p: &EcPoint, k: &Fr) -> EcPoint {
        self.ladder(p, k.into_bigint().to_bits_be())
    }

    /// k·G
    pub fn mul_generator(&self, k: &Fr) -> EcPoint {
        self.mul(&self.generator, k)
    }

    /// k·P for a small public integer (card indices, cofactor)
    pub fn mul_u64(&self, p: &EcPoint, k: u64) -> EcPoint {
        self.ladder(p, (0..64).rev().map(|i| (k >> i) & 1 == 1))
    }

    pub fn mul_by_cofactor(&self, p: &EcPoint) -> EcPoint {
        self.mul_u64(p, self.cofactor)
    }

    /// Σ points
    pub fn sum<'a>(&self, points: impl IntoIterator<Item = &'a EcPoint>) -> EcPoint {
        points
            .into_iter()
            .fold(EcPoint::identity(), |acc, p| self.add(&acc, p))
    }

    /// Σ kᵢ·Pᵢ (independent terms, parallel with the `parallel` feature)
    pub fn msm(&self, points: &[EcPoint], scalars: &[Fr]) -> EcPoint {
        debug_assert_eq!(points.len(), scalars.len());
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            points
                .par_iter()
                .zip(scalars.par_iter())
                .map(|(p, k)| self.mul(p, k))
                .reduce(EcPoint::identity, |a, b| self.add(&a, &b))
        }
        #[cfg(not(feature = "parallel"))]
        {
            points
                .iter()
                .zip(scalars)
                .fold(EcPoint::identity(), |acc, (p, k)| self.add(&acc, &self.mul(p, k)))
        }
    }

    /// (a·X² + Y²)·Z² = Z⁴ + d·X²·Y², Z ≠ 0
    pub fn is_on_curve(&self, p: &EcPoint) -> bool {
        if p.z.is_zero() {
            return false;
        }
        let x2 = p.x.square();
        let y2 = p.y.square();
        let z2 = p.z.square();
        (self.a * x2 + y2) * z2 == z2.square() + self.d * x2 * y2
    }

    /// l·P = O, where l is the order of the scalar field
    pub fn is_in_prime_subgroup(&self, p: &EcPoint) -> bool {
        self.is_on_curve(p) && self.ladder(p, Fr::MODULUS.to_bits_be()).is_identity()
    }

    /// subgroup membership for a batch of untrusted points
    pub fn all_in_prime_subgroup(&self, points: &[EcPoint]) -> bool {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            points.par_iter().all(|p| self.is_in_prime_subgroup(p))
        }
        #[cfg(not(feature = "parallel"))]
        {
            points.iter().all(|p| self.is_in_prime_subgroup(p))
        }
    }

    /// reject points off the curve with a named error
    pub fn check_on_curve(&self, p: &EcPoint) -> Result<(), ArithmeticError> {
        if self.is_on_curve(p) {
            Ok(())
        } else {
            Err(ArithmeticError::NotOnCurve)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::random_scalar;
    use rand::rngs::OsRng;

    const P: CurveParams = BANDERSNATCH;

    #[test]
    fn test_generator_on_curve_and_in_subgroup() {
        assert!(P.is_on_curve(&P.generator));
        assert!(P.is_in_prime_subgroup(&P.generator));
        assert!(P.is_on_curve(&EcPoint::identity()));
    }

    #[test]
    fn test_order_annihilates_generator() {
        // l ≡ 0 in Fr, so go through the raw modulus bits
        let lg = P.ladder(&P.generator, Fr::MODULUS.to_bits_be());
        assert!(lg.is_identity());
        assert_eq!(lg, EcPoint::identity());
    }

    #[test]
    fn test_known_double() {
        let two_g = P.double(&P.generator).to_affine().unwrap();
        assert_eq!(
            two_g.x,
            MontFp!("21829743261194590194992413705867576097158323059182896808782966767024601242412")
        );
        assert_eq!(
            two_g.y,
            MontFp!("19075870567762384361343718229920461045746972450262741916171739040424605531019")
        );
        assert_eq!(P.mul_u64(&P.generator, 2), P.double(&P.generator));
    }

    #[test]
    fn test_identity_and_negation() {
        let g = P.generator;
        assert_eq!(P.add(&g, &EcPoint::identity()), g);
        assert!(P.sub(&g, &g).is_identity());
        assert!(P.add(&g, &-g).is_identity());
    }

    #[test]
    fn test_group_laws() {
        let mut rng = OsRng;
        let a = random_scalar(&mut rng);
        let b = random_scalar(&mut rng);
        let pa = P.mul_generator(&a);
        let pb = P.mul_generator(&b);

        assert_eq!(P.add(&pa, &pb), P.add(&pb, &pa));
        assert_eq!(P.add(&pa, &pb), P.mul_generator(&(a + b)));
        assert_eq!(P.mul(&pa, &b), P.mul(&pb, &a));
        assert_eq!(
            P.add(&P.add(&pa, &pb), &g()),
            P.add(&pa, &P.add(&pb, &g()))
        );
        assert!(P.is_on_curve(&P.add(&pa, &pb)));
    }

    fn g() -> EcPoint {
        P.generator
    }

    #[test]
    fn test_small_multiples_agree() {
        for k in [0u64, 1, 3, 52, 1 << 20] {
            assert_eq!(P.mul_u64(&g(), k), P.mul_generator(&Fr::from(k)));
        }
    }

    #[test]
    fn test_msm_matches_naive() {
        let mut rng = OsRng;
        let points: Vec<EcPoint> = (1..=4).map(|i| P.mul_u64(&g(), i)).collect();
        let scalars: Vec<Fr> = (0..4).map(|_| random_scalar(&mut rng)).collect();
        let naive = points
            .iter()
            .zip(&scalars)
            .fold(EcPoint::identity(), |acc, (p, k)| P.add(&acc, &P.mul(p, k)));
        assert_eq!(P.msm(&points, &scalars), naive);
    }

    #[test]
    fn test_projective_equality_and_affine() {
        let g3 = P.mul_u64(&g(), 3);
        let scaled = EcPoint::new(g3.x * Fq::from(7u64), g3.y * Fq::from(7u64), g3.z * Fq::from(7u64));
        assert_eq!(g3, scaled);
        assert_eq!(g3.to_affine().unwrap(), scaled.to_affine().unwrap());

        let broken = EcPoint::new(Fq::from(1u64), Fq::from(1u64), Fq::zero());
        assert_eq!(broken.to_affine(), Err(ArithmeticError::PointAtInfinity));
        assert!(!P.is_on_curve(&broken));
    }

    #[test]
    fn test_off_curve_rejected() {
        let bogus = EcPoint::new(Fq::from(2u64), Fq::from(3u64), Fq::from(1u64));
        assert_eq!(P.check_on_curve(&bogus), Err(ArithmeticError::NotOnCurve));
    }
}
