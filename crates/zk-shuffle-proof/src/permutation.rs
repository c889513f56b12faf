//! secret permutations and shuffle witnesses
//!
//! index form: output[i] = input[perm[i]]. matrix form: row-major n×n with
//! m[i][perm[i]] = 1, the shape a circuit consumes. both are wiped on drop.

use rand_core::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, ShuffleError};
use crate::field::{random_scalar, Fr};

/// a permutation of indices 0..n
#[derive(Clone, Debug, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Permutation {
    mapping: Vec<usize>,
}

/// uniform index in 0..=bound by rejection sampling
fn uniform_index<R: RngCore + CryptoRng>(rng: &mut R, bound: usize) -> usize {
    let range = bound as u64 + 1;
    let zone = u64::MAX - (u64::MAX % range);
    loop {
        let v = rng.next_u64();
        if v < zone {
            return (v % range) as usize;
        }
    }
}

impl Permutation {
    /// validate a mapping as a bijection on 0..n
    pub fn new(mapping: Vec<usize>) -> Result<Self> {
        let n = mapping.len();
        let mut seen = vec![false; n];

        for &idx in &mapping {
            if idx >= n || seen[idx] {
                return Err(ShuffleError::InvalidPermutation);
            }
            seen[idx] = true;
        }

        Ok(Self { mapping })
    }

    pub fn identity(n: usize) -> Self {
        Self {
            mapping: (0..n).collect(),
        }
    }

    /// uniform over all n! permutations (fisher-yates on a secure rng)
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R, n: usize) -> Self {
        let mut mapping: Vec<usize> = (0..n).collect();
        for i in (1..n).rev() {
            let j = uniform_index(rng, i);
            mapping.swap(i, j);
        }
        Self { mapping }
    }

    /// output[i] = input[perm[i]]
    pub fn apply<T: Clone>(&self, input: &[T]) -> Result<Vec<T>> {
        if input.len() != self.mapping.len() {
            return Err(ShuffleError::DeckSizeMismatch {
                expected: self.mapping.len(),
                got: input.len(),
            });
        }
        Ok(self.mapping.iter().map(|&i| input[i].clone()).collect())
    }

    pub fn inverse(&self) -> Self {
        let mut inv = vec![0; self.mapping.len()];
        for (i, &j) in self.mapping.iter().enumerate() {
            inv[j] = i;
        }
        Self { mapping: inv }
    }

    /// apply `self` first, then `next`
    pub fn then(&self, next: &Permutation) -> Result<Self> {
        Ok(Self {
            mapping: next.apply(&self.mapping)?,
        })
    }

    pub fn get(&self, i: usize) -> usize {
        self.mapping[i]
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    pub fn mapping(&self) -> &[usize] {
        &self.mapping
    }

    /// row-major 0/1 matrix with m[i·n + perm[i]] = 1
    pub fn to_matrix(&self) -> Vec<u8> {
        let n = self.mapping.len();
        let mut matrix = vec![0u8; n * n];
        for (i, &j) in self.mapping.iter().enumerate() {
            matrix[i * n + j] = 1;
        }
        matrix
    }

    /// parse a permutation matrix, rejecting anything that is not one
    pub fn from_matrix(matrix: &[u8], n: usize) -> Result<Self> {
        if matrix.len() != n * n {
            return Err(ShuffleError::DeckSizeMismatch {
                expected: n * n,
                got: matrix.len(),
            });
        }
        let mut mapping = Vec::with_capacity(n);
        for row in matrix.chunks_exact(n.max(1)).take(n) {
            if row.iter().any(|&v| v > 1) || row.iter().filter(|&&v| v == 1).count() != 1 {
                return Err(ShuffleError::InvalidPermutation);
            }
            mapping.push(row.iter().position(|&v| v == 1).ok_or(ShuffleError::InvalidPermutation)?);
        }
        Self::new(mapping)
    }
}

/// everything a shuffler must keep secret for one round
///
/// consumed by a single shuffle; wiped on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ShuffleSecrets {
    pub permutation: Permutation,
    /// re-randomisation scalar for output position i
    pub randomness: Vec<Fr>,
}

impl ShuffleSecrets {
    pub fn new(permutation: Permutation, randomness: Vec<Fr>) -> Self {
        Self {
            permutation,
            randomness,
        }
    }

    /// fresh permutation and randomness for a deck of n cards
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R, n: usize) -> Self {
        let permutation = Permutation::random(rng, n);
        let randomness = (0..n).map(|_| random_scalar(rng)).collect();
        Self {
            permutation,
            randomness,
        }
    }

    pub fn len(&self) -> usize {
        self.permutation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permutation.is_empty()
    }
}
