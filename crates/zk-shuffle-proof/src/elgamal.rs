//! elgamal over bandersnatch
//!
//! encrypt(m, pk; r) = (r·G, m + r·pk); re-randomisation adds an encryption
//! of the identity so the plaintext survives while the ciphertext becomes
//! unlinkable to its previous form.

use core::ops::Index;

use rand_core::{CryptoRng, RngCore};

use crate::curve::{CurveParams, EcPoint};
use crate::error::{Result, ShuffleError};
use crate::field::{random_scalar, Fr};
use crate::transcript::Blake2Transcript;
use crate::wire::{self, ByteReader, POINT_BYTES};

pub const CIPHER_CARD_BYTES: usize = 2 * POINT_BYTES;

/// elgamal ciphertext (c0, c1)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CipherCard {
    /// c0 = r·G
    pub c0: EcPoint,
    /// c1 = m + r·pk
    pub c1: EcPoint,
}

impl CipherCard {
    pub fn new(c0: EcPoint, c1: EcPoint) -> Self {
        Self { c0, c1 }
    }

    /// encryption with zero randomness (identity, m)
    pub fn trivial(m: EcPoint) -> Self {
        Self {
            c0: EcPoint::identity(),
            c1: m,
        }
    }

    /// (c0 + r·G, c1 + r·pk)
    pub fn rerandomize(&self, params: &CurveParams, pk: &EcPoint, r: &Fr) -> Self {
        Self {
            c0: params.add(&self.c0, &params.mul_generator(r)),
            c1: params.add(&self.c1, &params.mul(pk, r)),
        }
    }

    /// componentwise sum, an encryption of the plaintext sum
    pub fn add(&self, params: &CurveParams, other: &Self) -> Self {
        Self {
            c0: params.add(&self.c0, &other.c0),
            c1: params.add(&self.c1, &other.c1),
        }
    }

    pub fn sub(&self, params: &CurveParams, other: &Self) -> Self {
        Self {
            c0: params.sub(&self.c0, &other.c0),
            c1: params.sub(&self.c1, &other.c1),
        }
    }

    pub fn to_bytes(&self) -> [u8; CIPHER_CARD_BYTES] {
        let mut bytes = [0u8; CIPHER_CARD_BYTES];
        bytes[..POINT_BYTES].copy_from_slice(&wire::point_to_bytes(&self.c0));
        bytes[POINT_BYTES..].copy_from_slice(&wire::point_to_bytes(&self.c1));
        bytes
    }

    pub fn from_bytes(params: &CurveParams, bytes: &[u8; CIPHER_CARD_BYTES]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let card = Self::read(params, &mut reader)?;
        reader.finish()?;
        Ok(card)
    }

    pub(crate) fn read(params: &CurveParams, reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            c0: reader.read_point(params)?,
            c1: reader.read_point(params)?,
        })
    }
}

/// (r·G, m + r·pk)
pub fn encrypt(params: &CurveParams, m: &EcPoint, pk: &EcPoint, r: &Fr) -> CipherCard {
    CipherCard::trivial(*m).rerandomize(params, pk, r)
}

/// c1 - sk·c0, for a ciphertext under a single key
pub fn decrypt(params: &CurveParams, card: &CipherCard, sk: &Fr) -> EcPoint {
    params.sub(&card.c1, &params.mul(&card.c0, sk))
}

/// ordered sequence of ciphertexts
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<CipherCard>,
}

impl Deck {
    pub fn new(cards: Vec<CipherCard>) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[CipherCard] {
        &self.cards
    }

    pub fn get(&self, i: usize) -> Option<&CipherCard> {
        self.cards.get(i)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, CipherCard> {
        self.cards.iter()
    }

    pub fn into_cards(self) -> Vec<CipherCard> {
        self.cards
    }

    /// every c0 and c1, for batch subgroup checks
    pub fn points(&self) -> Vec<EcPoint> {
        self.cards.iter().flat_map(|c| [c.c0, c.c1]).collect()
    }

    /// blake2 commitment binding a published deck into the game transcript
    pub fn commitment(&self) -> [u8; 32] {
        let mut t = Blake2Transcript::new(b"zk-shuffle-proof.deck");
        t.append_u64(b"n", self.cards.len() as u64);
        for card in &self.cards {
            t.append_point(b"c0", &card.c0);
            t.append_point(b"c1", &card.c1);
        }
        let mut bytes = [0u8; 32];
        t.challenge_bytes(b"commit", &mut bytes);
        bytes
    }

    /// n (u32) || cards
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(4 + self.cards.len() * CIPHER_CARD_BYTES);
        bytes.extend_from_slice(&(self.cards.len() as u32).to_le_bytes());
        for card in &self.cards {
            bytes.extend_from_slice(&card.to_bytes());
        }
        bytes
    }

    pub fn from_bytes(params: &CurveParams, bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let n = reader.read_len(CIPHER_CARD_BYTES)?;
        let cards = (0..n)
            .map(|_| CipherCard::read(params, &mut reader))
            .collect::<Result<Vec<_>>>()?;
        reader.finish()?;
        Ok(Self { cards })
    }
}

impl Index<usize> for Deck {
    type Output = CipherCard;

    fn index(&self, i: usize) -> &CipherCard {
        &self.cards[i]
    }
}

impl From<Vec<CipherCard>> for Deck {
    fn from(cards: Vec<CipherCard>) -> Self {
        Self { cards }
    }
}

impl<'a> IntoIterator for &'a Deck {
    type Item = &'a CipherCard;
    type IntoIter = core::slice::Iter<'a, CipherCard>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}

/// re-randomise every card with the given scalars (one per card)
pub fn rerandomize_deck(
    params: &CurveParams,
    deck: &Deck,
    pk: &EcPoint,
    randomness: &[Fr],
) -> Result<Deck> {
    if randomness.len() != deck.len() {
        return Err(ShuffleError::DeckSizeMismatch {
            expected: deck.len(),
            got: randomness.len(),
        });
    }

    #[cfg(feature = "parallel")]
    let cards = {
        use rayon::prelude::*;
        deck.cards
            .par_iter()
            .zip(randomness.par_iter())
            .map(|(card, r)| card.rerandomize(params, pk, r))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let cards = deck
        .cards
        .iter()
        .zip(randomness)
        .map(|(card, r)| card.rerandomize(params, pk, r))
        .collect();

    Ok(Deck { cards })
}

/// encrypt every card with fresh independent randomness
///
/// applied to [`crate::encoding::init_deck`] this is the initial table
/// encryption (r·G, m + r·pk). randomness is drawn sequentially so the
/// result does not depend on the `parallel` feature.
pub fn encrypt_deck<R: RngCore + CryptoRng>(
    params: &CurveParams,
    deck: &Deck,
    pk: &EcPoint,
    rng: &mut R,
) -> (Deck, Vec<Fr>) {
    let randomness: Vec<Fr> = (0..deck.len()).map(|_| random_scalar(rng)).collect();
    let cards = deck
        .cards
        .iter()
        .zip(&randomness)
        .map(|(card, r)| card.rerandomize(params, pk, r))
        .collect();
    (Deck { cards }, randomness)
}
