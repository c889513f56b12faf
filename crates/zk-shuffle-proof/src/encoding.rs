//! card and deck encoding
//!
//! card i (suit-major: hearts, diamonds, clubs, spades; ranks 2..=ace) is
//! the point (i+1)·G. every participant derives the same table from the
//! curve parameters, so the reference deck needs no distribution.

use std::collections::HashMap;

use crate::compress::compress;
use crate::curve::{CurveParams, EcPoint};
use crate::elgamal::{CipherCard, Deck};
use crate::error::{Result, ShuffleError};
use crate::field::Fq;

pub const DECK_SIZE: usize = 52;

// ============================================================================
// card representation
// ============================================================================

/// card rank (2-14, where 14 = ace)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Rank {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    pub fn from_value(v: u8) -> Option<Self> {
        Self::ALL.get(v.checked_sub(2)? as usize).copied()
    }

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn char(self) -> char {
        match self {
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
            r => char::from(b'0' + r.value()),
        }
    }
}

/// card suit, in table order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Suit {
    Hearts = 0,
    Diamonds = 1,
    Clubs = 2,
    Spades = 3,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

    pub fn from_value(v: u8) -> Option<Self> {
        Self::ALL.get(v as usize).copied()
    }

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn char(self) -> char {
        match self {
            Suit::Hearts => '♥',
            Suit::Diamonds => '♦',
            Suit::Clubs => '♣',
            Suit::Spades => '♠',
        }
    }
}

/// a playing card
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// index 0-51, suit-major
    pub fn from_index(index: u8) -> Option<Self> {
        if index as usize >= DECK_SIZE {
            return None;
        }
        let suit = Suit::from_value(index / 13)?;
        let rank = Rank::from_value(index % 13 + 2)?;
        Some(Self { rank, suit })
    }

    pub fn to_index(self) -> u8 {
        self.suit.value() * 13 + (self.rank.value() - 2)
    }

    /// all 52 cards in table order
    pub fn standard_deck() -> Vec<Card> {
        Suit::ALL
            .iter()
            .flat_map(|&suit| Rank::ALL.iter().map(move |&rank| Card::new(rank, suit)))
            .collect()
    }
}

impl core::fmt::Display for Card {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}", self.rank.char(), self.suit.char())
    }
}

// ============================================================================
// card points
// ============================================================================

/// (i+1)·G for i in 0..52
pub fn card_points(params: &CurveParams) -> Vec<EcPoint> {
    let mut points = Vec::with_capacity(DECK_SIZE);
    let mut acc = params.generator;
    for _ in 0..DECK_SIZE {
        points.push(acc);
        acc = params.add(&acc, &params.generator);
    }
    points
}

/// canonical reference deck as trivial ciphertexts (identity, card point)
pub fn init_deck(params: &CurveParams) -> Deck {
    Deck::new(card_points(params).into_iter().map(CipherCard::trivial).collect())
}

/// position of a plaintext point in a point list (projective comparison)
pub fn search_deck(points: &[EcPoint], target: &EcPoint) -> Option<usize> {
    points.iter().position(|p| p == target)
}

/// public point <-> card lookup
#[derive(Clone, Debug)]
pub struct CardTable {
    points: Vec<EcPoint>,
    by_point: HashMap<[u8; 32], u8>,
}

impl CardTable {
    /// build the table, rejecting any encoding that maps two cards to one point
    pub fn new(params: &CurveParams) -> Result<Self> {
        Self::from_points(params, card_points(params))
    }

    pub fn from_points(params: &CurveParams, points: Vec<EcPoint>) -> Result<Self> {
        if points.len() != DECK_SIZE {
            return Err(ShuffleError::InvalidConfig(format!(
                "card table needs {} points, got {}",
                DECK_SIZE,
                points.len()
            )));
        }
        let mut by_point = HashMap::with_capacity(DECK_SIZE);
        for (i, p) in points.iter().enumerate() {
            let key = compress(params, p)?.to_bytes();
            if by_point.insert(key, i as u8).is_some() {
                return Err(ShuffleError::InvalidConfig(format!(
                    "card {} shares its point with another card",
                    i
                )));
            }
        }
        Ok(Self { points, by_point })
    }

    pub fn lookup(&self, params: &CurveParams, p: &EcPoint) -> Option<Card> {
        let key = compress(params, p).ok()?.to_bytes();
        self.by_point.get(&key).and_then(|&i| Card::from_index(i))
    }

    pub fn point(&self, card: Card) -> EcPoint {
        self.points[card.to_index() as usize]
    }

    pub fn points(&self) -> &[EcPoint] {
        &self.points
    }
}

// ============================================================================
// column form
// ============================================================================

/// six parallel coordinate arrays (c0.X, c0.Y, c0.Z, c1.X, c1.Y, c1.Z)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeckColumns {
    pub c0x: Vec<Fq>,
    pub c0y: Vec<Fq>,
    pub c0z: Vec<Fq>,
    pub c1x: Vec<Fq>,
    pub c1y: Vec<Fq>,
    pub c1z: Vec<Fq>,
}

impl DeckColumns {
    pub fn from_deck(deck: &Deck) -> Self {
        let mut cols = Self::default();
        for card in deck {
            cols.c0x.push(card.c0.x);
            cols.c0y.push(card.c0.y);
            cols.c0z.push(card.c0.z);
            cols.c1x.push(card.c1.x);
            cols.c1y.push(card.c1.y);
            cols.c1z.push(card.c1.z);
        }
        cols
    }

    pub fn to_deck(&self, params: &CurveParams) -> Result<Deck> {
        let n = self.c0x.len();
        for col in [&self.c0y, &self.c0z, &self.c1x, &self.c1y, &self.c1z] {
            if col.len() != n {
                return Err(ShuffleError::DeckSizeMismatch {
                    expected: n,
                    got: col.len(),
                });
            }
        }
        let cards = (0..n)
            .map(|i| {
                let c0 = EcPoint::new(self.c0x[i], self.c0y[i], self.c0z[i]);
                let c1 = EcPoint::new(self.c1x[i], self.c1y[i], self.c1z[i]);
                params.check_on_curve(&c0)?;
                params.check_on_curve(&c1)?;
                Ok(CipherCard::new(c0, c1))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Deck::new(cards))
    }
}
