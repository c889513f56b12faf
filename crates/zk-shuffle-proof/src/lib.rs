//! zk-shuffle-proof: verifiable shuffles and decryption for mental poker
//!
//! cards are bandersnatch points encrypted under the sum of every player's
//! key. each player permutes and re-encrypts the deck in turn and publishes
//! a terelius-wikström proof of shuffle; a card opens only when every key
//! holder contributes a chaum-pedersen-proven decryption share.
//!
//! no trusted setup, DDH-based security

pub mod batch_chaum_pedersen;
pub mod chain;
pub mod compress;
pub mod curve;
pub mod decrypt;
pub mod elgamal;
pub mod encoding;
pub mod error;
pub mod field;
pub mod generators;
pub mod keys;
pub mod permutation;
pub mod shuffle;
pub mod transcript;
pub mod wire;


pub use chain::{verify_chain, ShuffleChain, ShuffleStep};
pub use compress::{compress, compress_deck, decompress, decompress_deck, CompressedDeck, CompressedPoint};
pub use curve::{CurveParams, EcPoint, BANDERSNATCH};
pub use decrypt::{cp_prove, cp_verify, generate_decrypt_proof, CardReveal, ChaumPedersenProof, DecryptionShare};
pub use elgamal::{decrypt as elgamal_decrypt, encrypt as elgamal_encrypt, encrypt_deck, CipherCard, Deck};
pub use encoding::{init_deck, Card, CardTable, Rank, Suit, DECK_SIZE};
pub use error::{ArithmeticError, Result, ShuffleError};
pub use field::{FieldElement, Scalar};
pub use keys::{AggregatePublicKey, KeyPair, KeyRegistry, PlayerId};
pub use permutation::{Permutation, ShuffleSecrets};
pub use shuffle::{shuffle_encrypt, verify_shuffle_proof, ShuffleProof};
pub use transcript::ShuffleTranscript;

/// configuration for shuffle proofs
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShuffleConfig {
    /// number of cards
    pub deck_size: usize,
}

impl ShuffleConfig {
    /// config for standard 52-card deck
    pub fn standard_deck() -> Self {
        Self {
            deck_size: DECK_SIZE,
        }
    }

    /// config for custom deck size
    pub fn custom(deck_size: usize) -> Self {
        Self { deck_size }
    }
}

impl Default for ShuffleConfig {
    fn default() -> Self {
        Self::standard_deck()
    }
}

/// f(0), .., f(n-1); per-card work is independent
pub(crate) fn map_indexed<U, F>(n: usize, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(usize) -> U + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        (0..n).into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..n).map(f).collect()
    }
}
