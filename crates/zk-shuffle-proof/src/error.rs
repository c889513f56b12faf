//! error types for zk-shuffle-proof
//!
//! proof verification never produces an error; `verify_*` functions return bool

use thiserror::Error;

use crate::keys::PlayerId;

pub type Result<T> = std::result::Result<T, ShuffleError>;

/// field or group arithmetic failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("inverse of zero")]
    InverseOfZero,

    #[error("point at projective infinity (Z = 0)")]
    PointAtInfinity,

    #[error("point is not on the curve")]
    NotOnCurve,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShuffleError {
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),

    #[error("invalid point: {0}")]
    InvalidPoint(&'static str),

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("deck size mismatch: expected {expected}, got {got}")]
    DeckSizeMismatch { expected: usize, got: usize },

    #[error("invalid permutation: not a bijection")]
    InvalidPermutation,

    #[error("proof generation failed: {0}")]
    ProofGeneration(String),

    #[error("key registration is closed")]
    RegistrationClosed,

    #[error("key registration is still open")]
    RegistrationOpen,

    #[error("player {0} already registered")]
    DuplicatePlayer(PlayerId),

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("invalid key ownership proof from player {0}")]
    InvalidKeyProof(PlayerId),

    #[error("no keys registered")]
    NoKeys,

    #[error("shuffle by player {player} rejected")]
    ShuffleRejected { player: PlayerId },

    #[error("unexpected shuffler: expected {expected:?}, got {got}")]
    UnexpectedShuffler { expected: Option<PlayerId>, got: PlayerId },

    #[error("shuffle chain aborted after rejecting player {player}")]
    ChainAborted { player: PlayerId },

    #[error("players {players:?} hold keys but are not in the shuffle order")]
    MissingShufflers { players: Vec<PlayerId> },

    #[error("shuffle chain incomplete: {remaining} shuffles outstanding")]
    ChainIncomplete { remaining: usize },

    #[error("duplicate decryption share from player {0}")]
    DuplicateShare(PlayerId),

    #[error("invalid decryption share from player {player}")]
    InvalidDecryptionShare { player: PlayerId },

    #[error("missing decryption shares from players {players:?}")]
    MissingShares { players: Vec<PlayerId> },

    #[error("decrypted point is not a card")]
    UnknownCard,
}
