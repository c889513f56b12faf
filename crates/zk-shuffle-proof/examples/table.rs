//! three-player table demo
//!
//! demonstrates full mental poker flow:
//! 1. key registration with ownership proofs
//! 2. initial deck encryption under the aggregate key
//! 3. shuffle + prove (each player), verified as a chain
//! 4. card reveal with chaum-pedersen decryption shares
//!
//! run with `RUST_LOG=debug` to see proof sizes and rejections.

use std::time::Instant;

use rand::rngs::OsRng;
use tracing_subscriber::EnvFilter;
use zk_shuffle_proof::{
    compress_deck, encrypt_deck, generate_decrypt_proof, init_deck, Card, CardReveal, CardTable,
    KeyPair, KeyRegistry, PlayerId, Result, ShuffleChain, ShuffleConfig, ShuffleProof,
    ShuffleSecrets, ShuffleTranscript, BANDERSNATCH, DECK_SIZE,
};

const NUM_PLAYERS: PlayerId = 3;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let params = BANDERSNATCH;
    let mut rng = OsRng;
    let game_id = b"demo-table";

    println!("=== zk-shuffle-proof table demo ===\n");

    println!("phase 1: key registration");
    let mut registry = KeyRegistry::new(params, game_id);
    let mut keys = Vec::with_capacity(NUM_PLAYERS as usize);
    for player in 0..NUM_PLAYERS {
        let kp = KeyPair::generate(&params, &mut rng);
        let proof = kp.prove_ownership(&params, player, registry.context(), &mut rng);
        registry.register(player, *kp.public(), &proof)?;
        println!("  player {}: pk = {}...", player, &zk_shuffle_proof::wire::point_to_hex(kp.public())[..16]);
        keys.push(kp);
    }
    let aggregate = registry.close()?;
    println!("  aggregate pk: {}...\n", &zk_shuffle_proof::wire::point_to_hex(aggregate.point())[..16]);

    println!("phase 2: initial deck encryption");
    let (initial, _) = encrypt_deck(&params, &init_deck(&params), aggregate.point(), &mut rng);
    println!("  encrypted {} cards with aggregate pk\n", initial.len());

    println!("phase 3: shuffle phase");
    let mut chain = ShuffleChain::new(
        params,
        ShuffleConfig::standard_deck(),
        aggregate.clone(),
        ShuffleTranscript::new(game_id, 1),
        (0..NUM_PLAYERS).collect(),
        initial,
    )?;
    for player in 0..NUM_PLAYERS {
        let start = Instant::now();
        let secrets = ShuffleSecrets::random(&mut rng, DECK_SIZE);
        let (deck, proof) = chain.prove_next(player, &secrets, &mut rng)?;
        let proved = start.elapsed();

        let start = Instant::now();
        chain.apply(player, deck, proof)?;
        println!(
            "  player {} shuffled in {:?}, verified in {:?} ({} byte proof)",
            player,
            proved,
            start.elapsed(),
            ShuffleProof::byte_len(DECK_SIZE)
        );
    }
    let (deck, mut transcript) = chain.finalize()?;
    let compressed = compress_deck(&params, &deck)?;
    println!(
        "  final deck: {} bytes, {} compressed\n",
        deck.to_bytes().len(),
        compressed.to_bytes().len()
    );

    println!("phase 4: deal cards");
    let table = CardTable::new(&params)?;
    let mut open = |position: usize| -> Result<Card> {
        let mut reveal = CardReveal::new(params, &aggregate, deck[position]);
        let shares = keys
            .iter()
            .enumerate()
            .map(|(id, kp)| generate_decrypt_proof(&params, kp, id as PlayerId, &deck[position], &mut rng))
            .collect::<Result<Vec<_>>>()?;
        reveal.add_shares(&shares)?;
        reveal.bind(&mut transcript, position);
        reveal.open(&table)
    };

    // hole cards are opened publicly here; a real client would withhold its own share
    let mut position = 0;
    for player in 0..NUM_PLAYERS {
        let hole = [open(position)?, open(position + 1)?];
        position += 2;
        println!("  player {}: {} {}", player, hole[0], hole[1]);
    }
    let board = (position..position + 5).map(&mut open).collect::<Result<Vec<_>>>()?;
    let board: Vec<String> = board.iter().map(Card::to_string).collect();
    println!("  board: {}", board.join(" "));

    Ok(())
}
